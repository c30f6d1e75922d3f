use bytes::Bytes;

/// Request scheme as seen by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// Invocation context for one request.
///
/// Built once per invocation and never mutated afterwards. Header names are
/// lower-case; both names and values are raw bytes in envelope order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub method: String,
    pub path: String,
    pub headers: Vec<(Bytes, Bytes)>,
    /// `&`-joined `k=v` pairs, values verbatim.
    pub query_string: Bytes,
    pub scheme: Scheme,
    /// `(host, port)` of the server the request was addressed to.
    pub server: (String, u16),
}

impl Scope {
    /// First value of header `name`. `name` must be lower-case.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(n, _)| n.as_ref() == name.as_bytes())
            .map(|(_, v)| v.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(query: &'static str) -> Scope {
        Scope {
            method: "GET".into(),
            path: "/api/expenses".into(),
            headers: vec![
                (Bytes::from_static(b"host"), Bytes::from_static(b"example.com")),
                (Bytes::from_static(b"accept"), Bytes::from_static(b"*/*")),
            ],
            query_string: Bytes::from_static(query.as_bytes()),
            scheme: Scheme::Http,
            server: ("example.com".into(), 80),
        }
    }

    #[test]
    fn header_lookup() {
        let scope = scope("");
        assert_eq!(scope.header("host"), Some(&b"example.com"[..]));
        assert_eq!(scope.header("x-missing"), None);
    }

    #[test]
    fn scheme_ports() {
        assert_eq!(Scheme::Http.default_port(), 80);
        assert_eq!(Scheme::Https.default_port(), 443);
        assert_eq!(Scheme::Https.as_str(), "https");
    }
}
