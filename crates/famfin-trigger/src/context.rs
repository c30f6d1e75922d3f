//! Invocation context construction.

use bytes::Bytes;
use famfin_async::{Scheme, Scope};

use crate::normalize::NormalizedRequest;

/// Header whose value `https` switches the scheme. No TLS is visible at
/// this boundary, so it is the only signal.
pub const FORWARDED_PROTO: &str = "x-forwarded-proto";

pub const DEFAULT_HOST: &str = "localhost";

/// Build the [`Scope`] for a normalized request. Pure and infallible.
pub fn build_scope(request: &NormalizedRequest) -> Scope {
    let headers = request
        .headers
        .iter()
        .map(|(name, value)| (Bytes::from(name.to_ascii_lowercase()), value.clone()))
        .collect();

    let query_string = request
        .query
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let scheme = match request.headers.get(FORWARDED_PROTO) {
        Some(b"https") => Scheme::Https,
        _ => Scheme::Http,
    };

    let host = request
        .headers
        .get_str("host")
        .unwrap_or(DEFAULT_HOST)
        .to_string();

    Scope {
        method: request.method.clone(),
        path: request.path.clone(),
        headers,
        query_string: Bytes::from(query_string),
        scheme,
        server: (host, scheme.default_port()),
    }
}
