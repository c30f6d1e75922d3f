//! Envelope normalization.
//!
//! The platform hands the bridge a request in one of two shapes. Each shape
//! has its own adapter; [`normalize`] dispatches once on the variant and
//! every later stage only sees [`NormalizedRequest`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::headers::Headers;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("request body is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("event is not a JSON object")]
    NotAnObject,

    #[error("event is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Inbound request as delivered by the hosting platform.
#[derive(Debug)]
pub enum Envelope {
    /// An attribute-bearing request object.
    Request(http::Request<Bytes>),
    /// A key/value event: `method`, `path`, `headers`, `query`, `body`,
    /// `encoding` (`"base64"`) or `isBase64Encoded`.
    Event(Value),
}

impl Envelope {
    /// Parse a raw JSON event.
    pub fn from_event_json(raw: &[u8]) -> Result<Self, NormalizeError> {
        Ok(Envelope::Event(serde_json::from_slice(raw)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Identity,
    Base64,
}

/// Query parameters in first-seen order; a repeated key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a raw `k=v&k2=v2` string. Values are kept verbatim.
    pub fn parse(raw: &str) -> Self {
        let mut params = QueryParams::new();
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if !key.is_empty() {
                params.insert(key, value);
            }
        }
        params
    }
}

/// The shape-independent view of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub method: String,
    pub path: String,
    pub headers: Headers,
    pub query: QueryParams,
    pub body: Bytes,
}

pub fn normalize(envelope: Envelope) -> Result<NormalizedRequest, NormalizeError> {
    match envelope {
        Envelope::Request(request) => Ok(from_request(request)),
        Envelope::Event(event) => match event {
            Value::Object(map) => from_event(map),
            Value::Null => from_event(Map::new()),
            _ => Err(NormalizeError::NotAnObject),
        },
    }
}

fn from_request(request: http::Request<Bytes>) -> NormalizedRequest {
    let (parts, body) = request.into_parts();

    let path = match parts.uri.path() {
        "" => "/".to_string(),
        path => path.to_string(),
    };
    let query = parts.uri.query().map(QueryParams::parse).unwrap_or_default();
    let headers = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Bytes::copy_from_slice(value.as_bytes()),
            )
        })
        .collect();

    NormalizedRequest {
        method: parts.method.as_str().to_string(),
        path,
        headers,
        query,
        body,
    }
}

fn from_event(mut event: Map<String, Value>) -> Result<NormalizedRequest, NormalizeError> {
    let method = string_field(&event, "method").unwrap_or_else(|| "GET".to_string());
    let raw_path = string_field(&event, "path").unwrap_or_else(|| "/".to_string());

    let mut headers = Headers::new();
    if let Some(Value::Object(map)) = event.get("headers") {
        for (name, value) in map {
            if let Some(value) = scalar_text(value) {
                headers.insert(name.as_str(), value);
            }
        }
    }

    let mut query = QueryParams::new();
    if let Some(Value::Object(map)) = event.get("query") {
        for (key, value) in map {
            if let Some(value) = scalar_text(value) {
                query.insert(key.as_str(), value);
            }
        }
    }

    // A query embedded in the path fills in keys the explicit map lacks.
    let path = match raw_path.split_once('?') {
        Some((path, embedded)) => {
            for (key, value) in QueryParams::parse(embedded).iter() {
                if !query.contains(key) {
                    query.insert(key, value);
                }
            }
            if path.is_empty() { "/".to_string() } else { path.to_string() }
        }
        None => raw_path,
    };

    let encoding = event_encoding(&event);
    let body = match event.remove("body") {
        None | Some(Value::Null) => Bytes::new(),
        Some(Value::String(text)) => match encoding {
            BodyEncoding::Base64 => Bytes::from(STANDARD.decode(text.as_bytes())?),
            BodyEncoding::Identity => Bytes::from(text),
        },
        // Some platforms hand over an already-parsed JSON body.
        Some(other) => Bytes::from(other.to_string()),
    };

    Ok(NormalizedRequest {
        method,
        path,
        headers,
        query,
        body,
    })
}

fn event_encoding(event: &Map<String, Value>) -> BodyEncoding {
    let declared = event
        .get("encoding")
        .and_then(Value::as_str)
        .is_some_and(|e| e.eq_ignore_ascii_case("base64"));
    let flagged = event
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if declared || flagged {
        BodyEncoding::Base64
    } else {
        BodyEncoding::Identity
    }
}

fn string_field(event: &Map<String, Value>, key: &str) -> Option<String> {
    event
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Text of a header or query value. Arrays contribute their last element.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items.iter().rev().find_map(scalar_text),
        Value::Null | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> NormalizedRequest {
        normalize(Envelope::Event(value)).unwrap()
    }

    #[test]
    fn empty_event_uses_defaults() {
        let req = event(json!({}));
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/");
        assert!(req.headers.is_empty());
        assert!(req.query.is_empty());
        assert!(req.body.is_empty());
    }

    #[test]
    fn null_event_uses_defaults() {
        let req = event(Value::Null);
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/");
    }

    #[test]
    fn non_object_event_is_rejected() {
        let err = normalize(Envelope::Event(json!([1, 2]))).unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnObject));
    }

    #[test]
    fn event_fields_are_extracted() {
        let req = event(json!({
            "method": "POST",
            "path": "/api/expenses",
            "headers": {"Content-Type": "application/json", "X-Retry": 2},
            "query": {"user_id": "42"},
            "body": "{\"amount\": 3}"
        }));
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/api/expenses");
        assert_eq!(req.headers.get_str("content-type"), Some("application/json"));
        assert_eq!(req.headers.get_str("x-retry"), Some("2"));
        assert_eq!(req.query.get("user_id"), Some("42"));
        assert_eq!(req.body, Bytes::from("{\"amount\": 3}"));
    }

    #[test]
    fn base64_body_is_decoded() {
        let req = event(json!({"body": "aGVsbG8gd29ybGQ=", "encoding": "base64"}));
        assert_eq!(req.body, Bytes::from("hello world"));

        let req = event(json!({"body": "aGk=", "isBase64Encoded": true}));
        assert_eq!(req.body, Bytes::from("hi"));
    }

    #[test]
    fn base64_round_trip() {
        let encoded = "eyJhbW91bnQiOjEyLjV9";
        let req = event(json!({"body": encoded, "encoding": "base64"}));
        assert_eq!(STANDARD.encode(&req.body), encoded);
    }

    #[test]
    fn malformed_base64_is_an_error() {
        let err = normalize(Envelope::Event(json!({"body": "not base64!", "encoding": "base64"})))
            .unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidBase64(_)));
    }

    #[test]
    fn identity_body_is_not_decoded() {
        let req = event(json!({"body": "aGk="}));
        assert_eq!(req.body, Bytes::from("aGk="));
    }

    #[test]
    fn json_body_is_serialized() {
        let req = event(json!({"body": {"amount": 1}}));
        assert_eq!(req.body, Bytes::from(r#"{"amount":1}"#));
    }

    #[test]
    fn array_query_takes_last_value() {
        let req = event(json!({"query": {"page": ["1", "2", "3"]}}));
        assert_eq!(req.query.get("page"), Some("3"));
    }

    #[test]
    fn path_query_is_merged_without_overriding() {
        let req = event(json!({
            "path": "/api/dashboard/monthly?month=3&year=2024",
            "query": {"month": "4"}
        }));
        assert_eq!(req.path, "/api/dashboard/monthly");
        assert_eq!(req.query.get("month"), Some("4"));
        assert_eq!(req.query.get("year"), Some("2024"));
    }

    #[test]
    fn request_object_is_normalized() {
        let request = http::Request::post("/api/expenses?user_id=1&user_id=2&flag")
            .header("Content-Type", "application/json")
            .header("Host", "api.example")
            .body(Bytes::from("{}"))
            .unwrap();

        let req = normalize(Envelope::Request(request)).unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/api/expenses");
        assert_eq!(req.query.get("user_id"), Some("2"));
        assert_eq!(req.query.get("flag"), Some(""));
        assert_eq!(req.headers.get_str("host"), Some("api.example"));
        assert_eq!(req.body, Bytes::from("{}"));
    }

    #[test]
    fn request_object_header_bytes_are_kept() {
        let label = http::HeaderValue::from_bytes(&[b'c', b'a', b'f', 0xe9]).unwrap();
        let request = http::Request::get("/")
            .header("x-label", label)
            .body(Bytes::new())
            .unwrap();

        let req = normalize(Envelope::Request(request)).unwrap();
        assert_eq!(req.headers.get("x-label"), Some(&[b'c', b'a', b'f', 0xe9][..]));
    }

    #[test]
    fn query_values_are_verbatim() {
        let params = QueryParams::parse("q=a%20b&&=skipped&name=x=y");
        assert_eq!(params.get("q"), Some("a%20b"));
        assert_eq!(params.get("name"), Some("x=y"));
        assert_eq!(params.iter().count(), 2);
    }

    #[test]
    fn from_event_json_rejects_garbage() {
        assert!(matches!(
            Envelope::from_event_json(b"{nope"),
            Err(NormalizeError::InvalidJson(_))
        ));
        assert!(Envelope::from_event_json(br#"{"path":"/"}"#).is_ok());
    }
}
