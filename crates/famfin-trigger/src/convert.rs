//! Conversions between hyper's HTTP types and the bridge's envelope and
//! result types, used by the local HTTP trigger.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use famfin_core::InvocationResult;
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;

/// Convert a status code from u16.
pub fn status_from_u16(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Convert a result header map. Entries that are not valid HTTP are
/// dropped.
pub fn headers_from_map(map: &BTreeMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in map {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    headers
}

/// Buffer a streaming request body so the request can be handed to the
/// bridge as an envelope.
pub async fn buffer_request<B>(request: Request<B>) -> Result<Request<Bytes>, B::Error>
where
    B: Body,
{
    let (parts, body) = request.into_parts();
    let bytes = body.collect().await?.to_bytes();
    Ok(Request::from_parts(parts, bytes))
}

/// Convert an invocation result into an HTTP response. A base64 body is
/// decoded back to its raw bytes.
pub fn result_to_response(result: InvocationResult) -> Response<Full<Bytes>> {
    let InvocationResult {
        status_code,
        headers,
        body,
        is_base64_encoded,
    } = result;

    let body = match is_base64_encoded {
        true => STANDARD
            .decode(body.as_bytes())
            .map(Bytes::from)
            .unwrap_or_else(|_| Bytes::from(body)),
        false => Bytes::from(body),
    };

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status_from_u16(status_code);
    *response.headers_mut() = headers_from_map(&headers);
    response
}
