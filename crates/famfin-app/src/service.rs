//! Exposes an axum [`Router`] through the application calling convention.
//!
//! The request is rebuilt from the [`Scope`] and the buffered body, run
//! through the router with `oneshot`, and the response is sent back as a
//! start message followed by one body message per data frame.

use axum::Router;
use axum::body::Body;
use bytes::Bytes;
use famfin_async::{AppError, Application, BoxFuture, Inbound, Outbound, OutboundMessage, Scope};
use http::{HeaderName, HeaderValue};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tracing::debug;
use url::{Position, Url};

#[derive(Clone)]
pub struct RouterApp {
    router: Router,
}

impl RouterApp {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

impl Application for RouterApp {
    fn call(
        &self,
        scope: Scope,
        mut inbound: Inbound,
        outbound: Outbound,
    ) -> BoxFuture<'static, Result<(), AppError>> {
        let router = self.router.clone();
        Box::pin(async move {
            let body = inbound.body().await;
            let request = to_http_request(&scope, body)?;

            let response = match router.oneshot(request).await {
                Ok(response) => response,
                Err(infallible) => match infallible {},
            };
            let (parts, mut body) = response.into_parts();

            let headers = parts
                .headers
                .iter()
                .map(|(name, value)| {
                    (
                        Bytes::copy_from_slice(name.as_str().as_bytes()),
                        Bytes::copy_from_slice(value.as_bytes()),
                    )
                })
                .collect();
            outbound
                .send(OutboundMessage::start(parts.status.as_u16(), headers))
                .await?;

            while let Some(frame) = body.frame().await {
                let frame = frame.map_err(|e| AppError::new(format!("response body: {e}")))?;
                if let Ok(data) = frame.into_data() {
                    if !data.is_empty() {
                        outbound.send(OutboundMessage::chunk(data)).await?;
                    }
                }
            }
            outbound.send(OutboundMessage::body(Bytes::new())).await?;
            Ok::<(), AppError>(())
        })
    }
}

fn to_http_request(scope: &Scope, body: Bytes) -> Result<http::Request<Body>, AppError> {
    let mut builder = http::Request::builder()
        .method(scope.method.as_str())
        .uri(request_target(scope)?);
    for (name, value) in &scope.headers {
        match (
            HeaderName::from_bytes(name),
            HeaderValue::from_bytes(value),
        ) {
            (Ok(name), Ok(value)) => builder = builder.header(name, value),
            _ => debug!(
                header = %String::from_utf8_lossy(name),
                "dropping header not representable in HTTP"
            ),
        }
    }
    builder
        .body(Body::from(body))
        .map_err(|e| AppError::new(format!("invalid request: {e}")))
}

/// Path and query as a request target. The scope carries them verbatim;
/// bytes that are not legal in a URI are percent-encoded here.
fn request_target(scope: &Scope) -> Result<String, AppError> {
    let mut url = Url::parse("http://localhost/")
        .map_err(|e| AppError::new(format!("invalid request: {e}")))?;
    url.set_path(&scope.path);
    if !scope.query_string.is_empty() {
        url.set_query(Some(&String::from_utf8_lossy(&scope.query_string)));
    }
    Ok(url[Position::BeforePath..].to_string())
}
