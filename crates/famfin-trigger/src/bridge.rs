//! The invocation boundary.
//!
//! [`Bridge`] owns the application chosen at startup and turns one platform
//! envelope into one [`InvocationResult`]. Nothing escapes it: every failure
//! becomes an error envelope with the matching status.

use std::sync::Arc;

use famfin_app::LoadedApp;
use famfin_async::Application;
use famfin_core::{ErrorEnvelope, InvocationResult};
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::assemble::assemble;
use crate::context::build_scope;
use crate::invoke::{InvokeError, invoke};
use crate::normalize::{Envelope, NormalizeError, normalize};
use crate::scheduler::{SchedulerError, run_to_completion};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid envelope: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("no application registered as `{entry}`")]
    AppMissing {
        entry: String,
        available: Vec<String>,
    },

    #[error("invocation failed: {0}")]
    Invoke(#[from] InvokeError),

    #[error("{0}")]
    Scheduler(#[from] SchedulerError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    pub fn status_code(&self) -> u16 {
        match self {
            BridgeError::Normalize(_) => 400,
            BridgeError::AppMissing { .. }
            | BridgeError::Invoke(_)
            | BridgeError::Scheduler(_) => 500,
        }
    }

    /// The envelope returned to the platform. Invocation causes stay in the
    /// logs.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            BridgeError::Normalize(NormalizeError::InvalidBase64(_)) => {
                ErrorEnvelope::bad_request("Request body is not valid base64")
            }
            BridgeError::Normalize(NormalizeError::NotAnObject) => {
                ErrorEnvelope::bad_request("Event must be a JSON object")
            }
            BridgeError::Normalize(NormalizeError::InvalidJson(_)) => {
                ErrorEnvelope::bad_request("Event is not valid JSON")
            }
            BridgeError::AppMissing { entry, available } => {
                let hint = if available.is_empty() {
                    "no applications are registered".to_string()
                } else {
                    format!("set bridge.entry to one of: {}", available.join(", "))
                };
                ErrorEnvelope::new("Application not found")
                    .with_message(format!("no application registered as `{entry}`"))
                    .with_hint(hint)
            }
            BridgeError::Invoke(_) | BridgeError::Scheduler(_) => ErrorEnvelope::internal(),
        }
    }

    pub fn into_result(self) -> InvocationResult {
        self.to_envelope().into_result(self.status_code())
    }
}

/// Per-process bridge state. Built once, shared by every invocation.
pub struct Bridge {
    app: LoadedApp,
}

impl Bridge {
    pub fn new(app: LoadedApp) -> Self {
        match &app {
            LoadedApp::Ready { entry, .. } => info!(%entry, "bridge ready"),
            LoadedApp::Degraded { entry, reason, .. } => {
                warn!(%entry, %reason, "bridge serving stand-in application")
            }
            LoadedApp::Missing { entry, .. } => error!(%entry, "bridge has no application"),
        }
        Self { app }
    }

    /// Wrap an already constructed application.
    pub fn from_application(entry: impl Into<String>, app: Arc<dyn Application>) -> Self {
        Self::new(LoadedApp::Ready {
            entry: entry.into(),
            app,
        })
    }

    pub fn loaded(&self) -> &LoadedApp {
        &self.app
    }

    /// Handle one envelope. Never fails.
    pub async fn handle(&self, envelope: Envelope) -> InvocationResult {
        match self.try_handle(envelope).await {
            Ok(result) => result,
            Err(e) => report(e),
        }
    }

    /// Blocking entry for synchronous callers.
    pub fn handle_blocking(&self, envelope: Envelope) -> InvocationResult {
        match run_to_completion(self.handle(envelope)) {
            Ok(result) => result,
            Err(e) => report(e.into()),
        }
    }

    pub async fn try_handle(&self, envelope: Envelope) -> BridgeResult<InvocationResult> {
        let app = match &self.app {
            LoadedApp::Ready { app, .. } | LoadedApp::Degraded { app, .. } => Arc::clone(app),
            LoadedApp::Missing { entry, available } => {
                return Err(BridgeError::AppMissing {
                    entry: entry.clone(),
                    available: available.clone(),
                });
            }
        };

        let request = normalize(envelope)?;
        let span = info_span!("invocation", method = %request.method, path = %request.path);

        async move {
            let scope = build_scope(&request);
            debug!(scheme = scope.scheme.as_str(), host = %scope.server.0, "context built");

            let state = invoke(app.as_ref(), scope, request.body).await?;
            let result = assemble(state);
            info!(status = result.status_code, "invocation complete");
            Ok(result)
        }
        .instrument(span)
        .await
    }
}

fn report(e: BridgeError) -> InvocationResult {
    match &e {
        BridgeError::Normalize(cause) => warn!(error = %cause, "rejected envelope"),
        other => error!(error = %other, "invocation failed"),
    }
    e.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use famfin_async::{AppError, Inbound, Outbound, OutboundMessage, Scope};
    use serde_json::{Value, json};

    fn echo_bridge() -> Bridge {
        let app = |scope: Scope, mut inbound: Inbound, outbound: Outbound| async move {
            let body = inbound.body().await;
            let headers = vec![(Bytes::from("x-path"), Bytes::from(scope.path.clone()))];
            outbound.send(OutboundMessage::start(200, headers)).await?;
            outbound.send(OutboundMessage::body(body)).await?;
            Ok::<(), AppError>(())
        };
        Bridge::from_application("echo", Arc::new(app))
    }

    fn body_json(result: &InvocationResult) -> Value {
        serde_json::from_str(&result.body).unwrap()
    }

    #[tokio::test]
    async fn echo_round_trip() {
        let result = echo_bridge()
            .handle(Envelope::Event(json!({"path": "/echo", "body": "hi"})))
            .await;
        assert_eq!(result.status_code, 200);
        assert_eq!(result.headers["x-path"], "/echo");
        assert_eq!(result.body, "hi");
    }

    #[tokio::test]
    async fn malformed_base64_is_400() {
        let result = echo_bridge()
            .handle(Envelope::Event(json!({"body": "%%%", "encoding": "base64"})))
            .await;
        assert_eq!(result.status_code, 400);
        assert_eq!(
            body_json(&result),
            json!({"error": "Bad request", "message": "Request body is not valid base64"})
        );
    }

    #[tokio::test]
    async fn application_error_is_generic_500() {
        let app = |_s: Scope, _i: Inbound, _o: Outbound| async move {
            Err::<(), _>(AppError::new("password=hunter2"))
        };
        let bridge = Bridge::from_application("failing", Arc::new(app));

        let result = bridge.handle(Envelope::Event(json!({}))).await;
        assert_eq!(result.status_code, 500);
        assert_eq!(body_json(&result), json!({"error": "Internal server error"}));
        assert!(!result.body.contains("hunter2"));
    }

    #[tokio::test]
    async fn missing_application_carries_hint() {
        let bridge = Bridge::new(LoadedApp::Missing {
            entry: "ledger".into(),
            available: vec!["famfin".into()],
        });

        let result = bridge.handle(Envelope::Event(json!({}))).await;
        assert_eq!(result.status_code, 500);
        let body = body_json(&result);
        assert_eq!(body["error"], "Application not found");
        assert_eq!(body["hint"], "set bridge.entry to one of: famfin");
    }

    #[tokio::test]
    async fn non_object_event_is_400() {
        let result = echo_bridge().handle(Envelope::Event(json!("GET /"))).await;
        assert_eq!(result.status_code, 400);
    }

    #[test]
    fn blocking_entry_without_runtime() {
        let result = echo_bridge().handle_blocking(Envelope::Event(json!({"body": "sync"})));
        assert_eq!(result.status_code, 200);
        assert_eq!(result.body, "sync");
    }
}
