//! Stand-in application served when the real one fails to construct.
//!
//! Keeps the deployment answering: the root and health routes report the
//! captured failure with 200, anything else gets a 500 diagnostic.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;

#[derive(Clone)]
struct StandInState {
    details: Arc<str>,
}

/// Build the stand-in router carrying `details` for diagnostics.
pub fn standin_router(details: impl Into<String>) -> Router {
    let state = StandInState {
        details: Arc::from(details.into()),
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/health", get(health))
        .fallback(unavailable)
        .with_state(state)
}

async fn root(State(state): State<StandInState>) -> impl IntoResponse {
    Json(json!({
        "status": "error",
        "details": &*state.details,
        "message": "Deployment issue - check logs",
    }))
}

async fn health(State(state): State<StandInState>) -> impl IntoResponse {
    Json(json!({
        "status": "building",
        "app": "fallback",
        "details": &*state.details,
    }))
}

async fn unavailable(State(state): State<StandInState>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Application failed to initialize",
            "details": &*state.details,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn get_json(path: &str) -> (StatusCode, serde_json::Value) {
        let response = standin_router("required setting SUPABASE_URL is empty")
            .oneshot(http::Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn root_reports_error_details() {
        let (status, body) = get_json("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert_eq!(body["details"], "required setting SUPABASE_URL is empty");
    }

    #[tokio::test]
    async fn health_reports_building() {
        for path in ["/health", "/api/health"] {
            let (status, body) = get_json(path).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "building");
            assert_eq!(body["app"], "fallback");
        }
    }

    #[tokio::test]
    async fn other_routes_are_500() {
        let (status, body) = get_json("/api/expenses").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Application failed to initialize");
    }
}
