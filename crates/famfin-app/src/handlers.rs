//! Route handlers of the real application.
//!
//! Every error leaves as an [`ErrorEnvelope`] JSON body.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use famfin_core::ErrorEnvelope;
use serde_json::json;
use tracing::{debug, error};

use crate::ApiState;
use crate::store::NewExpense;

/// Endpoints advertised by `GET /`.
pub const ENDPOINTS: &[&str] = &[
    "/health",
    "/api/health",
    "/api/auth/login",
    "/api/auth/register",
    "/api/expenses",
    "/api/dashboard/monthly",
    "/api/dashboard/yearly",
    "/api/categories",
    "/api/payment-methods",
];

pub(crate) fn error_response(envelope: ErrorEnvelope, status: StatusCode) -> Response {
    (status, Json(envelope.to_value())).into_response()
}

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Family Financial API",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

/// GET /health, GET /api/health
pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "app": "famfin",
        "store_configured": !state.settings.store_url.is_empty(),
    }))
}

/// POST /api/expenses
pub async fn create_expense(
    State(state): State<ApiState>,
    payload: Result<Json<NewExpense>, JsonRejection>,
) -> Response {
    let Json(expense) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "rejected expense payload");
            return error_response(
                ErrorEnvelope::bad_request("Request body is not a valid expense"),
                StatusCode::BAD_REQUEST,
            );
        }
    };

    if let Err(reason) = expense.validate() {
        return error_response(ErrorEnvelope::bad_request(reason), StatusCode::BAD_REQUEST);
    }

    match state.store.insert(expense).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Expense added successfully",
                "id": created.id.to_string(),
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to add expense");
            error_response(
                ErrorEnvelope::internal().with_message("Failed to add expense"),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// Any unmatched route.
pub async fn not_found(method: Method, uri: axum::http::Uri) -> Response {
    error_response(
        ErrorEnvelope::not_found(format!("No route for {method} {}", uri.path())),
        StatusCode::NOT_FOUND,
    )
}

/// Reflect allowed origins and answer preflight requests.
pub async fn cors(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|origin| state.settings.allows_origin(origin))
        .and_then(|origin| HeaderValue::from_str(origin).ok());

    let Some(origin) = origin else {
        return next.run(request).await;
    };

    let mut response = if request.method() == Method::OPTIONS {
        let mut preflight = StatusCode::NO_CONTENT.into_response();
        let headers = preflight.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("authorization, content-type"),
        );
        preflight
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    response
}
