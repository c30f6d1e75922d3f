//! famfin-app: the in-process application driven by the bridge.
//!
//! Provides the axum router of the Family Financial API shell, the stand-in
//! router used when the real one cannot be constructed, the adapter that
//! exposes any router through the [`famfin_async::Application`] calling
//! convention, and the factory that picks between them once per process.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | API info and endpoint list |
//! | GET | `/health` | Liveness |
//! | GET | `/api/health` | Liveness |
//! | POST | `/api/expenses` | Validate and store an expense |
//!
//! Everything else answers 404 with an error envelope.

pub mod factory;
pub mod handlers;
pub mod service;
pub mod standin;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use famfin_core::Settings;

pub use factory::{AppConstructor, AppContext, AppFactory, AppRegistry, LoadedApp};
pub use service::RouterApp;
pub use store::{ExpenseStore, MemoryStore};

/// Shared state for the real application's handlers.
#[derive(Clone)]
pub struct ApiState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn ExpenseStore>,
}

/// Build the real application's router.
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/health", get(handlers::health))
        .route("/api/expenses", post(handlers::create_expense))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), handlers::cors))
        .with_state(state)
}
