//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod analytics;
pub mod error;
pub mod handlers;
pub mod query;

use axum::Router;
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use analytics::{analytics, estimation_hours};
pub use error::{ApiError, ApiErrorResponse, INTERNAL_SERVER_ERROR_MESSAGE, handle_panic};
pub use handlers::{AppState, HealthResponse, health_check};
pub use query::{ListTasksParams, list_tasks};

/// Builds the application router with tracing, CORS, and panic recovery.
pub fn router(state: AppState) -> Router {
    with_layers(routes()).with_state(state)
}

/// Route table without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/analytics", get(analytics))
        .route("/analytics/estimation-hours", get(estimation_hours))
        .route("/health", get(health_check))
}

/// Wraps routes in panic recovery, request tracing, and permissive CORS.
pub fn with_layers(routes: Router<AppState>) -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
