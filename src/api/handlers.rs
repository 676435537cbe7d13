//! Shared handler state and the health endpoint.

use std::sync::Arc;

use axum::Json;

use crate::infrastructure::{PageSizeLimits, TaskStore};

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// The store is read-only and shared by every request through an `Arc`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Task store queried by `/tasks` and the analytics endpoints.
    pub store: Arc<TaskStore>,
    /// Page size policy for `/tasks`.
    pub page_size: PageSizeLimits,
}

impl AppState {
    /// Creates a new `AppState` with the default page size policy.
    #[must_use]
    pub fn new(store: TaskStore) -> Self {
        Self::with_page_size(store, PageSizeLimits::default())
    }

    /// Creates a new `AppState` with a custom page size policy.
    #[must_use]
    pub fn with_page_size(store: TaskStore, page_size: PageSizeLimits) -> Self {
        Self {
            store: Arc::new(store),
            page_size,
        }
    }
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check endpoint.
///
/// # Response
///
/// - **200 OK**: Service is healthy
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================
