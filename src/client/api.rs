//! Task API transport.
//!
//! [`TaskApi`] is the seam between the client-side session and the server.
//! [`HttpTaskApi`] talks to a running server over HTTP; [`LocalTaskApi`]
//! runs the query engine in-process over a shared store.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::{
    DailyActivity, EstimationCount, QueryResult, QuerySpec, daily_activity, estimation_histogram,
    execute,
};
use crate::infrastructure::TaskStore;

// =============================================================================
// Client Error
// =============================================================================

/// Error type for task API requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The server could not be reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The server answered with a non-success status.
    #[error("Unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    /// The response body could not be decoded.
    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidBody(error.to_string())
        } else if let Some(status) = error.status() {
            Self::UnexpectedStatus(status.as_u16())
        } else {
            Self::ConnectionFailed(error.to_string())
        }
    }
}

// =============================================================================
// Task API
// =============================================================================

/// Operations the client needs from the task service.
pub trait TaskApi: Send + Sync {
    /// Fetches one page of tasks (`GET /tasks`).
    fn fetch_tasks(
        &self,
        spec: &QuerySpec,
    ) -> impl Future<Output = Result<QueryResult, ClientError>> + Send;

    /// Fetches the per-day series (`GET /analytics`).
    fn fetch_analytics(&self) -> impl Future<Output = Result<DailyActivity, ClientError>> + Send;

    /// Fetches the estimated-hours histogram (`GET /analytics/estimation-hours`).
    fn fetch_estimation_hours(
        &self,
    ) -> impl Future<Output = Result<Vec<EstimationCount>, ClientError>> + Send;
}

// =============================================================================
// HTTP Task API
// =============================================================================

/// [`TaskApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaskApi {
    /// Creates a client for the server at `base_url` (e.g. `http://localhost:3000`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a client reusing an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Returns the server base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "requesting");

        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|error| ClientError::InvalidBody(error.to_string()))
    }
}

impl TaskApi for HttpTaskApi {
    async fn fetch_tasks(&self, spec: &QuerySpec) -> Result<QueryResult, ClientError> {
        let query = spec.to_query_pairs();
        self.get_json("/tasks", &query).await
    }

    async fn fetch_analytics(&self) -> Result<DailyActivity, ClientError> {
        self.get_json("/analytics", &[]).await
    }

    async fn fetch_estimation_hours(&self) -> Result<Vec<EstimationCount>, ClientError> {
        self.get_json("/analytics/estimation-hours", &[]).await
    }
}

// =============================================================================
// Local Task API
// =============================================================================

/// [`TaskApi`] that runs the query engine in-process.
#[derive(Debug, Clone)]
pub struct LocalTaskApi {
    store: Arc<TaskStore>,
}

impl LocalTaskApi {
    /// Creates a local API over a shared store.
    #[must_use]
    pub const fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }
}

impl TaskApi for LocalTaskApi {
    async fn fetch_tasks(&self, spec: &QuerySpec) -> Result<QueryResult, ClientError> {
        Ok(execute(&self.store, spec))
    }

    async fn fetch_analytics(&self) -> Result<DailyActivity, ClientError> {
        Ok(daily_activity(self.store.tasks()))
    }

    async fn fetch_estimation_hours(&self) -> Result<Vec<EstimationCount>, ClientError> {
        Ok(estimation_histogram(self.store.tasks()))
    }
}

// =============================================================================
// Tests
// =============================================================================
