//! Common test helpers for integration tests.
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate. Helpers used only by some test
//! files would otherwise generate dead code warnings in the others.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use task_tracker_api::api::{AppState, router};
use task_tracker_api::client::{ClientError, LocalTaskApi, TaskApi};
use task_tracker_api::domain::{DailyActivity, EstimationCount, QueryResult, QuerySpec, TaskRecord};
use task_tracker_api::infrastructure::TaskStore;

// =============================================================================
// Store and Router Helpers
// =============================================================================

/// Loads the dataset bundled into the binary.
pub fn bundled_store() -> TaskStore {
    TaskStore::bundled().expect("bundled dataset should load")
}

/// Builds the application router over the bundled dataset.
pub fn create_test_app() -> Router {
    router(AppState::new(bundled_store()))
}

/// Builds the application router over `tasks`.
pub fn create_test_app_with(tasks: Vec<TaskRecord>) -> Router {
    router(AppState::new(TaskStore::new(tasks).expect("unique ids")))
}

/// Sends a GET request and decodes the JSON body.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

/// Extracts the task ids from a `/tasks` response body.
pub fn ids(body: &serde_json::Value) -> Vec<u64> {
    body["data"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|task| task["id"].as_u64())
        .collect()
}

/// Extracts the task ids from loaded records.
pub fn record_ids(tasks: &[TaskRecord]) -> Vec<u64> {
    tasks.iter().map(|task| task.id.value()).collect()
}

/// Creates a record with the fields the query engine looks at.
pub fn task(id: u64, name: &str, due_date: &str) -> TaskRecord {
    TaskRecord::new(id, name, "description", due_date, "2024-01-01T00:00:00Z")
}

// =============================================================================
// Recording Task API
// =============================================================================

/// [`TaskApi`] that records every task query and can be switched to fail.
#[derive(Debug, Clone)]
pub struct RecordingTaskApi {
    inner: LocalTaskApi,
    requests: Arc<Mutex<Vec<QuerySpec>>>,
    failure: Arc<Mutex<Option<ClientError>>>,
}

impl RecordingTaskApi {
    pub fn new(store: TaskStore) -> Self {
        Self {
            inner: LocalTaskApi::new(Arc::new(store)),
            requests: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Makes subsequent task queries fail with `error`, or succeed with `None`.
    pub fn fail_with(&self, error: Option<ClientError>) {
        *self.failure.lock().unwrap() = error;
    }

    /// Returns every task query issued so far.
    pub fn requests(&self) -> Vec<QuerySpec> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns the search term of every task query issued so far.
    pub fn searches(&self) -> Vec<Option<String>> {
        self.requests()
            .iter()
            .map(|spec| spec.active_search().map(String::from))
            .collect()
    }
}

impl TaskApi for RecordingTaskApi {
    async fn fetch_tasks(&self, spec: &QuerySpec) -> Result<QueryResult, ClientError> {
        self.requests.lock().unwrap().push(spec.clone());
        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(error) => Err(error),
            None => self.inner.fetch_tasks(spec).await,
        }
    }

    async fn fetch_analytics(&self) -> Result<DailyActivity, ClientError> {
        self.inner.fetch_analytics().await
    }

    async fn fetch_estimation_hours(&self) -> Result<Vec<EstimationCount>, ClientError> {
        self.inner.fetch_estimation_hours().await
    }
}
