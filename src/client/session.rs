//! Task list session.
//!
//! [`TaskListSession`] wires a [`QueryController`], a [`ResultCache`], and a
//! [`TaskApi`] together: controller requests are served from the cache when
//! the refetch policy allows, otherwise fetched, and applied responses are
//! merged into the cache. A failed fetch leaves the cache untouched and is
//! exposed through [`TaskListSession::error`] until the next successful one.

use tokio::time::{Instant, sleep_until};

use super::api::{ClientError, TaskApi};
use super::cache::{GET_TASKS_ENDPOINT, RefetchPolicy, ResultCache};
use super::controller::{
    ControllerConfig, ControllerState, FetchRequest, QueryController, ScrollPosition,
};
use crate::domain::{QueryResult, SortField, SortOrder, TaskFilters, TaskRecord};

/// Async driver for an infinitely scrolling task list.
#[derive(Debug)]
pub struct TaskListSession<A> {
    api: A,
    controller: QueryController,
    cache: ResultCache,
    error: Option<ClientError>,
}

impl<A: TaskApi> TaskListSession<A> {
    /// Creates a session with default controller settings and refetch policy.
    pub fn new(api: A) -> Self {
        Self::with_config(api, ControllerConfig::default(), RefetchPolicy::default())
    }

    /// Creates a session with explicit settings.
    pub fn with_config(api: A, config: ControllerConfig, policy: RefetchPolicy) -> Self {
        Self {
            api,
            controller: QueryController::new(config),
            cache: ResultCache::new(policy),
            error: None,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Returns the controller state.
    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    /// Returns the accumulated result, if any page has loaded.
    pub fn result(&self) -> Option<&QueryResult> {
        self.cache.get(GET_TASKS_ENDPOINT)
    }

    /// Returns every task loaded so far, in page order.
    pub fn tasks(&self) -> &[TaskRecord] {
        self.result()
            .map(|result| result.data.as_slice())
            .unwrap_or_default()
    }

    /// Returns the error of the last applied fetch, if it failed.
    pub const fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    /// Returns true if more pages can be loaded.
    pub fn has_more(&self) -> bool {
        self.controller.has_more()
    }

    // -------------------------------------------------------------------------
    // Triggers
    // -------------------------------------------------------------------------

    /// Loads the first page.
    pub async fn start(&mut self) {
        let request = self.controller.start();
        self.run(request).await;
    }

    /// Replaces the structured filters and reloads from page 1.
    pub async fn set_filters(&mut self, filters: TaskFilters) {
        let request = self.controller.set_filters(filters);
        self.run_optional(request).await;
    }

    /// Changes the sort field and reloads from page 1.
    pub async fn set_sort_by(&mut self, sort_by: Option<SortField>) {
        let request = self.controller.set_sort_by(sort_by);
        self.run_optional(request).await;
    }

    /// Changes the sort direction and reloads from page 1.
    pub async fn set_sort_order(&mut self, sort_order: SortOrder) {
        let request = self.controller.set_sort_order(sort_order);
        self.run_optional(request).await;
    }

    /// Records search input; only a leading-edge commit fetches immediately.
    ///
    /// Call [`TaskListSession::settle`] to wait for the debounce window.
    pub async fn input_search(&mut self, text: impl Into<String>) {
        let request = self.controller.input_search(text, Instant::now());
        self.run_optional(request).await;
    }

    /// Waits out pending search input and runs the resulting query.
    pub async fn settle(&mut self) {
        while let Some(deadline) = self.controller.next_deadline() {
            sleep_until(deadline).await;
            let request = self.controller.poll_debounce(Instant::now());
            self.run_optional(request).await;
        }
    }

    /// Loads the next page if one exists.
    pub async fn load_more(&mut self) {
        let request = self.controller.load_more();
        self.run_optional(request).await;
    }

    /// Reports the viewport position; loads the next page near the bottom.
    pub async fn scroll(&mut self, position: ScrollPosition) {
        let request = self.controller.scroll(position);
        self.run_optional(request).await;
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn run_optional(&mut self, request: Option<FetchRequest>) {
        if let Some(request) = request {
            self.run(request).await;
        }
    }

    async fn run(&mut self, request: FetchRequest) {
        let FetchRequest { ticket, spec } = request;

        if !self.cache.should_refetch(GET_TASKS_ENDPOINT, &spec)
            && let Some(cached) = self.cache.get(GET_TASKS_ENDPOINT)
        {
            tracing::debug!(page = spec.page(), "serving query from cache");
            self.controller.complete(ticket, Ok(cached));
            return;
        }

        match self.api.fetch_tasks(&spec).await {
            Ok(result) => {
                if self.controller.complete(ticket, Ok(&result)) {
                    self.cache.merge(GET_TASKS_ENDPOINT, spec, result);
                    self.error = None;
                }
            }
            Err(error) => {
                if self.controller.complete(ticket, Err(&error)) {
                    self.error = Some(error);
                }
            }
        }
    }
}
