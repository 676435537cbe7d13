//! Query trigger controller.
//!
//! Decides when the task list issues a query. The controller does no I/O and
//! reads no clock: every time-dependent method takes `now`, and every method
//! that starts a fetch returns a [`FetchRequest`] for the caller to run.
//!
//! - Filter, sort, or committed search changes reset to page 1.
//! - Free-text search input is debounced before it is committed.
//! - Scrolling near the bottom or an explicit load-more requests the next
//!   page, but only while idle and while more pages exist.
//! - Each fetch carries a [`FetchTicket`]; only the response for the
//!   current ticket is applied, everything else is stale.

use std::num::NonZeroU32;
use std::time::Duration;

use tokio::time::Instant;

use super::api::ClientError;
use crate::domain::{QueryResult, QuerySpec, SortField, SortOrder, TaskFilters};
use crate::infrastructure::DEFAULT_PAGE_SIZE;

/// Default quiet period before search input is committed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default distance from the content bottom, in pixels, that triggers load-more.
pub const DEFAULT_SCROLL_THRESHOLD: f64 = 200.0;

// =============================================================================
// Configuration
// =============================================================================

/// Which end of a burst of search input is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebounceEdge {
    /// Commit the last input once the window elapses without further input.
    #[default]
    Trailing,
    /// Commit the first input of a quiet period immediately; later inputs in
    /// the burst are committed on the trailing edge.
    Leading,
}

/// Controller tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    /// Page size for every request.
    pub page_size: NonZeroU32,
    /// Debounce window for search input.
    pub debounce: Duration,
    /// Debounce edge.
    pub debounce_edge: DebounceEdge,
    /// Scroll distance from the bottom that triggers load-more.
    pub scroll_threshold: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            page_size: NonZeroU32::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroU32::MIN),
            debounce: DEFAULT_DEBOUNCE,
            debounce_edge: DebounceEdge::Trailing,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
        }
    }
}

// =============================================================================
// Scroll Position
// =============================================================================

/// Viewport geometry reported by the list view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    /// Offset of the viewport top from the content top.
    pub scroll_top: f64,
    /// Viewport height.
    pub viewport_height: f64,
    /// Total content height.
    pub content_height: f64,
}

impl ScrollPosition {
    /// Distance between the viewport bottom and the content bottom.
    #[must_use]
    pub fn distance_to_bottom(&self) -> f64 {
        self.content_height - (self.scroll_top + self.viewport_height)
    }
}

// =============================================================================
// Tickets and State
// =============================================================================

/// Handle of one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    /// Returns the generation number.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

/// A fetch the caller must run and report back through
/// [`QueryController::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Ticket to pass back on completion.
    pub ticket: FetchTicket,
    /// Query to run.
    pub spec: QuerySpec,
}

/// Observable controller state.
///
/// A fetch in flight takes precedence over pending search input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    /// Nothing pending.
    Idle,
    /// Search input is waiting for the debounce window to elapse.
    Debouncing(String),
    /// A fetch is in flight.
    Fetching(QuerySpec),
}

#[derive(Debug, Clone)]
struct PendingSearch {
    text: String,
    deadline: Instant,
}

// =============================================================================
// Query Controller
// =============================================================================

/// Sans-IO state machine driving task list queries.
#[derive(Debug, Clone)]
pub struct QueryController {
    config: ControllerConfig,
    filters: TaskFilters,
    sort_by: Option<SortField>,
    sort_order: SortOrder,
    search: String,
    pending_search: Option<PendingSearch>,
    quiet_until: Option<Instant>,
    loaded_page: u32,
    total_pages: u64,
    in_flight: Option<FetchRequest>,
    generation: u64,
}

impl Default for QueryController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl QueryController {
    /// Creates an idle controller with no filters, sort, or search.
    #[must_use]
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            filters: TaskFilters::default(),
            sort_by: None,
            sort_order: SortOrder::Asc,
            search: String::new(),
            pending_search: None,
            quiet_until: None,
            loaded_page: 0,
            total_pages: 0,
            in_flight: None,
            generation: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Returns the observable state.
    #[must_use]
    pub fn state(&self) -> ControllerState {
        if let Some(request) = &self.in_flight {
            ControllerState::Fetching(request.spec.clone())
        } else if let Some(pending) = &self.pending_search {
            ControllerState::Debouncing(pending.text.clone())
        } else {
            ControllerState::Idle
        }
    }

    /// Returns true while a fetch is in flight.
    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Returns the ticket of the fetch in flight.
    #[must_use]
    pub fn in_flight(&self) -> Option<FetchTicket> {
        self.in_flight.as_ref().map(|request| request.ticket)
    }

    /// Returns the committed search text.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Returns the active filters.
    #[must_use]
    pub const fn filters(&self) -> &TaskFilters {
        &self.filters
    }

    /// Returns the last page applied from a response (0 before the first).
    #[must_use]
    pub const fn loaded_page(&self) -> u32 {
        self.loaded_page
    }

    /// Returns true if a page after the last applied one exists.
    #[must_use]
    pub fn has_more(&self) -> bool {
        u64::from(self.loaded_page) < self.total_pages
    }

    /// Returns when pending search input is due to be committed.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_search.as_ref().map(|pending| pending.deadline)
    }

    // -------------------------------------------------------------------------
    // Triggers
    // -------------------------------------------------------------------------

    /// Issues the initial page-1 query.
    pub fn start(&mut self) -> FetchRequest {
        self.reset()
    }

    /// Replaces the structured filters.
    pub fn set_filters(&mut self, filters: TaskFilters) -> Option<FetchRequest> {
        if self.filters == filters {
            return None;
        }
        self.filters = filters;
        Some(self.reset())
    }

    /// Changes the sort field.
    pub fn set_sort_by(&mut self, sort_by: Option<SortField>) -> Option<FetchRequest> {
        if self.sort_by == sort_by {
            return None;
        }
        self.sort_by = sort_by;
        Some(self.reset())
    }

    /// Changes the sort direction.
    pub fn set_sort_order(&mut self, sort_order: SortOrder) -> Option<FetchRequest> {
        if self.sort_order == sort_order {
            return None;
        }
        self.sort_order = sort_order;
        Some(self.reset())
    }

    /// Commits search text immediately, discarding pending input.
    pub fn commit_search(&mut self, text: impl Into<String>) -> Option<FetchRequest> {
        self.pending_search = None;
        let text = text.into();
        if self.search == text {
            return None;
        }
        self.search = text;
        Some(self.reset())
    }

    /// Records search input typed at `now`.
    ///
    /// Returns a request only on the leading edge of a quiet period.
    pub fn input_search(&mut self, text: impl Into<String>, now: Instant) -> Option<FetchRequest> {
        let text = text.into();
        let deadline = now + self.config.debounce;

        match self.config.debounce_edge {
            DebounceEdge::Leading => {
                let quiet = self.quiet_until.is_none_or(|until| now >= until);
                self.quiet_until = Some(deadline);
                if quiet && self.pending_search.is_none() {
                    return self.commit_search(text);
                }
                self.pending_search = Some(PendingSearch { text, deadline });
                None
            }
            DebounceEdge::Trailing => {
                self.pending_search = Some(PendingSearch { text, deadline });
                None
            }
        }
    }

    /// Commits pending search input whose window has elapsed by `now`.
    pub fn poll_debounce(&mut self, now: Instant) -> Option<FetchRequest> {
        let due = self
            .pending_search
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline);
        if !due {
            return None;
        }

        let pending = self.pending_search.take()?;
        tracing::debug!(search = %pending.text, "search input settled");
        self.commit_search(pending.text)
    }

    /// Requests the next page if the viewport is near the content bottom.
    pub fn scroll(&mut self, position: ScrollPosition) -> Option<FetchRequest> {
        if position.distance_to_bottom() <= self.config.scroll_threshold {
            self.load_more()
        } else {
            None
        }
    }

    /// Requests the next page while idle and while more pages exist.
    pub fn load_more(&mut self) -> Option<FetchRequest> {
        if self.is_fetching() || !self.has_more() {
            return None;
        }
        let next_page = self.loaded_page.saturating_add(1);
        let page = NonZeroU32::new(next_page)?;
        Some(self.issue(page))
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    /// Reports the outcome of the fetch identified by `ticket`.
    ///
    /// Returns true if the outcome was applied. Outcomes for any ticket other
    /// than the one in flight are stale and ignored.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<&QueryResult, &ClientError>,
    ) -> bool {
        if self.in_flight() != Some(ticket) {
            tracing::debug!(
                generation = ticket.generation(),
                current = ?self.in_flight().map(FetchTicket::generation),
                "dropping stale response"
            );
            return false;
        }
        self.in_flight = None;

        match outcome {
            Ok(result) => {
                self.loaded_page = result.current_page;
                self.total_pages = result.total_pages;
            }
            Err(error) => {
                tracing::warn!(%error, generation = ticket.generation(), "task fetch failed");
            }
        }
        true
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn reset(&mut self) -> FetchRequest {
        self.loaded_page = 0;
        self.total_pages = 0;
        self.issue(NonZeroU32::MIN)
    }

    fn issue(&mut self, page: NonZeroU32) -> FetchRequest {
        self.generation += 1;
        let request = FetchRequest {
            ticket: FetchTicket(self.generation),
            spec: self.spec_for(page),
        };
        if let Some(superseded) = self.in_flight.replace(request.clone()) {
            tracing::debug!(
                generation = superseded.ticket.generation(),
                "superseding fetch in flight"
            );
        }
        request
    }

    fn spec_for(&self, page: NonZeroU32) -> QuerySpec {
        let spec = QuerySpec::from_parts(page, self.config.page_size)
            .with_filters(self.filters.clone())
            .with_sort(self.sort_by, self.sort_order);
        if self.search.is_empty() {
            spec
        } else {
            spec.with_search(self.search.clone())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilterField, TaskRecord};
    use rstest::{fixture, rstest};

    fn page_result(current_page: u32, total: u64, total_pages: u64) -> QueryResult {
        let task = TaskRecord::new(
            u64::from(current_page),
            "n",
            "d",
            "2024-01-01",
            "2024-01-01T00:00:00Z",
        );
        QueryResult {
            data: vec![task],
            total,
            total_pages,
            current_page,
        }
    }

    #[fixture]
    fn loaded() -> QueryController {
        let mut controller = QueryController::default();
        let request = controller.start();
        assert!(controller.complete(request.ticket, Ok(&page_result(1, 30, 3))));
        controller
    }

    fn after(start: Instant) -> impl Fn(u64) -> Instant {
        move |millis| start + Duration::from_millis(millis)
    }

    fn near_bottom() -> ScrollPosition {
        ScrollPosition {
            scroll_top: 850.0,
            viewport_height: 100.0,
            content_height: 1000.0,
        }
    }

    #[rstest]
    fn test_start_issues_first_page() {
        let mut controller = QueryController::default();
        let request = controller.start();

        assert_eq!(request.spec.page(), 1);
        assert_eq!(request.spec.limit(), 10);
        assert_eq!(controller.state(), ControllerState::Fetching(request.spec));
    }

    #[rstest]
    fn test_completion_returns_to_idle(loaded: QueryController) {
        assert_eq!(loaded.state(), ControllerState::Idle);
        assert_eq!(loaded.loaded_page(), 1);
        assert!(loaded.has_more());
    }

    #[rstest]
    fn test_load_more_increments_page(mut loaded: QueryController) {
        let request = loaded.load_more().unwrap();
        assert_eq!(request.spec.page(), 2);
        assert!(loaded.is_fetching());
    }

    #[rstest]
    fn test_load_more_blocked_while_fetching(mut loaded: QueryController) {
        assert!(loaded.load_more().is_some());
        assert!(loaded.load_more().is_none());
    }

    #[rstest]
    fn test_load_more_stops_at_last_page(mut loaded: QueryController) {
        for page in 2..=3 {
            let request = loaded.load_more().unwrap();
            assert!(loaded.complete(request.ticket, Ok(&page_result(page, 30, 3))));
        }
        assert!(!loaded.has_more());
        assert!(loaded.load_more().is_none());
    }

    #[rstest]
    fn test_empty_result_never_loads_more() {
        let mut controller = QueryController::default();
        let request = controller.start();
        let empty = QueryResult {
            current_page: 1,
            ..QueryResult::default()
        };
        controller.complete(request.ticket, Ok(&empty));

        assert!(controller.load_more().is_none());
        assert!(controller.scroll(near_bottom()).is_none());
    }

    #[rstest]
    fn test_load_more_before_first_response_is_ignored() {
        let mut controller = QueryController::default();
        assert!(controller.load_more().is_none());
    }

    #[rstest]
    #[case(850.0, true)]
    #[case(700.0, true)]
    #[case(699.0, false)]
    #[case(0.0, false)]
    fn test_scroll_threshold(
        mut loaded: QueryController,
        #[case] scroll_top: f64,
        #[case] fires: bool,
    ) {
        let position = ScrollPosition {
            scroll_top,
            ..near_bottom()
        };
        assert_eq!(loaded.scroll(position).is_some(), fires);
    }

    #[rstest]
    fn test_filter_change_resets_to_first_page(mut loaded: QueryController) {
        let next = loaded.load_more().unwrap();
        loaded.complete(next.ticket, Ok(&page_result(2, 30, 3)));

        let filters = TaskFilters::default().with(FilterField::Status, "Pending");
        let request = loaded.set_filters(filters.clone()).unwrap();

        assert_eq!(request.spec.page(), 1);
        assert_eq!(request.spec.filters, filters);
        assert_eq!(loaded.loaded_page(), 0);
        assert!(!loaded.has_more());
    }

    #[rstest]
    fn test_unchanged_values_do_not_trigger(mut loaded: QueryController) {
        assert!(loaded.set_filters(TaskFilters::default()).is_none());
        assert!(loaded.set_sort_by(None).is_none());
        assert!(loaded.set_sort_order(SortOrder::Asc).is_none());
        assert!(loaded.commit_search("").is_none());
    }

    #[rstest]
    fn test_sort_changes_reset(mut loaded: QueryController) {
        let by = loaded.set_sort_by(Some(SortField::DueDate)).unwrap();
        loaded.complete(by.ticket, Ok(&page_result(1, 30, 3)));
        let order = loaded.set_sort_order(SortOrder::Desc).unwrap();

        assert_eq!(order.spec.page(), 1);
        assert_eq!(order.spec.sort_by, Some(SortField::DueDate));
        assert_eq!(order.spec.sort_order, SortOrder::Desc);
    }

    #[rstest]
    fn test_reset_while_fetching_supersedes_ticket(mut loaded: QueryController) {
        let stale = loaded.load_more().unwrap();
        let fresh = loaded.set_sort_by(Some(SortField::CreatedAt)).unwrap();

        assert!(fresh.ticket.generation() > stale.ticket.generation());
        assert!(!loaded.complete(stale.ticket, Ok(&page_result(2, 30, 3))));
        assert!(loaded.is_fetching());
        assert_eq!(loaded.loaded_page(), 0);

        assert!(loaded.complete(fresh.ticket, Ok(&page_result(1, 5, 1))));
        assert_eq!(loaded.state(), ControllerState::Idle);
        assert!(!loaded.has_more());
    }

    #[rstest]
    fn test_failure_returns_to_idle_and_keeps_progress(mut loaded: QueryController) {
        let request = loaded.load_more().unwrap();
        let error = ClientError::UnexpectedStatus(500);

        assert!(loaded.complete(request.ticket, Err(&error)));
        assert_eq!(loaded.state(), ControllerState::Idle);
        assert_eq!(loaded.loaded_page(), 1);
        assert_eq!(loaded.load_more().unwrap().spec.page(), 2);
    }

    #[rstest]
    fn test_trailing_debounce_commits_last_input() {
        let mut controller = QueryController::default();
        let at = after(Instant::now());

        assert!(controller.input_search("a", at(0)).is_none());
        assert!(controller.input_search("ab", at(100)).is_none());
        assert!(controller.input_search("abc", at(200)).is_none());
        assert_eq!(
            controller.state(),
            ControllerState::Debouncing("abc".to_string())
        );
        assert_eq!(controller.next_deadline(), Some(at(500)));

        assert!(controller.poll_debounce(at(499)).is_none());
        let request = controller.poll_debounce(at(500)).unwrap();

        assert_eq!(request.spec.active_search(), Some("abc"));
        assert_eq!(request.spec.page(), 1);
        assert!(controller.next_deadline().is_none());
    }

    #[rstest]
    fn test_leading_debounce_commits_first_and_last_input() {
        let mut controller = QueryController::new(ControllerConfig {
            debounce_edge: DebounceEdge::Leading,
            ..ControllerConfig::default()
        });
        let at = after(Instant::now());

        let leading = controller.input_search("a", at(0)).unwrap();
        assert_eq!(leading.spec.active_search(), Some("a"));
        assert!(controller.input_search("ab", at(100)).is_none());
        assert!(controller.input_search("abc", at(200)).is_none());

        let trailing = controller.poll_debounce(at(500)).unwrap();
        assert_eq!(trailing.spec.active_search(), Some("abc"));

        let next_burst = controller.input_search("abcd", at(900));
        assert_eq!(next_burst.unwrap().spec.active_search(), Some("abcd"));
    }

    #[rstest]
    fn test_settled_search_equal_to_committed_is_not_a_change() {
        let mut controller = QueryController::default();
        let at = after(Instant::now());
        controller.commit_search("abc");

        controller.input_search("abcd", at(0));
        controller.input_search("abc", at(50));

        assert!(controller.poll_debounce(at(350)).is_none());
        assert_eq!(controller.search(), "abc");
    }

    #[rstest]
    fn test_fetching_takes_precedence_over_debouncing() {
        let mut controller = QueryController::default();
        let request = controller.start();
        controller.input_search("x", Instant::now());
        assert_eq!(controller.state(), ControllerState::Fetching(request.spec));
    }
}
