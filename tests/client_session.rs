//! Integration tests for the client-side task list session.
//!
//! # Tests Covered
//!
//! - Infinite-scroll merge and reset
//! - Search debounce on both edges (paused tokio clock)
//! - Empty dataset never loads more
//! - Upstream failures leave the cache untouched
//! - `sortOrder` refetch policy
//! - Stale responses are never merged

mod common;

use std::num::NonZeroU32;
use std::time::Duration;

use rstest::rstest;

use common::{RecordingTaskApi, record_ids, task};
use task_tracker_api::client::{
    ClientError, ControllerConfig, ControllerState, DebounceEdge, GET_TASKS_ENDPOINT,
    QueryController, RefetchPolicy, ResultCache, ScrollPosition, TaskListSession,
};
use task_tracker_api::domain::{FilterField, QuerySpec, SortField, SortOrder, TaskFilters, execute};
use task_tracker_api::infrastructure::TaskStore;

fn six_tasks() -> TaskStore {
    TaskStore::new(
        (1..=6)
            .map(|id| task(id, &format!("task {id}"), &format!("2024-01-0{id}")))
            .collect(),
    )
    .unwrap()
}

fn config(page_size: u32, debounce_edge: DebounceEdge) -> ControllerConfig {
    ControllerConfig {
        page_size: NonZeroU32::new(page_size).unwrap(),
        debounce_edge,
        ..ControllerConfig::default()
    }
}

fn session(
    api: &RecordingTaskApi,
    page_size: u32,
    policy: RefetchPolicy,
) -> TaskListSession<RecordingTaskApi> {
    TaskListSession::with_config(
        api.clone(),
        config(page_size, DebounceEdge::Trailing),
        policy,
    )
}

const NEAR_BOTTOM: ScrollPosition = ScrollPosition {
    scroll_top: 900.0,
    viewport_height: 100.0,
    content_height: 1000.0,
};

// =============================================================================
// Merge
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_pages_append_then_filter_change_replaces() {
    let api = RecordingTaskApi::new(six_tasks());
    let mut session = session(&api, 2, RefetchPolicy::default());

    session.start().await;
    assert_eq!(record_ids(session.tasks()), vec![1, 2]);
    assert_eq!(session.result().unwrap().total_pages, 3);

    session.scroll(NEAR_BOTTOM).await;
    assert_eq!(record_ids(session.tasks()), vec![1, 2, 3, 4]);
    assert_eq!(session.result().unwrap().current_page, 2);

    session
        .set_filters(TaskFilters::default().with(FilterField::Name, "task 5"))
        .await;
    assert_eq!(record_ids(session.tasks()), vec![5]);
    assert!(!session.has_more());
}

#[rstest]
#[tokio::test]
async fn test_loading_every_page_matches_unpaginated_query() {
    let store = six_tasks();
    let api = RecordingTaskApi::new(store.clone());
    let mut session = session(&api, 4, RefetchPolicy::default());

    session.set_sort_by(Some(SortField::DueDate)).await;
    session.set_sort_order(SortOrder::Desc).await;
    while session.has_more() {
        session.load_more().await;
    }

    let spec = QuerySpec::new(1, 100)
        .unwrap()
        .with_sort(Some(SortField::DueDate), SortOrder::Desc);
    let everything = execute(&store, &spec);
    assert_eq!(record_ids(session.tasks()), record_ids(&everything.data));
    assert_eq!(record_ids(session.tasks()), vec![6, 5, 4, 3, 2, 1]);
    assert_eq!(api.requests().len(), 3);
}

// =============================================================================
// Debounce
// =============================================================================

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_trailing_debounce_commits_only_last_input() {
    let api = RecordingTaskApi::new(six_tasks());
    let mut session = session(&api, 10, RefetchPolicy::default());
    session.start().await;

    session.input_search("a").await;
    tokio::time::advance(Duration::from_millis(100)).await;
    session.input_search("ab").await;
    tokio::time::advance(Duration::from_millis(100)).await;
    session.input_search("abc").await;
    assert_eq!(
        session.state(),
        ControllerState::Debouncing("abc".to_string())
    );

    session.settle().await;

    assert_eq!(api.searches(), vec![None, Some("abc".to_string())]);
    assert_eq!(session.state(), ControllerState::Idle);
    assert!(session.tasks().is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_leading_debounce_commits_first_and_last_input() {
    let api = RecordingTaskApi::new(six_tasks());
    let mut session = TaskListSession::with_config(
        api.clone(),
        config(10, DebounceEdge::Leading),
        RefetchPolicy::default(),
    );
    session.start().await;

    session.input_search("a").await;
    tokio::time::advance(Duration::from_millis(100)).await;
    session.input_search("ab").await;
    tokio::time::advance(Duration::from_millis(100)).await;
    session.input_search("abc").await;
    session.settle().await;

    assert_eq!(
        api.searches(),
        vec![None, Some("a".to_string()), Some("abc".to_string())]
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_search_resets_to_first_page() {
    let api = RecordingTaskApi::new(six_tasks());
    let mut session = session(&api, 2, RefetchPolicy::default());
    session.start().await;
    session.load_more().await;

    session.input_search("task").await;
    session.settle().await;

    let last = api.requests().last().cloned().unwrap();
    assert_eq!(last.page(), 1);
    assert_eq!(record_ids(session.tasks()), vec![1, 2]);
}

// =============================================================================
// Edge Cases
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_empty_dataset_never_loads_more() {
    let api = RecordingTaskApi::new(TaskStore::empty());
    let mut session = session(&api, 10, RefetchPolicy::default());

    session.start().await;
    session.load_more().await;
    session.scroll(NEAR_BOTTOM).await;

    let result = session.result().unwrap();
    assert!(result.data.is_empty());
    assert_eq!(result.total_pages, 0);
    assert_eq!(api.requests().len(), 1);
}

#[rstest]
#[tokio::test]
async fn test_failure_surfaces_error_and_keeps_cache() {
    let api = RecordingTaskApi::new(six_tasks());
    let mut session = session(&api, 2, RefetchPolicy::default());
    session.start().await;

    api.fail_with(Some(ClientError::UnexpectedStatus(503)));
    session.load_more().await;

    assert_eq!(session.error(), Some(&ClientError::UnexpectedStatus(503)));
    assert_eq!(record_ids(session.tasks()), vec![1, 2]);
    assert_eq!(session.state(), ControllerState::Idle);

    api.fail_with(None);
    session.load_more().await;

    assert!(session.error().is_none());
    assert_eq!(record_ids(session.tasks()), vec![1, 2, 3, 4]);
}

// =============================================================================
// Refetch Policy
// =============================================================================

#[rstest]
#[case(RefetchPolicy::Reference, 2)]
#[case(RefetchPolicy::IncludeSortOrder, 3)]
#[tokio::test]
async fn test_sort_order_only_change(#[case] policy: RefetchPolicy, #[case] expected: usize) {
    let api = RecordingTaskApi::new(six_tasks());
    let mut session = session(&api, 10, policy);

    session.start().await;
    session.set_sort_by(Some(SortField::DueDate)).await;
    session.set_sort_order(SortOrder::Desc).await;

    assert_eq!(api.requests().len(), expected);
    assert_eq!(session.state(), ControllerState::Idle);
}

#[rstest]
#[tokio::test]
async fn test_reference_policy_keeps_previous_order() {
    let api = RecordingTaskApi::new(six_tasks());
    let mut session = session(&api, 10, RefetchPolicy::Reference);

    session.start().await;
    session.set_sort_by(Some(SortField::DueDate)).await;
    session.set_sort_order(SortOrder::Desc).await;

    assert_eq!(record_ids(session.tasks()), vec![1, 2, 3, 4, 5, 6]);
}

// =============================================================================
// Stale Responses
// =============================================================================

#[rstest]
fn test_stale_response_is_not_merged() {
    let store = six_tasks();
    let mut controller = QueryController::new(config(2, DebounceEdge::Trailing));
    let mut cache = ResultCache::default();

    let first = controller.start();
    let result = execute(&store, &first.spec);
    assert!(controller.complete(first.ticket, Ok(&result)));
    cache.merge(GET_TASKS_ENDPOINT, first.spec, result);

    let superseded = controller.load_more().unwrap();
    let filters = TaskFilters::default().with(FilterField::Name, "task 6");
    let current = controller.set_filters(filters).unwrap();

    let current_result = execute(&store, &current.spec);
    assert!(controller.complete(current.ticket, Ok(&current_result)));
    cache.merge(GET_TASKS_ENDPOINT, current.spec, current_result);

    let late_result = execute(&store, &superseded.spec);
    if controller.complete(superseded.ticket, Ok(&late_result)) {
        cache.merge(GET_TASKS_ENDPOINT, superseded.spec, late_result);
    }

    let ids = record_ids(&cache.get(GET_TASKS_ENDPOINT).unwrap().data);
    assert_eq!(ids, vec![6]);
}
