//! Dashboard analytics handlers.

use axum::{Json, extract::State};

use super::handlers::AppState;
use crate::domain::{DailyActivity, EstimationCount, daily_activity, estimation_histogram};

/// Per-day completion and due-date counts.
///
/// # Response
///
/// - **200 OK**: `{ "completedPerDay": [{ "date", "count" }], "dueDatePerDay": [...] }`
pub async fn analytics(State(state): State<AppState>) -> Json<DailyActivity> {
    let activity = daily_activity(state.store.tasks());
    tracing::debug!(days = activity.due_date_per_day.len(), "analytics computed");
    Json(activity)
}

/// Task counts per estimated-hours bucket.
///
/// # Response
///
/// - **200 OK**: `[{ "name": "0-3", "value": 4 }, ...]`
pub async fn estimation_hours(State(state): State<AppState>) -> Json<Vec<EstimationCount>> {
    let histogram = estimation_histogram(state.store.tasks());
    tracing::debug!(buckets = histogram.len(), "estimation histogram computed");
    Json(histogram)
}
