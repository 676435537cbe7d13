//! Domain module for task tracking.
//!
//! This module contains the task record model, date helpers, the stateless
//! query engine, and the dashboard analytics.

pub mod analytics;
pub mod query;
pub mod task;

pub use analytics::{
    DailyActivity, DailyCount, EstimationBucket, EstimationCount, daily_activity,
    estimation_histogram,
};
pub use query::{
    FilterField, QueryError, QueryResult, QuerySpec, SortField, SortOrder, TaskFilters, execute,
    total_pages,
};
pub use task::{Comment, TaskId, TaskRecord, TaskStatus, parse_calendar_date, parse_epoch_millis};
