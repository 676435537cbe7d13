//! Task domain model.
//!
//! Records are loaded once from the bundled dataset and never mutated, so
//! every type here is a plain immutable value. Date and timestamp fields are
//! kept in their wire (string) form; [`parse_epoch_millis`] derives the
//! numeric keys used for ordering.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a task.
///
/// Identifiers come from the dataset and are stable for the lifetime of the
/// task store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Creates a `TaskId` from its numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// The status of a task.
///
/// The wire form matches what clients display (`"In Progress"` with a space),
/// and it is also the string the `status` filter matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    /// Task has not been started yet.
    #[default]
    Pending,
    /// Task is currently being worked on.
    #[serde(rename = "In Progress")]
    InProgress,
    /// Task has been completed.
    Completed,
}

impl TaskStatus {
    /// Returns the wire form of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    /// Returns `true` if the task is completed.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// =============================================================================
// Comment
// =============================================================================

/// A comment attached to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Identifier, unique within the parent task.
    pub id: u64,
    /// Author display name.
    pub author: String,
    /// Comment body.
    pub text: String,
    /// When the comment was written.
    pub timestamp: String,
}

// =============================================================================
// TaskRecord
// =============================================================================

/// One task in the store.
///
/// `comments` is in insertion order, which is chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Unique identifier.
    pub id: TaskId,
    /// Short task name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Person responsible, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Current status.
    pub status: TaskStatus,
    /// Due date as `YYYY-MM-DD`.
    pub due_date: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Completion timestamp, only present for completed tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Estimated effort in hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    /// Long-form details shown in the detail drawer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Discussion thread.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl TaskRecord {
    /// Creates a pending task with the required fields and no optional data.
    #[must_use]
    pub fn new(
        id: u64,
        name: impl Into<String>,
        description: impl Into<String>,
        due_date: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: TaskId::new(id),
            name: name.into(),
            description: description.into(),
            assignee: None,
            status: TaskStatus::Pending,
            due_date: due_date.into(),
            created_at: created_at.into(),
            completed_at: None,
            estimated_hours: None,
            details: None,
            comments: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Builder-style methods
    // -------------------------------------------------------------------------

    /// Returns the task with the given assignee.
    #[must_use]
    pub fn with_assignee(self, assignee: impl Into<String>) -> Self {
        Self {
            assignee: Some(assignee.into()),
            ..self
        }
    }

    /// Returns the task with the given status.
    #[must_use]
    pub fn with_status(self, status: TaskStatus) -> Self {
        Self { status, ..self }
    }

    /// Returns the task marked completed at the given timestamp.
    #[must_use]
    pub fn completed(self, completed_at: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Completed,
            completed_at: Some(completed_at.into()),
            ..self
        }
    }

    /// Returns the task with the given effort estimate.
    #[must_use]
    pub fn with_estimated_hours(self, hours: f64) -> Self {
        Self {
            estimated_hours: Some(hours),
            ..self
        }
    }

    /// Returns the date part (`YYYY-MM-DD`) of `completed_at`, if present.
    #[must_use]
    pub fn completed_on(&self) -> Option<&str> {
        self.completed_at
            .as_deref()
            .map(|timestamp| timestamp.split('T').next().unwrap_or(timestamp))
    }
}

// =============================================================================
// Date Parsing
// =============================================================================

/// Parses a date or timestamp string into epoch milliseconds.
///
/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS[.fff]` timestamps
/// (read as UTC), and bare `YYYY-MM-DD` dates (midnight UTC). Returns `None`
/// for anything else.
#[must_use]
pub fn parse_epoch_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.timestamp_millis());
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc().timestamp_millis());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Parses a `YYYY-MM-DD` calendar date.
#[must_use]
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

// =============================================================================
// Tests
// =============================================================================
