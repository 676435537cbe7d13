//! Dashboard analytics over the task store.
//!
//! Two views are derived from the full store:
//!
//! - [`daily_activity`]: completions and due dates per calendar day,
//!   zero-filled over the whole date range
//! - [`estimation_histogram`]: task counts per estimated-hours bucket

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::task::{TaskRecord, parse_calendar_date};

// =============================================================================
// Daily Activity
// =============================================================================

/// Count of tasks on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Number of tasks.
    pub count: u64,
}

/// Per-day completion and due-date series.
///
/// Both series cover the same days in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    /// Tasks completed on each day.
    pub completed_per_day: Vec<DailyCount>,
    /// Tasks due on each day.
    pub due_date_per_day: Vec<DailyCount>,
}

/// Computes completions and due dates per day.
///
/// The range spans the earliest to the latest date among all due dates and
/// completion dates. Dates that do not parse are ignored.
#[must_use]
pub fn daily_activity(tasks: &[TaskRecord]) -> DailyActivity {
    let due_dates: Vec<NaiveDate> = tasks
        .iter()
        .filter_map(|task| parse_calendar_date(&task.due_date))
        .collect();
    let completion_dates: Vec<NaiveDate> = tasks
        .iter()
        .filter(|task| task.status.is_completed())
        .filter_map(|task| task.completed_on().and_then(parse_calendar_date))
        .collect();
    let all_completion_dates = tasks
        .iter()
        .filter_map(|task| task.completed_on().and_then(parse_calendar_date));

    let bounds = due_dates
        .iter()
        .copied()
        .chain(all_completion_dates)
        .fold(None, |bounds: Option<(NaiveDate, NaiveDate)>, date| {
            Some(bounds.map_or((date, date), |(first, last)| {
                (first.min(date), last.max(date))
            }))
        });

    let Some((first, last)) = bounds else {
        return DailyActivity::default();
    };

    DailyActivity {
        completed_per_day: zero_filled(first, last, &completion_dates),
        due_date_per_day: zero_filled(first, last, &due_dates),
    }
}

fn zero_filled(first: NaiveDate, last: NaiveDate, dates: &[NaiveDate]) -> Vec<DailyCount> {
    let mut counts: BTreeMap<NaiveDate, u64> = first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| (day, 0))
        .collect();

    for date in dates {
        if let Some(count) = counts.get_mut(date) {
            *count += 1;
        }
    }

    counts
        .into_iter()
        .map(|(date, count)| DailyCount {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

// =============================================================================
// Estimation Histogram
// =============================================================================

/// Estimated-hours bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EstimationBucket {
    UpToThree,
    FourToSix,
    SevenToNine,
    TenOrMore,
}

impl EstimationBucket {
    /// All buckets in display order.
    pub const ALL: [Self; 4] = [
        Self::UpToThree,
        Self::FourToSix,
        Self::SevenToNine,
        Self::TenOrMore,
    ];

    /// Buckets an estimate; a missing estimate counts as zero hours.
    #[must_use]
    pub fn for_hours(hours: Option<f64>) -> Self {
        let hours = hours.unwrap_or(0.0);
        if hours <= 3.0 {
            Self::UpToThree
        } else if hours <= 6.0 {
            Self::FourToSix
        } else if hours <= 9.0 {
            Self::SevenToNine
        } else {
            Self::TenOrMore
        }
    }

    /// Returns the display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UpToThree => "0-3",
            Self::FourToSix => "4-6",
            Self::SevenToNine => "7-9",
            Self::TenOrMore => "10+",
        }
    }
}

/// One histogram bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationCount {
    /// Bucket label.
    pub name: String,
    /// Number of tasks in the bucket.
    pub value: u64,
}

/// Counts tasks per estimated-hours bucket, omitting empty buckets.
#[must_use]
pub fn estimation_histogram(tasks: &[TaskRecord]) -> Vec<EstimationCount> {
    let mut counts: BTreeMap<EstimationBucket, u64> = BTreeMap::new();
    for task in tasks {
        *counts
            .entry(EstimationBucket::for_hours(task.estimated_hours))
            .or_default() += 1;
    }

    EstimationBucket::ALL
        .into_iter()
        .filter_map(|bucket| {
            counts.get(&bucket).map(|value| EstimationCount {
                name: bucket.label().to_string(),
                value: *value,
            })
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
