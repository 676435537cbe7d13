//! Task query engine.
//!
//! [`execute`] turns a [`QuerySpec`] into one page of results over a
//! [`TaskStore`]. The pipeline runs in a fixed order on every call:
//!
//! 1. **Search**: case-insensitive substring over `name` or `description`
//! 2. **Filter**: every non-empty [`TaskFilters`] entry must match (logical AND)
//! 3. **Sort**: stable sort on the epoch-millisecond key of [`SortField`]
//! 4. **Paginate**: `[(page - 1) * limit, page * limit)`
//!
//! The engine holds no state and borrows the store, so it can be called
//! concurrently from any number of request handlers.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::task::{TaskRecord, parse_epoch_millis};
use crate::infrastructure::TaskStore;

// =============================================================================
// Query Error
// =============================================================================

/// Errors for query specifications the engine cannot accept.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    /// Pages are 1-based.
    #[error("page must be at least 1")]
    InvalidPage,

    /// Page size must be positive.
    #[error("limit must be at least 1")]
    InvalidLimit,
}

// =============================================================================
// Sorting
// =============================================================================

/// Fields a query may order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Order by `createdAt`.
    CreatedAt,
    /// Order by `dueDate`.
    DueDate,
}

impl SortField {
    /// Returns the query-parameter form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::DueDate => "dueDate",
        }
    }

    /// Parses the query-parameter form; unknown names yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(Self::CreatedAt),
            "dueDate" => Some(Self::DueDate),
            _ => None,
        }
    }

    /// Derives the sort key of a record.
    ///
    /// Un-parseable dates map to epoch 0, which keeps the ordering total.
    #[must_use]
    pub fn key(self, task: &TaskRecord) -> i64 {
        let raw = match self {
            Self::CreatedAt => &task.created_at,
            Self::DueDate => &task.due_date,
        };
        parse_epoch_millis(raw).unwrap_or(0)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest key first.
    #[default]
    Asc,
    /// Largest key first.
    Desc,
}

impl SortOrder {
    /// Returns the query-parameter form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Parses the query-parameter form; unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Filterable fields, each with its own matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Name,
    Description,
    Assignee,
    Status,
    DueDate,
}

impl FilterField {
    /// Every filterable field, in query-parameter order.
    pub const ALL: [Self; 5] = [
        Self::Name,
        Self::Description,
        Self::Assignee,
        Self::Status,
        Self::DueDate,
    ];

    /// Returns the query-parameter name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Assignee => "assignee",
            Self::Status => "status",
            Self::DueDate => "dueDate",
        }
    }

    /// Tests `task` against a non-empty, already-lowercased needle.
    ///
    /// `dueDate` is compared exactly against the raw (not lowercased) value,
    /// which the caller passes through unchanged.
    fn matches(self, task: &TaskRecord, needle: &str) -> bool {
        match self {
            Self::Name => contains_lowercase(&task.name, needle),
            Self::Description => contains_lowercase(&task.description, needle),
            Self::Assignee => contains_lowercase(task.assignee.as_deref().unwrap_or(""), needle),
            Self::Status => contains_lowercase(task.status.as_str(), needle),
            Self::DueDate => task.due_date == needle,
        }
    }

    /// Prepares a raw filter value for [`FilterField::matches`].
    fn prepare(self, raw: &str) -> String {
        match self {
            Self::DueDate => raw.to_string(),
            _ => raw.to_lowercase(),
        }
    }
}

/// Sparse set of per-field filters. `None` and empty strings impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl TaskFilters {
    /// Returns the raw value for `field`.
    #[must_use]
    pub fn get(&self, field: FilterField) -> Option<&str> {
        let value = match field {
            FilterField::Name => &self.name,
            FilterField::Description => &self.description,
            FilterField::Assignee => &self.assignee,
            FilterField::Status => &self.status,
            FilterField::DueDate => &self.due_date,
        };
        value.as_deref()
    }

    /// Returns the filters with `field` set to `value`.
    #[must_use]
    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            FilterField::Name => self.name = value,
            FilterField::Description => self.description = value,
            FilterField::Assignee => self.assignee = value,
            FilterField::Status => self.status = value,
            FilterField::DueDate => self.due_date = value,
        }
        self
    }

    /// Iterates over the filters that actually constrain the result.
    pub fn active(&self) -> impl Iterator<Item = (FilterField, &str)> {
        FilterField::ALL.into_iter().filter_map(|field| {
            self.get(field)
                .filter(|value| !value.is_empty())
                .map(|value| (field, value))
        })
    }

    /// Returns true if no filter constrains the result.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }
}

fn contains_lowercase(haystack: &str, lowercase_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_needle)
}

// =============================================================================
// Query Specification
// =============================================================================

/// Parameters describing one page request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    page: NonZeroU32,
    limit: NonZeroU32,
    /// Per-field filters.
    #[serde(default)]
    pub filters: TaskFilters,
    /// Optional sort field; `None` keeps natural store order.
    #[serde(default)]
    pub sort_by: Option<SortField>,
    /// Sort direction, ignored without `sort_by`.
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Free-text search over name and description.
    #[serde(default)]
    pub search: Option<String>,
}

impl QuerySpec {
    /// Creates a spec for `page` (1-based) of size `limit`, with no filters.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidPage`] for `page == 0` and
    /// [`QueryError::InvalidLimit`] for `limit == 0`.
    pub fn new(page: u32, limit: u32) -> Result<Self, QueryError> {
        let page = NonZeroU32::new(page).ok_or(QueryError::InvalidPage)?;
        let limit = NonZeroU32::new(limit).ok_or(QueryError::InvalidLimit)?;
        Ok(Self::from_parts(page, limit))
    }

    /// Creates a spec from already-validated page and limit.
    #[must_use]
    pub fn from_parts(page: NonZeroU32, limit: NonZeroU32) -> Self {
        Self {
            page,
            limit,
            filters: TaskFilters::default(),
            sort_by: None,
            sort_order: SortOrder::Asc,
            search: None,
        }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page.get()
    }

    /// Page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit.get()
    }

    /// Returns the spec moved to another page.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidPage`] for `page == 0`.
    pub fn with_page(self, page: u32) -> Result<Self, QueryError> {
        let page = NonZeroU32::new(page).ok_or(QueryError::InvalidPage)?;
        Ok(Self { page, ..self })
    }

    /// Returns the spec with the given filters.
    #[must_use]
    pub fn with_filters(self, filters: TaskFilters) -> Self {
        Self { filters, ..self }
    }

    /// Returns the spec ordered by `field` in `order`.
    #[must_use]
    pub fn with_sort(self, field: Option<SortField>, order: SortOrder) -> Self {
        Self {
            sort_by: field,
            sort_order: order,
            ..self
        }
    }

    /// Returns the spec with a free-text search.
    #[must_use]
    pub fn with_search(self, search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..self
        }
    }

    /// Returns the search term if it is non-empty.
    #[must_use]
    pub fn active_search(&self) -> Option<&str> {
        self.search.as_deref().filter(|search| !search.is_empty())
    }

    /// Query-string pairs in the wire format of `GET /tasks`.
    ///
    /// Absent and empty values are omitted.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page().to_string()),
            ("limit", self.limit().to_string()),
        ];
        pairs.extend(
            self.filters
                .active()
                .map(|(field, value)| (field.as_str(), value.to_string())),
        );
        if let Some(field) = self.sort_by {
            pairs.push(("sortBy", field.as_str().to_string()));
        }
        pairs.push(("sortOrder", self.sort_order.as_str().to_string()));
        if let Some(search) = self.active_search() {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

// =============================================================================
// Query Result
// =============================================================================

/// One page of query results with pagination metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Records on this page.
    pub data: Vec<TaskRecord>,
    /// Records matching search and filters, before pagination.
    pub total: u64,
    /// `ceil(total / limit)`, 0 when `total` is 0.
    pub total_pages: u64,
    /// Echo of the requested page.
    pub current_page: u32,
}

impl QueryResult {
    /// Returns true if another page exists after this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        u64::from(self.current_page) < self.total_pages
    }
}

/// Number of pages needed for `total` records at `limit` per page.
#[must_use]
pub fn total_pages(total: u64, limit: NonZeroU32) -> u64 {
    total.div_ceil(u64::from(limit.get()))
}

// =============================================================================
// Engine
// =============================================================================

/// Runs `spec` against `store`.
#[must_use]
pub fn execute(store: &TaskStore, spec: &QuerySpec) -> QueryResult {
    let search = spec.active_search().map(str::to_lowercase);
    let filters: Vec<(FilterField, String)> = spec
        .filters
        .active()
        .map(|(field, value)| (field, field.prepare(value)))
        .collect();

    let mut matched: Vec<&TaskRecord> = store
        .tasks()
        .iter()
        .filter(|task| {
            search.as_deref().is_none_or(|needle| {
                contains_lowercase(&task.name, needle)
                    || contains_lowercase(&task.description, needle)
            })
        })
        .filter(|task| {
            filters
                .iter()
                .all(|(field, needle)| field.matches(task, needle))
        })
        .collect();

    if let Some(field) = spec.sort_by {
        match spec.sort_order {
            SortOrder::Asc => matched.sort_by_key(|task| field.key(task)),
            SortOrder::Desc => {
                matched.sort_by_key(|task| std::cmp::Reverse(field.key(task)));
            }
        }
    }

    let total = matched.len() as u64;
    let limit = spec.limit() as usize;
    let offset = (spec.page() as usize - 1).saturating_mul(limit);

    let data = matched
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    QueryResult {
        data,
        total,
        total_pages: total_pages(total, spec.limit),
        current_page: spec.page(),
    }
}

// =============================================================================
// Tests
// =============================================================================
