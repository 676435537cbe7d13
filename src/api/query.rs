//! `GET /tasks` handler and query-parameter coercion.
//!
//! Raw parameters are accepted as strings so that malformed values never
//! reject the request. [`ListTasksParams::into_spec`] coerces them:
//!
//! - `page`: missing, non-numeric, zero or negative -> 1
//! - `limit`: missing, non-numeric, zero or negative -> default page size;
//!   larger than the maximum -> clamped
//! - `sortBy`: unknown -> no sort
//! - `sortOrder`: unknown -> `asc`
//! - repeated keys: the first occurrence wins

use std::num::NonZeroU32;

use axum::{
    Json,
    extract::{Query, State},
};
use super::handlers::AppState;
use crate::domain::{QueryResult, QuerySpec, SortField, SortOrder, TaskFilters, execute};
use crate::infrastructure::PageSizeLimits;

// =============================================================================
// Query Parameters
// =============================================================================

/// Raw query parameters for `GET /tasks`.
#[derive(Debug, Clone, Default)]
pub struct ListTasksParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
}

impl ListTasksParams {
    /// Collects parameters from raw query pairs.
    ///
    /// The first value of a repeated key is kept. Unknown keys are ignored.
    #[must_use]
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                "name" => &mut params.name,
                "description" => &mut params.description,
                "assignee" => &mut params.assignee,
                "status" => &mut params.status,
                "dueDate" => &mut params.due_date,
                "sortBy" => &mut params.sort_by,
                "sortOrder" => &mut params.sort_order,
                "search" => &mut params.search,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    /// Coerces the raw parameters into a valid [`QuerySpec`].
    #[must_use]
    pub fn into_spec(self, limits: PageSizeLimits) -> QuerySpec {
        let page = parse_positive(self.page.as_deref()).unwrap_or(NonZeroU32::MIN);
        let limit = parse_positive(self.limit.as_deref())
            .map(|limit| limit.min(non_zero_or_min(limits.max_page_size)))
            .unwrap_or_else(|| non_zero_or_min(limits.default_page_size));

        let sort_by = self.sort_by.as_deref().and_then(SortField::parse);
        let sort_order = self
            .sort_order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or_default();

        let filters = TaskFilters {
            name: self.name,
            description: self.description,
            assignee: self.assignee,
            status: self.status,
            due_date: self.due_date,
        };

        let spec = QuerySpec::from_parts(page, limit)
            .with_filters(filters)
            .with_sort(sort_by, sort_order);

        match self.search {
            Some(search) => spec.with_search(search),
            None => spec,
        }
    }
}

/// Parses a strictly positive integer. Anything else yields `None`.
fn parse_positive(raw: Option<&str>) -> Option<NonZeroU32> {
    raw.map(str::trim)
        .and_then(|value| value.parse::<u64>().ok())
        .and_then(|value| NonZeroU32::new(u32::try_from(value).unwrap_or(u32::MAX)))
}

fn non_zero_or_min(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

// =============================================================================
// GET /tasks Handler
// =============================================================================

/// Lists tasks with search, filtering, sorting, and pagination.
///
/// # Query Parameters
///
/// - `page`, `limit`: pagination (defaults 1 and 10)
/// - `name`, `description`, `assignee`, `status`: case-insensitive substring filters
/// - `dueDate`: exact `YYYY-MM-DD` filter
/// - `sortBy`: `createdAt` | `dueDate`
/// - `sortOrder`: `asc` | `desc`
/// - `search`: case-insensitive match on name or description
///
/// # Response
///
/// - **200 OK**: `{ "data": [...], "total", "totalPages", "currentPage" }`
///
/// Malformed or repeated parameters are coerced, never rejected.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<QueryResult> {
    let spec = ListTasksParams::from_pairs(pairs).into_spec(state.page_size);
    tracing::debug!(
        page = spec.page(),
        limit = spec.limit(),
        sort_by = spec.sort_by.map(SortField::as_str),
        sort_order = spec.sort_order.as_str(),
        search = spec.active_search(),
        "listing tasks"
    );

    let result = execute(&state.store, &spec);
    tracing::debug!(total = result.total, returned = result.data.len(), "tasks listed");

    Json(result)
}

// =============================================================================
// Tests
// =============================================================================
