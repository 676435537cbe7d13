//! Client-side result cache for infinite scrolling.
//!
//! The cache has one slot per endpoint name, so every `getTasks` query,
//! whatever its parameters, shares a single accumulated list. Incoming pages
//! are merged by `currentPage` alone:
//!
//! - page 1 replaces the slot
//! - any other page is appended, and the pagination metadata is overwritten
//!
//! The merge neither reorders nor deduplicates; the query controller makes
//! sure only the response for the current query ever reaches it.

use std::collections::HashMap;

use crate::domain::{QueryResult, QuerySpec};

/// Cache slot name for `GET /tasks`.
pub const GET_TASKS_ENDPOINT: &str = "getTasks";

// =============================================================================
// Refetch Policy
// =============================================================================

/// Decides whether a request differs enough from the previous one to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefetchPolicy {
    /// Compares `page`, `filters`, `sortBy`, and `search`; a change of
    /// `sortOrder` alone is served from the cache.
    Reference,
    /// Compares the whole query, including `sortOrder`.
    #[default]
    IncludeSortOrder,
}

impl RefetchPolicy {
    /// Returns true if `current` must be fetched given the `previous` request.
    #[must_use]
    pub fn should_refetch(self, previous: Option<&QuerySpec>, current: &QuerySpec) -> bool {
        let Some(previous) = previous else {
            return true;
        };

        let reference_differs = previous.page() != current.page()
            || previous.filters != current.filters
            || previous.sort_by != current.sort_by
            || previous.active_search() != current.active_search();

        match self {
            Self::Reference => reference_differs,
            Self::IncludeSortOrder => {
                reference_differs
                    || previous.sort_order != current.sort_order
                    || previous.limit() != current.limit()
            }
        }
    }
}

// =============================================================================
// Result Cache
// =============================================================================

#[derive(Debug, Clone)]
struct CacheSlot {
    args: QuerySpec,
    value: QueryResult,
}

/// Accumulated query results keyed by endpoint name.
#[derive(Debug, Clone, Default)]
pub struct ResultCache {
    policy: RefetchPolicy,
    slots: HashMap<&'static str, CacheSlot>,
}

impl ResultCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(policy: RefetchPolicy) -> Self {
        Self {
            policy,
            slots: HashMap::new(),
        }
    }

    /// Returns the refetch policy.
    #[must_use]
    pub const fn policy(&self) -> RefetchPolicy {
        self.policy
    }

    /// Returns the accumulated value for `endpoint`.
    #[must_use]
    pub fn get(&self, endpoint: &str) -> Option<&QueryResult> {
        self.slots.get(endpoint).map(|slot| &slot.value)
    }

    /// Returns the arguments of the last merged request for `endpoint`.
    #[must_use]
    pub fn last_args(&self, endpoint: &str) -> Option<&QuerySpec> {
        self.slots.get(endpoint).map(|slot| &slot.args)
    }

    /// Returns true if `spec` must be fetched rather than served from the slot.
    #[must_use]
    pub fn should_refetch(&self, endpoint: &str, spec: &QuerySpec) -> bool {
        self.policy.should_refetch(self.last_args(endpoint), spec)
    }

    /// Merges an incoming page into the slot and returns the merged value.
    pub fn merge(
        &mut self,
        endpoint: &'static str,
        args: QuerySpec,
        incoming: QueryResult,
    ) -> &QueryResult {
        let slot = match self.slots.remove(endpoint) {
            Some(mut slot) if incoming.current_page != 1 => {
                slot.value.data.extend(incoming.data);
                slot.value.total = incoming.total;
                slot.value.total_pages = incoming.total_pages;
                slot.value.current_page = incoming.current_page;
                slot.args = args;
                slot
            }
            _ => CacheSlot {
                args,
                value: incoming,
            },
        };

        tracing::debug!(
            endpoint,
            page = slot.value.current_page,
            cached = slot.value.data.len(),
            "merged page into cache"
        );

        let slot = self.slots.entry(endpoint).insert_entry(slot).into_mut();
        &slot.value
    }

    /// Drops the slot for `endpoint`.
    pub fn invalidate(&mut self, endpoint: &str) {
        self.slots.remove(endpoint);
    }
}

// =============================================================================
// Tests
// =============================================================================
