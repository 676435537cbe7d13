//! Task Tracker API Library
//!
//! This library provides the task store, the paginated query engine, the
//! dashboard analytics, the axum HTTP surface, and the client-side
//! infinite-scroll session that consumes it.

pub mod api;
pub mod client;
pub mod domain;
pub mod infrastructure;
