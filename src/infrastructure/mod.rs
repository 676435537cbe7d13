//! Infrastructure module for data loading and configuration.

pub mod config;
pub mod store;

pub use config::{
    ConfigurationError, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageSizeLimits, ServerConfig,
};
pub use store::{StoreError, TaskStore};
