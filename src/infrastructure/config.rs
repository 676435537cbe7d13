//! Server configuration from environment variables.
//!
//! # Environment Variables
//!
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `3000`)
//! - `TASKS_DATA_PATH`: Dataset JSON file (default: the bundled dataset)
//! - `DEFAULT_PAGE_SIZE`: Page size when `limit` is missing or invalid (default: `10`)
//! - `MAX_PAGE_SIZE`: Upper clamp for `limit` (default: `100`)
//!
//! # Example
//!
//! ```ignore
//! let config = ServerConfig::from_env()?;
//! let store = config.load_store()?;
//! ```

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use super::store::{StoreError, TaskStore};

/// Default page size for `GET /tasks`.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Default upper bound for `limit`.
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// Configuration Error
// =============================================================================

/// Errors raised while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A numeric variable could not be parsed.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    /// A page size variable was zero.
    #[error("{name} must be greater than 0")]
    ZeroPageSize { name: &'static str },

    /// `DEFAULT_PAGE_SIZE` exceeds `MAX_PAGE_SIZE`.
    #[error("DEFAULT_PAGE_SIZE ({default}) exceeds MAX_PAGE_SIZE ({max})")]
    DefaultExceedsMax { default: u32, max: u32 },

    /// `HOST`/`PORT` do not form a socket address.
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),
}

// =============================================================================
// Page Size Limits
// =============================================================================

/// Page size policy applied at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizeLimits {
    /// Used when `limit` is missing, non-numeric, or not positive.
    pub default_page_size: u32,
    /// Larger `limit` values are clamped to this.
    pub max_page_size: u32,
}

impl Default for PageSizeLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Runtime configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Dataset file; `None` selects the bundled dataset.
    pub data_path: Option<PathBuf>,
    /// Page size policy.
    pub page_size: PageSizeLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            data_path: None,
            page_size: PageSizeLimits::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();

        let host = read("HOST").unwrap_or(defaults.host);
        let port = parse_number("PORT", read("PORT"), defaults.port)?;
        let data_path = read("TASKS_DATA_PATH").map(PathBuf::from);

        let default_page_size = page_size(
            "DEFAULT_PAGE_SIZE",
            read("DEFAULT_PAGE_SIZE"),
            DEFAULT_PAGE_SIZE,
        )?;
        let max_page_size = page_size("MAX_PAGE_SIZE", read("MAX_PAGE_SIZE"), MAX_PAGE_SIZE)?;

        if default_page_size > max_page_size {
            return Err(ConfigurationError::DefaultExceedsMax {
                default: default_page_size,
                max: max_page_size,
            });
        }

        Ok(Self {
            host,
            port,
            data_path,
            page_size: PageSizeLimits {
                default_page_size,
                max_page_size,
            },
        })
    }

    /// Returns the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidAddress`] if `host:port` does not parse.
    pub fn socket_address(&self) -> Result<SocketAddr, ConfigurationError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|_| ConfigurationError::InvalidAddress(address))
    }

    /// Loads the task store selected by this configuration.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the dataset loader.
    pub fn load_store(&self) -> Result<TaskStore, StoreError> {
        match &self.data_path {
            Some(path) => TaskStore::from_path(path),
            None => TaskStore::bundled(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigurationError> {
    value.map_or(Ok(default), |value| {
        value
            .parse::<T>()
            .map_err(|_| ConfigurationError::InvalidNumber { name, value })
    })
}

fn page_size(
    name: &'static str,
    value: Option<String>,
    default: u32,
) -> Result<u32, ConfigurationError> {
    match parse_number(name, value, default)? {
        0 => Err(ConfigurationError::ZeroPageSize { name }),
        size => Ok(size),
    }
}

// =============================================================================
// Tests
// =============================================================================
