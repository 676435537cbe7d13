//! Read-only task store.
//!
//! The store is populated once at startup, either from the dataset bundled
//! into the binary or from a JSON file, and is then shared behind an `Arc`.
//! It is passed explicitly to the query engine and the analytics functions
//! rather than living in a global.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{TaskId, TaskRecord};

/// Dataset compiled into the binary.
const BUNDLED_DATASET: &str = include_str!("../../data/tasks.json");

// =============================================================================
// Store Error
// =============================================================================

/// Errors that can occur while loading the task store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The dataset file could not be read.
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The dataset is not valid JSON of the expected shape.
    #[error("Invalid dataset: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two records share an identifier.
    #[error("Duplicate task id in dataset: {0}")]
    DuplicateId(TaskId),
}

// =============================================================================
// Dataset
// =============================================================================

/// On-disk shape of the dataset: `{ "tasks": [...] }`.
#[derive(Debug, Deserialize)]
struct Dataset {
    tasks: Vec<TaskRecord>,
}

// =============================================================================
// Task Store
// =============================================================================

/// Immutable collection of task records in their natural (dataset) order.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<[TaskRecord]>,
}

impl TaskStore {
    /// Builds a store from records, rejecting duplicate identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if two records share an id.
    pub fn new(tasks: Vec<TaskRecord>) -> Result<Self, StoreError> {
        let mut seen = HashSet::with_capacity(tasks.len());
        if let Some(duplicate) = tasks.iter().find(|task| !seen.insert(task.id)) {
            return Err(StoreError::DuplicateId(duplicate.id));
        }

        Ok(Self {
            tasks: tasks.into(),
        })
    }

    /// Builds an empty store.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a store from dataset JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Parse`] for malformed JSON and
    /// [`StoreError::DuplicateId`] for repeated identifiers.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let dataset: Dataset = serde_json::from_str(json)?;
        Self::new(dataset.tasks)
    }

    /// Loads a store from a dataset file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`TaskStore::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Loads the dataset bundled into the binary.
    ///
    /// # Errors
    ///
    /// Fails only if the bundled dataset itself is invalid.
    pub fn bundled() -> Result<Self, StoreError> {
        Self::from_json_str(BUNDLED_DATASET)
    }

    /// Returns all records in natural order.
    #[must_use]
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
