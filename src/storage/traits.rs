//! Storage traits and error types
//!
//! This module defines the trait interface for persisting the last known
//! state of each source, and the associated error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persisted state of one source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSnapshot {
    pub source_id: String,
    pub last_value: Option<String>,
    pub previous_last_value: Option<String>,
    /// Newest first; empty for single-value sources
    pub latest_values: Vec<String>,
    pub flag_url: Option<String>,
    /// Set by the store on save
    pub updated_at: Option<DateTime<Utc>>,
}

impl SourceSnapshot {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            last_value: None,
            previous_last_value: None,
            latest_values: Vec::new(),
            flag_url: None,
            updated_at: None,
        }
    }
}

/// Trait for storage backend implementations
///
/// Saves are synchronous and expected to be cheap. Callers treat a failed
/// save as logged and final; there is no rollback.
pub trait SourceStore: Send {
    /// Inserts or replaces the snapshot for `snapshot.source_id`
    fn save(&mut self, snapshot: &SourceSnapshot) -> StorageResult<()>;

    /// Loads the snapshot for one source, if it was ever saved
    fn load(&self, source_id: &str) -> StorageResult<Option<SourceSnapshot>>;

    /// Loads every saved snapshot, ordered by source id
    fn load_all(&self) -> StorageResult<Vec<SourceSnapshot>>;
}
