//! Storage module for persisting the last known state of each source
//!
//! This module provides:
//! - The `SourceStore` trait the monitor saves through
//! - `SqliteStore`, the durable backend used by the binary
//! - `MemoryStore`, used by tests and `--dry-run`

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{SourceSnapshot, SourceStore, StorageError, StorageResult};

use std::path::Path;

/// Opens the SQLite store at the given path
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully opened storage
/// * `Err(StorageError)` - Failed to open or initialize the database
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}
