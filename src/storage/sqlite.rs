//! SQLite storage implementation
//!
//! One row per source. The value list is stored as a JSON array.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{SourceSnapshot, SourceStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SELECT_COLUMNS: &str =
    "SELECT source_id, last_value, previous_last_value, latest_values, flag_url, updated_at FROM sources";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

struct RawRow {
    source_id: String,
    last_value: Option<String>,
    previous_last_value: Option<String>,
    latest_values: String,
    flag_url: Option<String>,
    updated_at: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            source_id: row.get(0)?,
            last_value: row.get(1)?,
            previous_last_value: row.get(2)?,
            latest_values: row.get(3)?,
            flag_url: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_snapshot(self) -> StorageResult<SourceSnapshot> {
        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map_err(|_| StorageError::InvalidTimestamp(self.updated_at.clone()))?
            .with_timezone(&Utc);

        Ok(SourceSnapshot {
            source_id: self.source_id,
            last_value: self.last_value,
            previous_last_value: self.previous_last_value,
            latest_values: serde_json::from_str(&self.latest_values)?,
            flag_url: self.flag_url,
            updated_at: Some(updated_at),
        })
    }
}

impl SourceStore for SqliteStore {
    fn save(&mut self, snapshot: &SourceSnapshot) -> StorageResult<()> {
        let latest_values = serde_json::to_string(&snapshot.latest_values)?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO sources (source_id, last_value, previous_last_value, latest_values, flag_url, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(source_id) DO UPDATE SET
                last_value = excluded.last_value,
                previous_last_value = excluded.previous_last_value,
                latest_values = excluded.latest_values,
                flag_url = excluded.flag_url,
                updated_at = excluded.updated_at",
            params![
                snapshot.source_id,
                snapshot.last_value,
                snapshot.previous_last_value,
                latest_values,
                snapshot.flag_url,
                now,
            ],
        )?;
        Ok(())
    }

    fn load(&self, source_id: &str) -> StorageResult<Option<SourceSnapshot>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE source_id = ?1", SELECT_COLUMNS))?;

        let raw = stmt
            .query_row(params![source_id], RawRow::from_row)
            .optional()?;

        raw.map(RawRow::into_snapshot).transpose()
    }

    fn load_all(&self) -> StorageResult<Vec<SourceSnapshot>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY source_id", SELECT_COLUMNS))?;

        let rows = stmt.query_map([], RawRow::from_row)?;

        let mut snapshots = Vec::new();
        for raw in rows {
            snapshots.push(raw?.into_snapshot()?);
        }
        Ok(snapshots)
    }
}
