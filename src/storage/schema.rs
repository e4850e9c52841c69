//! Database schema definitions

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Last known state per source
CREATE TABLE IF NOT EXISTS sources (
    source_id TEXT PRIMARY KEY,
    last_value TEXT,
    previous_last_value TEXT,
    latest_values TEXT NOT NULL DEFAULT '[]',
    flag_url TEXT,
    updated_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
