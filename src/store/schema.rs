use rusqlite::Connection;

use crate::error::Result;

/// Tables are created idempotently on every open.
///
/// Station uniqueness is not a table constraint; it is enforced by the
/// conditional insert in `FileTransaction::get_or_create_station`.
pub const SCHEMA_SQL: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS stations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    state TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_stations_name_state ON stations (name, state);

CREATE TABLE IF NOT EXISTS observations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    station_id INTEGER NOT NULL REFERENCES stations (id),
    date INTEGER NOT NULL CHECK (date BETWEEN 19850101 AND 20141231),
    max_temp REAL,
    min_temp REAL,
    precipitation REAL,
    UNIQUE (station_id, date)
);

CREATE TABLE IF NOT EXISTS processed_files (
    filename TEXT PRIMARY KEY,
    processed_at TEXT
);
"#;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
