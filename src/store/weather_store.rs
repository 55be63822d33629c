use crate::error::{ImportError, Result};
use crate::models::{Observation, ProcessedFile, Station, StationKey};
use crate::store::schema;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Whether an observation row was written or already present for its (station, date)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

/// Row counts across the three tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub stations: u64,
    pub observations: u64,
    pub processed_files: u64,
}

/// Per-station rollup used by the `status` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationSummary {
    pub station: Station,
    pub observations: u64,
    pub first_date: Option<u32>,
    pub last_date: Option<u32>,
}

/// SQLite-backed store for stations, observations and the processed-file ledger.
///
/// Owns the single connection used by a run. Writes go through
/// [`FileTransaction`] so that everything imported from one file commits together.
pub struct WeatherStore {
    conn: Connection,
}

impl WeatherStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        debug!("Opened database {}", path.display());
        Self::from_connection(conn)
    }

    /// Open a database that must already exist; never creates the file
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ImportError::InvalidPath(format!(
                "Database does not exist: {}",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!("Opened existing database {}", path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Start the transaction that groups all writes for one input file
    pub fn begin_file(&mut self) -> Result<FileTransaction<'_>> {
        Ok(FileTransaction {
            tx: self.conn.transaction()?,
        })
    }

    pub fn is_processed(&self, filename: &str) -> Result<bool> {
        is_processed(&self.conn, filename)
    }

    pub fn processed_filenames(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT filename FROM processed_files")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(names)
    }

    pub fn processed_files(&self) -> Result<Vec<ProcessedFile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT filename, processed_at FROM processed_files ORDER BY filename")?;
        let files = stmt
            .query_map([], |row| Ok(ProcessedFile::new(row.get::<_, String>(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    pub fn find_station(&self, key: &StationKey) -> Result<Option<Station>> {
        let station = self
            .conn
            .query_row(
                "SELECT id, name, state FROM stations WHERE name = ?1 AND state = ?2 ORDER BY id LIMIT 1",
                params![key.name, key.state],
                |row| Ok(Station::new(row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        Ok(station)
    }

    pub fn observation(&self, station_id: i64, date: u32) -> Result<Option<Observation>> {
        let observation = self
            .conn
            .query_row(
                r#"
                SELECT date, max_temp, min_temp, precipitation
                FROM observations
                WHERE station_id = ?1 AND date = ?2
                "#,
                params![station_id, date],
                |row| {
                    Ok(Observation::new(
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                    ))
                },
            )
            .optional()?;
        Ok(observation)
    }

    pub fn observation_count(&self, station_id: i64) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM observations WHERE station_id = ?1",
            params![station_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn station_summaries(&self) -> Result<Vec<StationSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.name, s.state, COUNT(o.id), MIN(o.date), MAX(o.date)
            FROM stations s
            LEFT JOIN observations o ON o.station_id = s.id
            GROUP BY s.id, s.name, s.state
            ORDER BY s.state, s.name
            "#,
        )?;

        let summaries = stmt
            .query_map([], |row| {
                Ok(StationSummary {
                    station: Station::new(row.get(0)?, row.get(1)?, row.get(2)?),
                    observations: row.get::<_, i64>(3)? as u64,
                    first_date: row.get(4)?,
                    last_date: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let count = |table: &str| -> Result<u64> {
            let n: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get(0)
                    })?;
            Ok(n as u64)
        };

        Ok(StoreStats {
            stations: count("stations")?,
            observations: count("observations")?,
            processed_files: count("processed_files")?,
        })
    }
}

/// Writes for a single input file. Dropping without [`FileTransaction::commit`] rolls back.
pub struct FileTransaction<'a> {
    tx: Transaction<'a>,
}

impl FileTransaction<'_> {
    /// Return the id of the (name, state) station, creating it if absent
    pub fn get_or_create_station(&self, key: &StationKey) -> Result<i64> {
        let created = self.tx.execute(
            r#"
            INSERT INTO stations (name, state)
            SELECT ?1, ?2
            WHERE NOT EXISTS (SELECT 1 FROM stations WHERE name = ?1 AND state = ?2)
            "#,
            params![key.name, key.state],
        )?;

        if created == 1 {
            let id = self.tx.last_insert_rowid();
            debug!("Created station {} with id {}", key, id);
            return Ok(id);
        }

        let id = self.tx.query_row(
            "SELECT id FROM stations WHERE name = ?1 AND state = ?2 ORDER BY id LIMIT 1",
            params![key.name, key.state],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Insert unless an observation already exists for (station, date)
    pub fn insert_observation(
        &self,
        station_id: i64,
        observation: &Observation,
    ) -> Result<InsertOutcome> {
        let changed = self.tx.execute(
            r#"
            INSERT INTO observations (station_id, date, max_temp, min_temp, precipitation)
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE NOT EXISTS (
                SELECT 1 FROM observations WHERE station_id = ?1 AND date = ?2
            )
            "#,
            params![
                station_id,
                observation.date,
                observation.max_temp,
                observation.min_temp,
                observation.precipitation,
            ],
        )?;

        Ok(if changed == 1 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Duplicate
        })
    }

    pub fn is_processed(&self, filename: &str) -> Result<bool> {
        is_processed(&self.tx, filename)
    }

    /// Add the file to the ledger; returns false if it was already there
    pub fn mark_processed(&self, filename: &str, processed_at: &str) -> Result<bool> {
        let changed = self.tx.execute(
            "INSERT OR IGNORE INTO processed_files (filename, processed_at) VALUES (?1, ?2)",
            params![filename, processed_at],
        )?;
        Ok(changed == 1)
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn is_processed(conn: &Connection, filename: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM processed_files WHERE filename = ?1",
            params![filename],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}
