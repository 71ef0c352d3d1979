//! StorageEngine — owns the connection, runs migrations at open, exposes
//! scoped access and the table-existence check backing deploy-order
//! independence.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use flywheel_core::errors::{FlywheelError, FlywheelResult, StorageError};
use flywheel_core::models::EventRow;
use flywheel_core::traits::EventSource;

use crate::pragmas;
use crate::{migrations, to_storage_err};

/// The storage engine. One write connection behind a mutex; the pipeline is
/// a sequential nightly batch, so there is no read-pool contention to manage.
pub struct StorageEngine {
    conn: Mutex<Connection>,
}

impl StorageEngine {
    /// Open a storage engine backed by a file on disk.
    pub fn open(path: &Path) -> FlywheelResult<Self> {
        let conn = Connection::open(path).map_err(|e| {
            FlywheelError::Storage(StorageError::Unavailable {
                details: format!("open {}: {e}", path.display()),
            })
        })?;
        let engine = Self {
            conn: Mutex::new(conn),
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Open an in-memory storage engine (for testing).
    pub fn open_in_memory() -> FlywheelResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            FlywheelError::Storage(StorageError::Unavailable {
                details: format!("open_in_memory: {e}"),
            })
        })?;
        let engine = Self {
            conn: Mutex::new(conn),
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> FlywheelResult<()> {
        self.with_conn(|conn| {
            pragmas::apply_pragmas(conn)?;
            migrations::run_migrations(conn)
        })
    }

    /// Run a closure against the connection.
    pub fn with_conn<F, T>(&self, f: F) -> FlywheelResult<T>
    where
        F: FnOnce(&Connection) -> FlywheelResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| to_storage_err("connection mutex poisoned"))?;
        f(&conn)
    }
}

/// Check whether a table exists. Phases look up their input and output tables
/// and degrade to a `skipped` outcome when one is missing, so the pipeline
/// can be deployed before or after its collaborators.
pub fn table_exists(conn: &Connection, name: &str) -> FlywheelResult<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(format!("table_exists {name}: {e}")))?;
    Ok(count > 0)
}

impl EventSource for StorageEngine {
    fn events_by_type(
        &self,
        event_type: &str,
        since: DateTime<Utc>,
    ) -> FlywheelResult<Vec<EventRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT event_id, event_type, occurred_at, data
                     FROM events
                     WHERE event_type = ?1 AND occurred_at >= ?2
                     ORDER BY occurred_at ASC, event_id ASC",
                )
                .map_err(|e| to_storage_err(format!("events_by_type prepare: {e}")))?;
            let rows = stmt
                .query_map(
                    rusqlite::params![event_type, since.to_rfc3339()],
                    |row| {
                        let data: String = row.get(3)?;
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            data,
                        ))
                    },
                )
                .map_err(|e| to_storage_err(format!("events_by_type query: {e}")))?;

            let mut events = Vec::new();
            for row in rows {
                let (event_id, event_type, occurred_at, data) =
                    row.map_err(|e| to_storage_err(format!("events_by_type row: {e}")))?;
                let data = serde_json::from_str(&data).unwrap_or(serde_json::Value::Null);
                events.push(EventRow {
                    event_id,
                    event_type,
                    occurred_at,
                    data,
                });
            }
            Ok(events)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_runs_migrations() {
        let engine = StorageEngine::open_in_memory().unwrap();
        let exists = engine
            .with_conn(|conn| table_exists(conn, "learning_backlog_candidates"))
            .unwrap();
        assert!(exists);
    }

    #[test]
    fn events_table_is_not_owned_by_this_pipeline() {
        let engine = StorageEngine::open_in_memory().unwrap();
        let exists = engine.with_conn(|conn| table_exists(conn, "events")).unwrap();
        assert!(!exists, "the event store belongs to the ingestion collaborator");
    }
}
