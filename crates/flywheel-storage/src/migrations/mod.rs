//! Versioned migrations, tracked via `PRAGMA user_version`.

mod v001_pipeline_tables;
mod v002_dimension_registry;

use rusqlite::Connection;
use tracing::info;

use flywheel_core::errors::{FlywheelError, FlywheelResult, StorageError};

use crate::to_storage_err;

const CURRENT_VERSION: u32 = 2;

/// Run all pending migrations. Idempotent; safe to call at every open.
pub fn run_migrations(conn: &Connection) -> FlywheelResult<()> {
    let mut version = user_version(conn)?;
    if version >= CURRENT_VERSION {
        return Ok(());
    }

    while version < CURRENT_VERSION {
        let next = version + 1;
        let result = match next {
            1 => v001_pipeline_tables::migrate(conn),
            2 => v002_dimension_registry::migrate(conn),
            _ => Ok(()),
        };
        result.map_err(|e| {
            FlywheelError::Storage(StorageError::MigrationFailed {
                version: next,
                reason: e.to_string(),
            })
        })?;
        set_user_version(conn, next)?;
        info!(version = next, "migration applied");
        version = next;
    }
    Ok(())
}

fn user_version(conn: &Connection) -> FlywheelResult<u32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| to_storage_err(format!("user_version: {e}")))
}

fn set_user_version(conn: &Connection, version: u32) -> FlywheelResult<()> {
    conn.pragma_update(None, "user_version", version)
        .map_err(|e| to_storage_err(format!("set user_version: {e}")))
}
