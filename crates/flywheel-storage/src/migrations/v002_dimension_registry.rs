//! v002: optional dimension registry.
//!
//! Rows here extend the built-in known-dimension list the miner filters
//! against. Projection handlers register their dimensions as they deploy.

use rusqlite::Connection;

use flywheel_core::errors::FlywheelResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> FlywheelResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS dimension_registry (
            dimension   TEXT PRIMARY KEY,
            value_type  TEXT NOT NULL,
            unit        TEXT,
            registered_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
