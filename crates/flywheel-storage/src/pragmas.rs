//! Startup pragma configuration.

use rusqlite::Connection;

use flywheel_core::errors::FlywheelResult;

use crate::to_storage_err;

/// Apply the standard pragma set. WAL keeps readers unblocked during the
/// short write transactions each phase runs; busy_timeout covers an
/// overlapping nightly run retrying a locked write.
pub fn apply_pragmas(conn: &Connection) -> FlywheelResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .map_err(|e| to_storage_err(format!("apply_pragmas: {e}")))?;
    Ok(())
}
