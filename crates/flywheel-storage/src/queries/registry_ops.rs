//! dimension_registry reads for the unknown-dimension miner.

use rusqlite::Connection;

use flywheel_core::errors::FlywheelResult;

use crate::engine::table_exists;
use crate::to_storage_err;

/// Dimensions registered by projection handlers. The table is optional
/// (deploy-order independence); absence means the built-in list alone.
pub fn registered_dimensions(conn: &Connection) -> FlywheelResult<Vec<String>> {
    if !table_exists(conn, "dimension_registry")? {
        return Ok(Vec::new());
    }

    let mut stmt = conn
        .prepare("SELECT dimension FROM dimension_registry ORDER BY dimension ASC")
        .map_err(|e| to_storage_err(format!("registered_dimensions prepare: {e}")))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(format!("registered_dimensions query: {e}")))?;

    let mut dimensions = Vec::new();
    for row in rows {
        dimensions.push(row.map_err(|e| to_storage_err(format!("registered_dimensions row: {e}")))?);
    }
    Ok(dimensions)
}
