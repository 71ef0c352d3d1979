//! learning_pipeline_runs: append-only audit rows, one per phase per run.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use flywheel_core::errors::FlywheelResult;
use flywheel_core::models::PhaseOutcome;

use crate::to_storage_err;

/// Record one phase outcome. Written for every phase regardless of status,
/// so a missed or partial run is always auditable after the fact.
pub fn record_phase(
    conn: &Connection,
    run_id: &str,
    outcome: &PhaseOutcome,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> FlywheelResult<()> {
    let details = serde_json::to_string(&outcome.details)?;
    conn.execute(
        "INSERT INTO learning_pipeline_runs (
            run_id, phase, status, details, started_at, finished_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            run_id,
            outcome.phase.as_str(),
            outcome.status.as_str(),
            details,
            started_at.to_rfc3339(),
            finished_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(format!("record_phase: {e}")))?;
    Ok(())
}

/// Audit rows for one run, in insertion order. Test and debugging helper.
pub fn phases_for_run(
    conn: &Connection,
    run_id: &str,
) -> FlywheelResult<Vec<(String, String, String)>> {
    let mut stmt = conn
        .prepare(
            "SELECT phase, status, details FROM learning_pipeline_runs
             WHERE run_id = ?1 ORDER BY id ASC",
        )
        .map_err(|e| to_storage_err(format!("phases_for_run prepare: {e}")))?;
    let rows = stmt
        .query_map([run_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .map_err(|e| to_storage_err(format!("phases_for_run query: {e}")))?;

    let mut phases = Vec::new();
    for row in rows {
        phases.push(row.map_err(|e| to_storage_err(format!("phases_for_run row: {e}")))?);
    }
    Ok(phases)
}
