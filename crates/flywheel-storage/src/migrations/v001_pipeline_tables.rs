//! v001: all pipeline-owned tables.
//!
//! The `events` table is deliberately absent: the event store belongs to
//! the ingestion collaborator and phases check for it at runtime.

use rusqlite::Connection;

use flywheel_core::errors::FlywheelResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> FlywheelResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS learning_issue_clusters (
            period_granularity  TEXT NOT NULL,
            period_key          TEXT NOT NULL,
            cluster_signature   TEXT NOT NULL,
            score               REAL NOT NULL,
            event_count         INTEGER NOT NULL,
            unique_users        INTEGER NOT NULL,
            cluster_data        TEXT NOT NULL DEFAULT '{}',
            computed_at         TEXT NOT NULL,
            PRIMARY KEY (period_granularity, period_key, cluster_signature)
        );

        CREATE INDEX IF NOT EXISTS idx_clusters_period
            ON learning_issue_clusters(period_granularity, period_key);

        CREATE TABLE IF NOT EXISTS extraction_calibration_metrics (
            period_granularity  TEXT NOT NULL,
            period_key          TEXT NOT NULL,
            claim_class         TEXT NOT NULL,
            parser_version      TEXT NOT NULL,
            sample_count        INTEGER NOT NULL,
            correct_count       INTEGER NOT NULL,
            incorrect_count     INTEGER NOT NULL,
            brier_score         REAL NOT NULL,
            precision_high_conf REAL,
            recall_high_conf    REAL,
            status              TEXT NOT NULL,
            drift_status        TEXT NOT NULL,
            drift_delta_brier   REAL,
            computed_at         TEXT NOT NULL,
            PRIMARY KEY (period_granularity, period_key, claim_class, parser_version)
        );

        CREATE INDEX IF NOT EXISTS idx_calibration_stream
            ON extraction_calibration_metrics(claim_class, parser_version, period_granularity);

        CREATE TABLE IF NOT EXISTS extraction_underperforming_classes (
            period_granularity  TEXT NOT NULL,
            period_key          TEXT NOT NULL,
            claim_class         TEXT NOT NULL,
            parser_version      TEXT NOT NULL,
            status              TEXT NOT NULL,
            brier_score         REAL NOT NULL,
            precision_high_conf REAL,
            sample_count        INTEGER NOT NULL,
            computed_at         TEXT NOT NULL,
            PRIMARY KEY (period_granularity, period_key, claim_class, parser_version)
        );

        CREATE TABLE IF NOT EXISTS unknown_dimension_proposals (
            proposal_key        TEXT PRIMARY KEY,
            cluster_signature   TEXT NOT NULL,
            scope_level         TEXT NOT NULL,
            dimension_seed      TEXT NOT NULL,
            status              TEXT NOT NULL DEFAULT 'candidate',
            confidence          REAL NOT NULL,
            proposal_score      REAL NOT NULL,
            observation_count   INTEGER NOT NULL,
            unique_users        INTEGER NOT NULL,
            suggested_dimension TEXT NOT NULL DEFAULT '{}',
            evidence_bundle     TEXT NOT NULL DEFAULT '{}',
            risk_notes          TEXT NOT NULL DEFAULT '[]',
            first_seen_at       TEXT NOT NULL,
            last_seen_at        TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_proposals_status
            ON unknown_dimension_proposals(status);

        CREATE TABLE IF NOT EXISTS learning_backlog_candidates (
            candidate_key        TEXT PRIMARY KEY,
            source_type          TEXT NOT NULL,
            source_ref           TEXT NOT NULL,
            status               TEXT NOT NULL DEFAULT 'candidate',
            priority_score       REAL NOT NULL,
            title                TEXT NOT NULL,
            root_cause_hypothesis TEXT NOT NULL,
            suggested_updates    TEXT NOT NULL DEFAULT '[]',
            promotion_checklist  TEXT NOT NULL DEFAULT '{}',
            issue_payload        TEXT NOT NULL DEFAULT '{}',
            guardrails           TEXT NOT NULL DEFAULT '{}',
            first_seen_at        TEXT NOT NULL,
            last_seen_at         TEXT NOT NULL,
            updated_at           TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_backlog_status
            ON learning_backlog_candidates(status);
        CREATE INDEX IF NOT EXISTS idx_backlog_source
            ON learning_backlog_candidates(source_type);

        CREATE TABLE IF NOT EXISTS learning_pipeline_runs (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id      TEXT NOT NULL,
            phase       TEXT NOT NULL,
            status      TEXT NOT NULL,
            details     TEXT NOT NULL DEFAULT '{}',
            started_at  TEXT NOT NULL,
            finished_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_runs_run_id ON learning_pipeline_runs(run_id);
        CREATE INDEX IF NOT EXISTS idx_runs_phase ON learning_pipeline_runs(phase);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
