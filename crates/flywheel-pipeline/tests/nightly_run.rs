//! End-to-end tests for the nightly run: deploy-order independence, failure
//! isolation, idempotence, and the approved/promoted status guard.

use chrono::{Duration, Utc};
use rusqlite::params;
use serde_json::json;

use flywheel_core::config::Settings;
use flywheel_core::models::{CandidateStatus, PhaseStatus, PipelinePhase, ProposalStatus};
use flywheel_pipeline::run_nightly;
use flywheel_storage::queries::{backlog_ops, proposal_ops, run_log};
use flywheel_storage::StorageEngine;

fn engine_with_events() -> StorageEngine {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine
        .with_conn(|conn| {
            conn.execute_batch(
                "CREATE TABLE events (
                    event_id TEXT PRIMARY KEY,
                    event_type TEXT NOT NULL,
                    occurred_at TEXT NOT NULL,
                    data TEXT NOT NULL
                )",
            )
            .map_err(|e| flywheel_storage::to_storage_err(e.to_string()))
        })
        .unwrap();
    engine
}

fn insert_event(
    engine: &StorageEngine,
    event_id: &str,
    event_type: &str,
    hours_ago: i64,
    data: serde_json::Value,
) {
    let occurred_at = (Utc::now() - Duration::hours(hours_ago)).to_rfc3339();
    engine
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (event_id, event_type, occurred_at, data)
                 VALUES (?1, ?2, ?3, ?4)",
                params![event_id, event_type, occurred_at, data.to_string()],
            )
            .map_err(|e| flywheel_storage::to_storage_err(e.to_string()))
        })
        .unwrap();
}

fn seed_signals(engine: &StorageEngine) {
    // Six mismatch events across three users, enough to clear both gates.
    for (i, user) in [(0, "u1"), (1, "u1"), (2, "u2"), (3, "u2"), (4, "u3"), (5, "u3")] {
        insert_event(
            engine,
            &format!("sig-{i}"),
            "learning.signal.logged",
            2 + i as i64,
            json!({
                "category": "outcome_signal",
                "signal_type": "save_claim_mismatch_attempt",
                "attributes": { "mismatch_severity": "critical" },
                "signature": {
                    "cluster_signature": "mismatch:weight_kg",
                    "confidence_band": "high"
                },
                "user_ref": { "pseudonymized_user_id": user }
            }),
        );
    }
}

fn seed_observations(engine: &StorageEngine) {
    for (i, user) in [(0, "u1"), (1, "u2"), (2, "u3")] {
        insert_event(
            engine,
            &format!("obs-{i}"),
            "observation.logged",
            3 + i as i64,
            json!({
                "dimension": "grip width",
                "value": 56 + i,
                "unit": "cm",
                "scope": { "level": "set" },
                "user_ref": { "pseudonymized_user_id": user }
            }),
        );
    }
}

fn seed_claims(engine: &StorageEngine) {
    for i in 0..12i64 {
        insert_event(
            engine,
            &format!("claim-{i}"),
            "evidence.claim.logged",
            4 + i,
            json!({
                "claim_class": "set_weight",
                "parser_version": "p3",
                "confidence": 0.9,
                "source_event_id": format!("src-{i}")
            }),
        );
    }
}

fn candidate_rows(engine: &StorageEngine) -> Vec<(String, String, f64, String)> {
    engine
        .with_conn(|conn| {
            backlog_ops::list_candidates(conn).map(|candidates| {
                candidates
                    .into_iter()
                    .map(|c| {
                        (
                            c.candidate_key,
                            c.status.as_str().to_string(),
                            c.priority_score,
                            c.issue_payload.to_string(),
                        )
                    })
                    .collect()
            })
        })
        .unwrap()
}

#[test]
fn full_run_produces_clusters_metrics_and_candidates() {
    let engine = engine_with_events();
    seed_signals(&engine);
    seed_claims(&engine);
    seed_observations(&engine);

    let report = run_nightly(&engine, &Settings::default()).unwrap();
    assert_eq!(report.phases.len(), 4);
    for outcome in &report.phases {
        assert_eq!(outcome.status, PhaseStatus::Success, "{:?}", outcome.phase);
    }

    let candidates = candidate_rows(&engine);
    assert!(!candidates.is_empty());
    // The mismatch cluster is severe enough to surface as a candidate.
    assert!(candidates
        .iter()
        .any(|(_, _, _, payload)| payload.contains("mismatch:weight_kg")));

    // One audit row per phase, in execution order.
    let audit = engine
        .with_conn(|conn| run_log::phases_for_run(conn, &report.run_id))
        .unwrap();
    assert_eq!(audit.len(), 4);
    assert_eq!(audit[0].0, "clustering");
    assert_eq!(audit[3].0, "backlog");
}

#[test]
fn missing_events_table_skips_reader_phases_without_error() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let report = run_nightly(&engine, &Settings::default()).unwrap();

    for outcome in &report.phases {
        match outcome.phase {
            PipelinePhase::Backlog => assert_eq!(outcome.status, PhaseStatus::Success),
            _ => assert_eq!(outcome.status, PhaseStatus::Skipped),
        }
    }
    let audit = engine
        .with_conn(|conn| run_log::phases_for_run(conn, &report.run_id))
        .unwrap();
    assert_eq!(audit.len(), 4);
}

#[test]
fn one_failing_phase_does_not_abort_the_rest() {
    let engine = engine_with_events();
    seed_signals(&engine);
    seed_claims(&engine);
    // Sabotage the clustering output table so its write fails.
    engine
        .with_conn(|conn| {
            conn.execute_batch("DROP TABLE learning_issue_clusters")
                .map_err(|e| flywheel_storage::to_storage_err(e.to_string()))
        })
        .unwrap();

    let report = run_nightly(&engine, &Settings::default()).unwrap();
    assert_eq!(report.phases[0].status, PhaseStatus::Failed);
    assert_eq!(report.phases[1].status, PhaseStatus::Success);
    assert_eq!(report.phases[2].status, PhaseStatus::Success);
    assert_eq!(report.phases[3].status, PhaseStatus::Success);
}

#[test]
fn rerunning_on_identical_input_is_idempotent() {
    let engine = engine_with_events();
    seed_signals(&engine);
    seed_observations(&engine);

    run_nightly(&engine, &Settings::default()).unwrap();
    let first = candidate_rows(&engine);
    run_nightly(&engine, &Settings::default()).unwrap();
    let second = candidate_rows(&engine);

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn recompute_clears_periods_whose_events_vanished() {
    let engine = engine_with_events();
    seed_signals(&engine);
    seed_claims(&engine);

    run_nightly(&engine, &Settings::default()).unwrap();
    let count = |table: &str| {
        engine
            .with_conn(|conn| {
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get::<_, i64>(0)
                })
                .map_err(|e| flywheel_storage::to_storage_err(e.to_string()))
            })
            .unwrap()
    };
    assert!(count("learning_issue_clusters") > 0);
    assert!(count("extraction_calibration_metrics") > 0);

    // The source events disappear entirely; the next run produces no output
    // for those periods, but the stale rows must still be cleared.
    engine
        .with_conn(|conn| {
            conn.execute_batch("DELETE FROM events")
                .map_err(|e| flywheel_storage::to_storage_err(e.to_string()))
        })
        .unwrap();
    run_nightly(&engine, &Settings::default()).unwrap();

    assert_eq!(count("learning_issue_clusters"), 0);
    assert_eq!(count("extraction_calibration_metrics"), 0);
}

#[test]
fn approved_candidates_survive_reruns_untouched() {
    let engine = engine_with_events();
    seed_signals(&engine);

    run_nightly(&engine, &Settings::default()).unwrap();
    let key = candidate_rows(&engine)[0].0.clone();
    engine
        .with_conn(|conn| backlog_ops::set_candidate_status(conn, &key, CandidateStatus::Approved))
        .unwrap();

    run_nightly(&engine, &Settings::default()).unwrap();
    let row = engine
        .with_conn(|conn| backlog_ops::get_candidate(conn, &key))
        .unwrap()
        .unwrap();
    assert_eq!(row.status, CandidateStatus::Approved);
}

#[test]
fn dismissed_candidates_reopen_when_evidence_recurs() {
    let engine = engine_with_events();
    seed_signals(&engine);

    run_nightly(&engine, &Settings::default()).unwrap();
    let key = candidate_rows(&engine)[0].0.clone();
    engine
        .with_conn(|conn| backlog_ops::set_candidate_status(conn, &key, CandidateStatus::Dismissed))
        .unwrap();

    run_nightly(&engine, &Settings::default()).unwrap();
    let row = engine
        .with_conn(|conn| backlog_ops::get_candidate(conn, &key))
        .unwrap()
        .unwrap();
    assert_eq!(row.status, CandidateStatus::Candidate);
}

#[test]
fn accepted_proposals_flow_into_the_backlog() {
    let engine = engine_with_events();
    seed_observations(&engine);

    run_nightly(&engine, &Settings::default()).unwrap();
    let proposals = engine
        .with_conn(|conn| {
            // Accept whatever the miner proposed.
            let mut keys = Vec::new();
            let mut stmt = conn
                .prepare("SELECT proposal_key FROM unknown_dimension_proposals")
                .map_err(|e| flywheel_storage::to_storage_err(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(|e| flywheel_storage::to_storage_err(e.to_string()))?;
            for row in rows {
                keys.push(row.map_err(|e| flywheel_storage::to_storage_err(e.to_string()))?);
            }
            Ok(keys)
        })
        .unwrap();
    assert!(!proposals.is_empty());
    engine
        .with_conn(|conn| {
            proposal_ops::set_proposal_status(conn, &proposals[0], ProposalStatus::Accepted)
        })
        .unwrap();

    run_nightly(&engine, &Settings::default()).unwrap();
    let candidates = candidate_rows(&engine);
    assert!(candidates
        .iter()
        .any(|(_, _, _, payload)| payload.contains("grip_width")));
}
