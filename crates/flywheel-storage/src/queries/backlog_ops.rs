//! learning_backlog_candidates: the status-guarded upsert.
//!
//! This guard is the central correctness property of the whole pipeline:
//! a row that reached `approved` or `promoted` must never be rewritten back
//! to `candidate` by a later run, under reruns or concurrent runs.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use flywheel_core::errors::FlywheelResult;
use flywheel_core::models::{
    CandidateStatus, LearningBacklogCandidate, PromotionChecklist, SourceType,
};

use crate::to_storage_err;

/// Upsert one candidate. A single conditional write: the update arm only
/// fires when the existing status is `candidate` or `dismissed`, and a
/// `dismissed` row resurrects to `candidate` in the same statement, so the
/// guard and the reset are atomic.
///
/// Returns `true` if the row was inserted or updated, `false` if the guard
/// preserved an `approved`/`promoted` row.
pub fn upsert_candidate(
    conn: &Connection,
    candidate: &LearningBacklogCandidate,
) -> FlywheelResult<bool> {
    let updates = serde_json::to_string(&candidate.suggested_updates)?;
    let checklist = serde_json::to_string(&candidate.promotion_checklist)?;
    let payload = serde_json::to_string(&candidate.issue_payload)?;
    let guardrails = serde_json::to_string(&candidate.guardrails)?;
    let now = Utc::now().to_rfc3339();

    let changed = conn
        .execute(
            "INSERT INTO learning_backlog_candidates (
                candidate_key, source_type, source_ref, status, priority_score,
                title, root_cause_hypothesis, suggested_updates,
                promotion_checklist, issue_payload, guardrails,
                first_seen_at, last_seen_at, updated_at
            ) VALUES (?1, ?2, ?3, 'candidate', ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(candidate_key) DO UPDATE SET
                source_type = excluded.source_type,
                source_ref = excluded.source_ref,
                status = 'candidate',
                priority_score = excluded.priority_score,
                title = excluded.title,
                root_cause_hypothesis = excluded.root_cause_hypothesis,
                suggested_updates = excluded.suggested_updates,
                promotion_checklist = excluded.promotion_checklist,
                issue_payload = excluded.issue_payload,
                guardrails = excluded.guardrails,
                last_seen_at = excluded.last_seen_at,
                updated_at = excluded.updated_at
            WHERE learning_backlog_candidates.status IN ('candidate', 'dismissed')",
            params![
                candidate.candidate_key,
                candidate.source_type.as_str(),
                candidate.source_ref,
                candidate.priority_score,
                candidate.title,
                candidate.root_cause_hypothesis,
                updates,
                checklist,
                payload,
                guardrails,
                candidate.first_seen_at.to_rfc3339(),
                candidate.last_seen_at.to_rfc3339(),
                now,
            ],
        )
        .map_err(|e| to_storage_err(format!("upsert_candidate: {e}")))?;
    Ok(changed > 0)
}

pub fn get_candidate(
    conn: &Connection,
    candidate_key: &str,
) -> FlywheelResult<Option<LearningBacklogCandidate>> {
    conn.query_row(
        "SELECT candidate_key, source_type, source_ref, status, priority_score,
                title, root_cause_hypothesis, suggested_updates,
                promotion_checklist, issue_payload, guardrails,
                first_seen_at, last_seen_at
         FROM learning_backlog_candidates
         WHERE candidate_key = ?1",
        [candidate_key],
        row_to_candidate,
    )
    .optional()
    .map_err(|e| to_storage_err(format!("get_candidate: {e}")))
}

/// All candidate rows, highest priority first. Downstream review UIs read
/// this ordering directly.
pub fn list_candidates(conn: &Connection) -> FlywheelResult<Vec<LearningBacklogCandidate>> {
    let mut stmt = conn
        .prepare(
            "SELECT candidate_key, source_type, source_ref, status, priority_score,
                    title, root_cause_hypothesis, suggested_updates,
                    promotion_checklist, issue_payload, guardrails,
                    first_seen_at, last_seen_at
             FROM learning_backlog_candidates
             ORDER BY priority_score DESC, candidate_key ASC",
        )
        .map_err(|e| to_storage_err(format!("list_candidates prepare: {e}")))?;

    let rows = stmt
        .query_map([], row_to_candidate)
        .map_err(|e| to_storage_err(format!("list_candidates query: {e}")))?;

    let mut candidates = Vec::new();
    for row in rows {
        candidates.push(row.map_err(|e| to_storage_err(format!("list_candidates row: {e}")))?);
    }
    Ok(candidates)
}

/// Record a human decision. Review-surface helper; the pipeline never calls it.
pub fn set_candidate_status(
    conn: &Connection,
    candidate_key: &str,
    status: CandidateStatus,
) -> FlywheelResult<bool> {
    let changed = conn
        .execute(
            "UPDATE learning_backlog_candidates
             SET status = ?2, updated_at = ?3
             WHERE candidate_key = ?1",
            params![candidate_key, status.as_str(), Utc::now().to_rfc3339()],
        )
        .map_err(|e| to_storage_err(format!("set_candidate_status: {e}")))?;
    Ok(changed > 0)
}

fn row_to_candidate(row: &rusqlite::Row<'_>) -> rusqlite::Result<LearningBacklogCandidate> {
    let source_type: String = row.get(1)?;
    let status: String = row.get(3)?;
    let updates: String = row.get(7)?;
    let checklist: String = row.get(8)?;
    let payload: String = row.get(9)?;
    let guardrails: String = row.get(10)?;
    let first_seen: String = row.get(11)?;
    let last_seen: String = row.get(12)?;

    let json_err = |idx: usize, e: serde_json::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    };

    Ok(LearningBacklogCandidate {
        candidate_key: row.get(0)?,
        source_type: SourceType::parse(&source_type).unwrap_or(SourceType::IssueCluster),
        source_ref: row.get(2)?,
        status: CandidateStatus::parse(&status).unwrap_or(CandidateStatus::Candidate),
        priority_score: row.get(4)?,
        title: row.get(5)?,
        root_cause_hypothesis: row.get(6)?,
        suggested_updates: serde_json::from_str(&updates).map_err(|e| json_err(7, e))?,
        promotion_checklist: serde_json::from_str::<PromotionChecklist>(&checklist)
            .map_err(|e| json_err(8, e))?,
        issue_payload: serde_json::from_str(&payload).map_err(|e| json_err(9, e))?,
        guardrails: serde_json::from_str(&guardrails).map_err(|e| json_err(10, e))?,
        first_seen_at: first_seen
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
        last_seen_at: last_seen
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
    })
}
