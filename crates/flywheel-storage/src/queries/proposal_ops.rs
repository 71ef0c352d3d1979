//! unknown_dimension_proposals: guarded per-row upsert and reads.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use flywheel_core::errors::FlywheelResult;
use flywheel_core::models::{
    EvidenceBundle, ProposalStatus, RiskNote, ScopeLevel, SuggestedDimension,
    UnknownDimensionProposal,
};

use crate::to_storage_err;

/// Upsert one proposal without ever overwriting a human decision.
///
/// The guard is a single conditional write: the `ON CONFLICT` update only
/// fires when the existing status is `candidate` or `dismissed`, and a
/// `dismissed` row is reset to `candidate` inside the same statement. No
/// read-then-write, so overlapping runs cannot race past the guard.
///
/// Returns `true` if the row was inserted or updated, `false` if the guard
/// preserved an `accepted`/`promoted` row.
pub fn upsert_proposal(
    conn: &Connection,
    proposal: &UnknownDimensionProposal,
) -> FlywheelResult<bool> {
    let suggested = serde_json::to_string(&proposal.suggested_dimension)?;
    let evidence = serde_json::to_string(&proposal.evidence_bundle)?;
    let risks = serde_json::to_string(&proposal.risk_notes)?;
    let now = Utc::now().to_rfc3339();

    let changed = conn
        .execute(
            "INSERT INTO unknown_dimension_proposals (
                proposal_key, cluster_signature, scope_level, dimension_seed,
                status, confidence, proposal_score, observation_count,
                unique_users, suggested_dimension, evidence_bundle, risk_notes,
                first_seen_at, last_seen_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 'candidate', ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(proposal_key) DO UPDATE SET
                cluster_signature = excluded.cluster_signature,
                scope_level = excluded.scope_level,
                dimension_seed = excluded.dimension_seed,
                status = 'candidate',
                confidence = excluded.confidence,
                proposal_score = excluded.proposal_score,
                observation_count = excluded.observation_count,
                unique_users = excluded.unique_users,
                suggested_dimension = excluded.suggested_dimension,
                evidence_bundle = excluded.evidence_bundle,
                risk_notes = excluded.risk_notes,
                last_seen_at = excluded.last_seen_at,
                updated_at = excluded.updated_at
            WHERE unknown_dimension_proposals.status IN ('candidate', 'dismissed')",
            params![
                proposal.proposal_key,
                proposal.cluster_signature,
                proposal.scope_level.as_str(),
                proposal.dimension_seed,
                proposal.confidence,
                proposal.proposal_score,
                proposal.observation_count as i64,
                proposal.unique_users as i64,
                suggested,
                evidence,
                risks,
                proposal.first_seen_at.to_rfc3339(),
                proposal.last_seen_at.to_rfc3339(),
                now,
            ],
        )
        .map_err(|e| to_storage_err(format!("upsert_proposal: {e}")))?;
    Ok(changed > 0)
}

/// All proposals a human has accepted, the BacklogBridge input.
pub fn accepted_proposals(conn: &Connection) -> FlywheelResult<Vec<UnknownDimensionProposal>> {
    let mut stmt = conn
        .prepare(
            "SELECT proposal_key, cluster_signature, scope_level, dimension_seed,
                    status, confidence, proposal_score, observation_count,
                    unique_users, suggested_dimension, evidence_bundle, risk_notes,
                    first_seen_at, last_seen_at
             FROM unknown_dimension_proposals
             WHERE status = 'accepted'
             ORDER BY proposal_score DESC, proposal_key ASC",
        )
        .map_err(|e| to_storage_err(format!("accepted_proposals prepare: {e}")))?;

    let rows = stmt
        .query_map([], row_to_proposal)
        .map_err(|e| to_storage_err(format!("accepted_proposals query: {e}")))?;

    let mut proposals = Vec::new();
    for row in rows {
        proposals.push(row.map_err(|e| to_storage_err(format!("accepted_proposals row: {e}")))?);
    }
    Ok(proposals)
}

pub fn get_proposal(
    conn: &Connection,
    proposal_key: &str,
) -> FlywheelResult<Option<UnknownDimensionProposal>> {
    conn.query_row(
        "SELECT proposal_key, cluster_signature, scope_level, dimension_seed,
                status, confidence, proposal_score, observation_count,
                unique_users, suggested_dimension, evidence_bundle, risk_notes,
                first_seen_at, last_seen_at
         FROM unknown_dimension_proposals
         WHERE proposal_key = ?1",
        [proposal_key],
        row_to_proposal,
    )
    .optional()
    .map_err(|e| to_storage_err(format!("get_proposal: {e}")))
}

/// Record a human decision on a proposal. This is the surface the review UI
/// writes through; the pipeline itself never calls it.
pub fn set_proposal_status(
    conn: &Connection,
    proposal_key: &str,
    status: ProposalStatus,
) -> FlywheelResult<bool> {
    let changed = conn
        .execute(
            "UPDATE unknown_dimension_proposals
             SET status = ?2, updated_at = ?3
             WHERE proposal_key = ?1",
            params![proposal_key, status.as_str(), Utc::now().to_rfc3339()],
        )
        .map_err(|e| to_storage_err(format!("set_proposal_status: {e}")))?;
    Ok(changed > 0)
}

fn row_to_proposal(row: &rusqlite::Row<'_>) -> rusqlite::Result<UnknownDimensionProposal> {
    let scope: String = row.get(2)?;
    let status: String = row.get(4)?;
    let suggested: String = row.get(9)?;
    let evidence: String = row.get(10)?;
    let risks: String = row.get(11)?;
    let first_seen: String = row.get(12)?;
    let last_seen: String = row.get(13)?;

    let json_err = |idx: usize, e: serde_json::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    };

    Ok(UnknownDimensionProposal {
        proposal_key: row.get(0)?,
        cluster_signature: row.get(1)?,
        scope_level: ScopeLevel::parse(&scope).unwrap_or(ScopeLevel::Session),
        dimension_seed: row.get(3)?,
        status: ProposalStatus::parse(&status).unwrap_or(ProposalStatus::Candidate),
        confidence: row.get(5)?,
        proposal_score: row.get(6)?,
        observation_count: row.get::<_, i64>(7)? as usize,
        unique_users: row.get::<_, i64>(8)? as usize,
        suggested_dimension: serde_json::from_str::<SuggestedDimension>(&suggested)
            .map_err(|e| json_err(9, e))?,
        evidence_bundle: serde_json::from_str::<EvidenceBundle>(&evidence)
            .map_err(|e| json_err(10, e))?,
        risk_notes: serde_json::from_str::<Vec<RiskNote>>(&risks).map_err(|e| json_err(11, e))?,
        first_seen_at: first_seen
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
        last_seen_at: last_seen
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
    })
}
