//! Source-specific candidate builders. Each maps one producer row to the
//! uniform candidate shape; the bridge handles filtering, dedup, and caps.

use chrono::{DateTime, Utc};
use serde_json::json;

use flywheel_core::config::BacklogConfig;
use flywheel_core::constants::{CALIBRATION_SCHEMA_VERSION, CANDIDATE_SCHEMA_VERSION};
use flywheel_core::keys;
use flywheel_core::models::{
    CalibrationMetric, CalibrationStatus, CandidateStatus, DriftStatus, IssueCluster,
    LearningBacklogCandidate, SourceType, UnknownDimensionProposal,
};

use crate::checklist::{build_checklist, AutoEvidence};

/// Calibration rows carry no score of their own; priority is derived from
/// how badly the stream is doing.
fn calibration_priority(metric: &CalibrationMetric) -> f64 {
    let base: f64 = match metric.status {
        CalibrationStatus::Degraded => 0.9,
        CalibrationStatus::Monitor => 0.6,
        CalibrationStatus::Healthy => 0.0,
    };
    let drift_boost: f64 = match metric.drift_status {
        DriftStatus::DriftAlert => 0.1,
        _ => 0.0,
    };
    (base + drift_boost).clamp(0.0, 1.0)
}

pub fn from_cluster(
    cluster: &IssueCluster,
    config: &BacklogConfig,
    now: DateTime<Utc>,
) -> LearningBacklogCandidate {
    let source_ref = format!(
        "{}:{}:{}",
        cluster.granularity.as_str(),
        cluster.period_key,
        cluster.cluster_signature
    );
    let factors = &cluster.cluster_data.score_factors;
    let root_cause_hypothesis = format!(
        "Signature '{}' recurred across {} users ({} events) in {} {}. \
         Score drivers: frequency {:.2}, severity {:.2}, impact {:.2}, \
         reproducibility {:.2}. A shared workflow or parsing gap is the \
         likely common cause.",
        cluster.cluster_signature,
        cluster.unique_users,
        cluster.event_count,
        cluster.granularity.as_str(),
        cluster.period_key,
        factors.frequency,
        factors.severity,
        factors.impact,
        factors.reproducibility,
    );
    let suggested_updates = vec![
        format!(
            "Map signature '{}' to an invariant or policy and decide whether the behavior is a defect or intended",
            cluster.cluster_signature
        ),
        "Add a regression test reproducing one of the attached example events".to_string(),
        "Re-evaluate the affected flow in shadow mode before shipping a fix".to_string(),
    ];
    build_candidate(
        SourceType::IssueCluster,
        source_ref,
        cluster.score,
        format!(
            "Recurring issue cluster '{}' ({} {})",
            cluster.cluster_signature,
            cluster.granularity.as_str(),
            cluster.period_key
        ),
        root_cause_hypothesis,
        suggested_updates,
        serde_json::to_value(&cluster.cluster_data).unwrap_or_else(|_| json!({})),
        json!({
            "schema_version": CANDIDATE_SCHEMA_VERSION,
            "min_cluster_score": config.min_cluster_score,
            "min_cluster_events": config.min_cluster_events,
            "min_cluster_users": config.min_cluster_users,
        }),
        now,
    )
}

pub fn from_calibration(
    metric: &CalibrationMetric,
    config: &BacklogConfig,
    now: DateTime<Utc>,
) -> LearningBacklogCandidate {
    let source_ref = format!(
        "{}:{}:{}:{}",
        metric.granularity.as_str(),
        metric.period_key,
        metric.claim_class,
        metric.parser_version
    );
    let drift_clause = match (metric.drift_status, metric.drift_delta_brier) {
        (DriftStatus::DriftAlert, Some(delta)) => {
            format!(" Brier worsened by {delta:.3} versus the preceding period.")
        }
        _ => String::new(),
    };
    let root_cause_hypothesis = format!(
        "Extraction of claim class '{}' under parser {} is {} in {} {} \
         (brier {:.3} over {} samples).{} Recent parser or prompt changes \
         for this class are the first place to look.",
        metric.claim_class,
        metric.parser_version,
        metric.status.as_str(),
        metric.granularity.as_str(),
        metric.period_key,
        metric.brier_score,
        metric.sample_count,
        drift_clause,
    );
    let suggested_updates = vec![
        format!(
            "Review extraction prompts and validators for claim class '{}'",
            metric.claim_class
        ),
        format!(
            "Add labeled regression fixtures for parser {} covering this class",
            metric.parser_version
        ),
        "Consider lowering auto-save confidence for this class until calibration recovers"
            .to_string(),
    ];
    let mut issue_payload = serde_json::to_value(metric).unwrap_or_else(|_| json!({}));
    if let Some(map) = issue_payload.as_object_mut() {
        map.insert(
            "schema_version".to_string(),
            json!(CALIBRATION_SCHEMA_VERSION),
        );
    }
    build_candidate(
        SourceType::CalibrationDrift,
        source_ref,
        calibration_priority(metric),
        format!(
            "Calibration {} for claim class '{}' ({})",
            metric.status.as_str(),
            metric.claim_class,
            metric.parser_version
        ),
        root_cause_hypothesis,
        suggested_updates,
        issue_payload,
        json!({
            "schema_version": CANDIDATE_SCHEMA_VERSION,
            "min_calibration_samples": config.min_calibration_samples,
        }),
        now,
    )
}

pub fn from_proposal(
    proposal: &UnknownDimensionProposal,
    config: &BacklogConfig,
    now: DateTime<Utc>,
) -> LearningBacklogCandidate {
    let root_cause_hypothesis = format!(
        "Users log '{}' at {} scope ({} observations from {} users) but the \
         schema has no such dimension, so the values land in free-form \
         observations instead of structured fields.",
        proposal.dimension_seed,
        proposal.scope_level.as_str(),
        proposal.observation_count,
        proposal.unique_users,
    );
    let suggested_updates = vec![
        format!(
            "Add dimension '{}' ({}{}) to the training schema at {} scope",
            proposal.suggested_dimension.name,
            proposal.suggested_dimension.value_type.as_str(),
            proposal
                .suggested_dimension
                .unit
                .as_deref()
                .map(|u| format!(", unit {u}"))
                .unwrap_or_default(),
            proposal.scope_level.as_str()
        ),
        "Backfill historical observations once the dimension lands".to_string(),
        "Regression-test extraction of the new dimension against the evidence examples"
            .to_string(),
    ];
    build_candidate(
        SourceType::UnknownDimension,
        proposal.proposal_key.clone(),
        proposal.proposal_score,
        format!(
            "Unmodeled dimension '{}' at {} scope",
            proposal.dimension_seed,
            proposal.scope_level.as_str()
        ),
        root_cause_hypothesis,
        suggested_updates,
        serde_json::to_value(proposal).unwrap_or_else(|_| json!({})),
        json!({
            "schema_version": CANDIDATE_SCHEMA_VERSION,
            "min_proposal_score": config.min_proposal_score,
        }),
        now,
    )
}

#[allow(clippy::too_many_arguments)]
fn build_candidate(
    source_type: SourceType,
    source_ref: String,
    priority_score: f64,
    title: String,
    root_cause_hypothesis: String,
    suggested_updates: Vec<String>,
    issue_payload: serde_json::Value,
    guardrails: serde_json::Value,
    now: DateTime<Utc>,
) -> LearningBacklogCandidate {
    let checklist = build_checklist(AutoEvidence {
        has_root_cause_hypothesis: !root_cause_hypothesis.is_empty(),
        has_invariant_mapping: suggested_updates.iter().any(|s| {
            s.contains("invariant") || s.contains("policy") || s.contains("dimension")
        }),
    });
    LearningBacklogCandidate {
        candidate_key: keys::candidate_key(source_type.as_str(), &source_ref),
        source_type,
        source_ref,
        status: CandidateStatus::Candidate,
        priority_score: priority_score.clamp(0.0, 1.0),
        title,
        root_cause_hypothesis,
        suggested_updates,
        promotion_checklist: checklist,
        issue_payload,
        guardrails,
        first_seen_at: now,
        last_seen_at: now,
    }
}
