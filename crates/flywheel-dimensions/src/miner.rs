//! UnknownDimensionMiner: observations → clusters → scored proposals.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use flywheel_core::config::DimensionConfig;
use flywheel_core::constants::PROPOSAL_SCHEMA_VERSION;
use flywheel_core::keys;
use flywheel_core::models::{
    EventRow, EvidenceBundle, ObservationExample, ProposalStatus, RiskNote, ScopeLevel,
    SuggestedDimension, UnknownDimensionProposal,
};

use crate::infer;
use crate::observation::{parse_observation, ObservationRecord};
use crate::registry::KnownDimensions;
use crate::text;

/// Counts for the audit row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MiningTelemetry {
    pub observations_total: usize,
    pub observations_skipped: usize,
    pub known_dimension_filtered: usize,
    pub clusters_total: usize,
    pub clusters_surviving: usize,
}

#[derive(Debug, Clone)]
pub struct MiningOutcome {
    pub proposals: Vec<UnknownDimensionProposal>,
    pub telemetry: MiningTelemetry,
}

/// Mine proposals out of one window of `observation.logged` rows.
///
/// Clustering keys on `(scope_level, dimension_seed)` so near-duplicate
/// wording of the same dimension does not fragment into separate clusters;
/// the semantic fingerprint is carried in the evidence bundle only.
pub fn mine_proposals(
    rows: &[EventRow],
    known: &KnownDimensions,
    config: &DimensionConfig,
    now: DateTime<Utc>,
) -> MiningOutcome {
    let mut telemetry = MiningTelemetry {
        observations_total: rows.len(),
        ..MiningTelemetry::default()
    };

    let mut clusters: BTreeMap<(ScopeLevel, String), Vec<ObservationRecord>> = BTreeMap::new();
    let mut provisional_seeds: BTreeSet<(ScopeLevel, String)> = BTreeSet::new();

    for row in rows {
        let Some(record) = parse_observation(row) else {
            telemetry.observations_skipped += 1;
            continue;
        };
        if known.contains(&record.dimension_raw) {
            telemetry.known_dimension_filtered += 1;
            continue;
        }
        let seed = text::dimension_seed(&record.dimension_raw);
        let key = (record.scope, seed.seed);
        if seed.had_provisional_prefix {
            provisional_seeds.insert(key.clone());
        }
        clusters.entry(key).or_default().push(record);
    }
    telemetry.clusters_total = clusters.len();

    let mut proposals = Vec::new();
    for ((scope, seed), mut members) in clusters {
        members.sort_by(|a, b| {
            a.captured_at
                .cmp(&b.captured_at)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });

        let unique_users: BTreeSet<&str> = members
            .iter()
            .map(|m| m.pseudonymized_user_id.as_str())
            .collect();
        if members.len() < config.min_support || unique_users.len() < config.min_unique_users {
            debug!(
                seed = %seed,
                scope = scope.as_str(),
                observations = members.len(),
                users = unique_users.len(),
                "observation cluster below corroboration gates, filtered"
            );
            continue;
        }

        let had_provisional = provisional_seeds.contains(&(scope, seed.clone()));
        proposals.push(build_proposal(
            scope,
            seed,
            &members,
            unique_users.len(),
            had_provisional,
            config,
            now,
        ));
    }
    telemetry.clusters_surviving = proposals.len();

    proposals.sort_by(|a, b| {
        b.proposal_score
            .total_cmp(&a.proposal_score)
            .then_with(|| a.proposal_key.cmp(&b.proposal_key))
    });

    MiningOutcome {
        proposals,
        telemetry,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_proposal(
    scope: ScopeLevel,
    seed: String,
    members: &[ObservationRecord],
    unique_users: usize,
    had_provisional: bool,
    config: &DimensionConfig,
    now: DateTime<Utc>,
) -> UnknownDimensionProposal {
    let refs: Vec<&ObservationRecord> = members.iter().collect();
    let schema = infer::infer_schema(&refs);

    let observation_count = members.len() as f64;
    let users = unique_users.max(1) as f64;

    let frequency = (observation_count / config.frequency_reference_count.max(1) as f64).min(1.0);
    let user_coverage = (users / config.reproducibility_reference_users.max(1) as f64).min(1.0);
    let repeatability = ((observation_count / users) / 2.0).min(1.0);
    let reproducibility = (user_coverage + repeatability) / 2.0;
    let consistency = 0.6 * schema.type_consistency + 0.4 * schema.unit_consistency;
    let scope_impact = scope.weight();

    let proposal_score =
        (frequency * reproducibility * consistency * scope_impact).clamp(0.0, 1.0);
    let confidence =
        (0.4 * reproducibility + 0.35 * consistency + 0.25 * frequency).clamp(0.0, 1.0);

    let mut risk_notes = Vec::new();
    if schema.type_consistency < 1.0 {
        risk_notes.push(RiskNote::MixedValueTypes);
    }
    if schema.unit_consistency < 1.0 {
        risk_notes.push(RiskNote::InconsistentUnits);
    }
    if confidence < config.low_confidence_floor {
        risk_notes.push(RiskNote::LowConfidence);
    }
    if had_provisional {
        risk_notes.push(RiskNote::ProvisionalPrefix);
    }

    let fingerprint = text::semantic_fingerprint(members.iter().map(|m| {
        let mut parts = vec![m.dimension_raw.clone()];
        if let Some(ctx) = &m.context_text {
            parts.push(ctx.clone());
        }
        parts.extend(m.tags.iter().cloned());
        parts.join(" ")
    }));

    let keep = config.max_examples_per_proposal.min(members.len());
    let examples: Vec<ObservationExample> = members
        .iter()
        .take(keep)
        .map(|m| ObservationExample {
            event_id: m.event_id.clone(),
            dimension: m.dimension_raw.clone(),
            value: m.value.clone(),
            unit: m.unit.clone(),
            context_text: m.context_text.clone(),
        })
        .collect();

    let cluster_signature = format!("{}:{}", scope.as_str(), seed);
    let first_seen_at = members.first().map(|m| m.captured_at).unwrap_or(now);
    let last_seen_at = members.last().map(|m| m.captured_at).unwrap_or(now);

    UnknownDimensionProposal {
        proposal_key: keys::proposal_key(&cluster_signature),
        cluster_signature,
        scope_level: scope,
        dimension_seed: seed.clone(),
        status: ProposalStatus::Candidate,
        confidence,
        proposal_score,
        observation_count: members.len(),
        unique_users,
        suggested_dimension: SuggestedDimension {
            name: seed,
            value_type: schema.value_type,
            unit: schema.unit,
            scale: schema.numeric_range,
        },
        evidence_bundle: EvidenceBundle {
            schema_version: PROPOSAL_SCHEMA_VERSION.to_string(),
            semantic_fingerprint: fingerprint,
            examples,
            value_type_counts: schema.value_type_counts,
            unit_counts: schema.unit_counts,
            examples_truncated: members.len() - keep,
            extra: serde_json::Map::new(),
        },
        risk_notes,
        first_seen_at,
        last_seen_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flywheel_core::models::ValueType;
    use serde_json::json;

    fn obs_row(
        event_id: &str,
        user: &str,
        dimension: &str,
        value: serde_json::Value,
        unit: Option<&str>,
        scope: &str,
        hour: u32,
    ) -> EventRow {
        let mut data = json!({
            "dimension": dimension,
            "value": value,
            "scope": { "level": scope },
            "user_ref": { "pseudonymized_user_id": user },
            "tags": ["bench"]
        });
        if let Some(u) = unit {
            data["unit"] = json!(u);
        }
        EventRow {
            event_id: event_id.to_string(),
            event_type: "observation.logged".to_string(),
            occurred_at: format!("2026-08-24T{hour:02}:00:00Z"),
            data,
        }
    }

    fn grip_rows() -> Vec<EventRow> {
        vec![
            obs_row("o1", "u1", "grip width", json!(56), Some("cm"), "set", 1),
            obs_row("o2", "u2", "Grip Width", json!(58), Some("cm"), "set", 2),
            obs_row("o3", "u1", "tmp_grip_width", json!(60), Some("cm"), "set", 3),
        ]
    }

    #[test]
    fn near_duplicate_wording_lands_in_one_cluster() {
        let outcome = mine_proposals(
            &grip_rows(),
            &KnownDimensions::default(),
            &DimensionConfig::default(),
            Utc::now(),
        );
        assert_eq!(outcome.proposals.len(), 1);
        let proposal = &outcome.proposals[0];
        assert_eq!(proposal.dimension_seed, "grip_width");
        assert_eq!(proposal.observation_count, 3);
        assert_eq!(proposal.unique_users, 2);
        assert_eq!(proposal.suggested_dimension.value_type, ValueType::Integer);
        assert_eq!(proposal.suggested_dimension.unit.as_deref(), Some("cm"));
        assert!(proposal.risk_notes.contains(&RiskNote::ProvisionalPrefix));
    }

    #[test]
    fn known_dimensions_never_become_proposals() {
        let rows = vec![
            obs_row("o1", "u1", "weight_kg", json!(100), Some("kg"), "set", 1),
            obs_row("o2", "u2", "weight_kg", json!(102.5), Some("kg"), "set", 2),
            obs_row("o3", "u3", "weight_kg", json!(105), Some("kg"), "set", 3),
        ];
        let outcome = mine_proposals(
            &rows,
            &KnownDimensions::default(),
            &DimensionConfig::default(),
            Utc::now(),
        );
        assert!(outcome.proposals.is_empty());
        assert_eq!(outcome.telemetry.known_dimension_filtered, 3);
    }

    #[test]
    fn single_user_observations_are_gated() {
        let rows = vec![
            obs_row("o1", "u1", "bar speed", json!(0.4), Some("m/s"), "set", 1),
            obs_row("o2", "u1", "bar speed", json!(0.45), Some("m/s"), "set", 2),
            obs_row("o3", "u1", "bar speed", json!(0.5), Some("m/s"), "set", 3),
        ];
        let outcome = mine_proposals(
            &rows,
            &KnownDimensions::default(),
            &DimensionConfig::default(),
            Utc::now(),
        );
        assert!(outcome.proposals.is_empty());
        assert_eq!(outcome.telemetry.clusters_total, 1);
        assert_eq!(outcome.telemetry.clusters_surviving, 0);
    }

    #[test]
    fn scope_levels_cluster_separately_and_weight_scores() {
        let mut rows = grip_rows();
        rows.extend(vec![
            obs_row("s1", "u1", "grip width", json!(56), Some("cm"), "session", 4),
            obs_row("s2", "u2", "grip width", json!(58), Some("cm"), "session", 5),
            obs_row("s3", "u3", "grip width", json!(60), Some("cm"), "session", 6),
        ]);
        let outcome = mine_proposals(
            &rows,
            &KnownDimensions::default(),
            &DimensionConfig::default(),
            Utc::now(),
        );
        assert_eq!(outcome.proposals.len(), 2);
        let set = outcome
            .proposals
            .iter()
            .find(|p| p.scope_level == ScopeLevel::Set)
            .unwrap();
        let session = outcome
            .proposals
            .iter()
            .find(|p| p.scope_level == ScopeLevel::Session)
            .unwrap();
        assert_ne!(set.proposal_key, session.proposal_key);
        // Session cluster has more users but a lower scope weight; with equal
        // everything else the weight shows up in the score ratio.
        assert!(set.proposal_score > 0.0 && session.proposal_score > 0.0);
    }

    #[test]
    fn mixed_types_get_a_risk_note_not_suppression() {
        let rows = vec![
            obs_row("o1", "u1", "pump feel", json!("huge"), None, "exercise", 1),
            obs_row("o2", "u2", "pump feel", json!("flat"), None, "exercise", 2),
            obs_row("o3", "u3", "pump feel", json!(7), None, "exercise", 3),
        ];
        let outcome = mine_proposals(
            &rows,
            &KnownDimensions::default(),
            &DimensionConfig::default(),
            Utc::now(),
        );
        assert_eq!(outcome.proposals.len(), 1);
        let proposal = &outcome.proposals[0];
        assert!(proposal.risk_notes.contains(&RiskNote::MixedValueTypes));
        assert_eq!(proposal.suggested_dimension.value_type, ValueType::Text);
    }

    #[test]
    fn score_and_confidence_match_the_formulas() {
        let outcome = mine_proposals(
            &grip_rows(),
            &KnownDimensions::default(),
            &DimensionConfig::default(),
            Utc::now(),
        );
        let p = &outcome.proposals[0];
        // 3 observations, 2 users, defaults: freq_ref 10, repro_ref 4.
        let frequency: f64 = 0.3;
        let user_coverage: f64 = 0.5;
        let repeatability: f64 = 0.75; // (3/2)/2
        let reproducibility = (user_coverage + repeatability) / 2.0;
        let consistency = 1.0; // all integer, all cm
        let expected_score = frequency * reproducibility * consistency * 1.0;
        let expected_confidence = 0.4 * reproducibility + 0.35 * consistency + 0.25 * frequency;
        assert!((p.proposal_score - expected_score).abs() < 1e-9);
        assert!((p.confidence - expected_confidence).abs() < 1e-9);
    }
}
