//! The bridge itself: noise filters, dedup, and caps over the three sources.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use flywheel_core::config::BacklogConfig;
use flywheel_core::models::{
    CalibrationMetric, CalibrationStatus, IssueCluster, LearningBacklogCandidate, ProposalStatus,
    UnknownDimensionProposal,
};

use crate::builders;

/// Counts for the audit row. Dropped candidates are counted, never silently
/// discarded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BridgeTelemetry {
    pub clusters_in: usize,
    pub calibration_in: usize,
    pub proposals_in: usize,
    pub noise_filtered: usize,
    pub duplicates_in_run: usize,
    pub source_cap_overflow: usize,
    pub run_cap_overflow: usize,
    pub candidates_out: usize,
}

#[derive(Debug, Clone)]
pub struct BridgeOutcome {
    pub candidates: Vec<LearningBacklogCandidate>,
    pub telemetry: BridgeTelemetry,
}

/// Map the latest-week producer rows into a capped, deduplicated candidate
/// batch ready for the guarded upsert.
pub fn build_candidates(
    clusters: &[IssueCluster],
    metrics: &[CalibrationMetric],
    proposals: &[UnknownDimensionProposal],
    config: &BacklogConfig,
    now: DateTime<Utc>,
) -> BridgeOutcome {
    let mut telemetry = BridgeTelemetry {
        clusters_in: clusters.len(),
        calibration_in: metrics.len(),
        proposals_in: proposals.len(),
        ..BridgeTelemetry::default()
    };

    let mut raw: Vec<LearningBacklogCandidate> = Vec::new();

    for cluster in clusters {
        if cluster.score < config.min_cluster_score
            || cluster.event_count < config.min_cluster_events
            || cluster.unique_users < config.min_cluster_users
        {
            telemetry.noise_filtered += 1;
            continue;
        }
        raw.push(builders::from_cluster(cluster, config, now));
    }

    for metric in metrics {
        if metric.status == CalibrationStatus::Healthy
            || metric.sample_count < config.min_calibration_samples
        {
            telemetry.noise_filtered += 1;
            continue;
        }
        raw.push(builders::from_calibration(metric, config, now));
    }

    for proposal in proposals {
        if proposal.status != ProposalStatus::Accepted
            || proposal.proposal_score < config.min_proposal_score
        {
            telemetry.noise_filtered += 1;
            continue;
        }
        raw.push(builders::from_proposal(proposal, config, now));
    }

    // Dedup within the run: keep the highest-priority instance per key.
    let mut by_key: BTreeMap<String, LearningBacklogCandidate> = BTreeMap::new();
    for candidate in raw {
        match by_key.get(&candidate.candidate_key) {
            Some(existing) if existing.priority_score >= candidate.priority_score => {
                telemetry.duplicates_in_run += 1;
            }
            Some(_) => {
                telemetry.duplicates_in_run += 1;
                by_key.insert(candidate.candidate_key.clone(), candidate);
            }
            None => {
                by_key.insert(candidate.candidate_key.clone(), candidate);
            }
        }
    }

    // Per-source cap, descending priority with key as tiebreak so reruns
    // over identical input pick the same survivors.
    let mut per_source: BTreeMap<&'static str, Vec<LearningBacklogCandidate>> = BTreeMap::new();
    for candidate in by_key.into_values() {
        per_source
            .entry(candidate.source_type.as_str())
            .or_default()
            .push(candidate);
    }
    let mut pooled: Vec<LearningBacklogCandidate> = Vec::new();
    for (source, mut candidates) in per_source {
        sort_by_priority(&mut candidates);
        if candidates.len() > config.max_candidates_per_source {
            let overflow = candidates.len() - config.max_candidates_per_source;
            telemetry.source_cap_overflow += overflow;
            debug!(source, overflow, "per-source candidate cap applied");
            candidates.truncate(config.max_candidates_per_source);
        }
        pooled.extend(candidates);
    }

    sort_by_priority(&mut pooled);
    if pooled.len() > config.max_candidates_per_run {
        telemetry.run_cap_overflow = pooled.len() - config.max_candidates_per_run;
        pooled.truncate(config.max_candidates_per_run);
    }

    telemetry.candidates_out = pooled.len();
    BridgeOutcome {
        candidates: pooled,
        telemetry,
    }
}

fn sort_by_priority(candidates: &mut [LearningBacklogCandidate]) {
    candidates.sort_by(|a, b| {
        b.priority_score
            .total_cmp(&a.priority_score)
            .then_with(|| a.candidate_key.cmp(&b.candidate_key))
    });
}
