//! ClusterBuilder: samples → buckets → filtered, scored, sorted clusters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use flywheel_core::config::ClusteringConfig;
use flywheel_core::constants::CLUSTER_SCHEMA_VERSION;
use flywheel_core::models::{
    ClusterData, ClusterExample, EventRow, FalsePositiveControls, IssueCluster,
};

use crate::buckets::{build_buckets, Bucket};
use crate::sampler;
use crate::scoring;

/// Counts for the audit row. Nothing dropped is dropped silently.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusteringTelemetry {
    pub total_events: usize,
    pub parsed_samples: usize,
    pub rejected: BTreeMap<String, usize>,
    pub buckets_total: usize,
    pub buckets_surviving: usize,
    pub dominance_dropped_events: usize,
}

#[derive(Debug, Clone)]
pub struct ClusteringOutcome {
    pub clusters: Vec<IssueCluster>,
    pub telemetry: ClusteringTelemetry,
}

/// Run the full clustering pass over one window of raw event rows.
pub fn build_clusters(
    rows: &[EventRow],
    config: &ClusteringConfig,
    now: DateTime<Utc>,
) -> ClusteringOutcome {
    let mut telemetry = ClusteringTelemetry {
        total_events: rows.len(),
        ..ClusteringTelemetry::default()
    };

    let mut samples = Vec::with_capacity(rows.len());
    for row in rows {
        match sampler::parse_sample(row, config.include_low_confidence) {
            Ok(sample) => samples.push(sample),
            Err(reason) => {
                *telemetry
                    .rejected
                    .entry(reason.as_str().to_string())
                    .or_insert(0) += 1;
            }
        }
    }
    telemetry.parsed_samples = samples.len();

    let buckets = build_buckets(&samples, config);
    telemetry.buckets_total = buckets.len();
    telemetry.dominance_dropped_events = buckets
        .iter()
        .filter(|b| b.key.granularity == flywheel_core::period::PeriodGranularity::Day)
        .map(|b| b.dominance_dropped)
        .sum();

    let mut clusters = Vec::new();
    for bucket in &buckets {
        // Cross-user corroboration gates; boundary values pass.
        if bucket.counted.len() < config.min_support
            || bucket.unique_users < config.min_unique_users
        {
            debug!(
                signature = %bucket.key.cluster_signature,
                period = %bucket.key.period_key,
                events = bucket.counted.len(),
                users = bucket.unique_users,
                "bucket below corroboration gates, filtered"
            );
            continue;
        }
        clusters.push(bucket_to_cluster(bucket, config, now));
    }
    telemetry.buckets_surviving = clusters.len();

    clusters.sort_by(|a, b| {
        a.granularity
            .cmp(&b.granularity)
            .then_with(|| a.period_key.cmp(&b.period_key))
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| a.cluster_signature.cmp(&b.cluster_signature))
    });

    ClusteringOutcome {
        clusters,
        telemetry,
    }
}

fn bucket_to_cluster(
    bucket: &Bucket,
    config: &ClusteringConfig,
    now: DateTime<Utc>,
) -> IssueCluster {
    let factors = scoring::score_bucket(bucket, config);
    let score = scoring::priority_score(&factors);

    let keep = config.max_examples_per_cluster.min(bucket.counted.len());
    let examples: Vec<ClusterExample> = bucket
        .counted
        .iter()
        .take(keep)
        .map(|s| ClusterExample {
            event_id: s.event_id.clone(),
            captured_at: s.captured_at,
            confidence_band: s.confidence_band,
            attributes: s.attributes.clone(),
        })
        .collect();

    let summary = format!(
        "{} events from {} users matched signature '{}' in {} {}",
        bucket.counted.len(),
        bucket.unique_users,
        bucket.key.cluster_signature,
        bucket.key.granularity.as_str(),
        bucket.key.period_key,
    );

    IssueCluster {
        granularity: bucket.key.granularity,
        period_key: bucket.key.period_key.clone(),
        cluster_signature: bucket.key.cluster_signature.clone(),
        score,
        event_count: bucket.counted.len(),
        unique_users: bucket.unique_users,
        cluster_data: ClusterData {
            schema_version: CLUSTER_SCHEMA_VERSION.to_string(),
            summary,
            score_factors: factors,
            examples,
            false_positive_controls: FalsePositiveControls {
                total_samples: bucket.total_samples,
                counted_events: bucket.counted.len(),
                dominance_dropped_events: bucket.dominance_dropped,
                examples_truncated: bucket.counted.len() - keep,
            },
            extra: serde_json::Map::new(),
        },
        computed_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flywheel_core::period::PeriodGranularity;
    use serde_json::json;

    fn signal_row(event_id: &str, user: &str, signature: &str, hour: u32) -> EventRow {
        EventRow {
            event_id: event_id.to_string(),
            event_type: "learning.signal.logged".to_string(),
            occurred_at: format!("2026-08-24T{hour:02}:00:00Z"),
            data: json!({
                "category": "quality_signal",
                "signal_type": "extraction_gap",
                "signature": {
                    "cluster_signature": signature,
                    "confidence_band": "high"
                },
                "user_ref": { "pseudonymized_user_id": user }
            }),
        }
    }

    fn rows_meeting_gates() -> Vec<EventRow> {
        vec![
            signal_row("e1", "u1", "sig-a", 1),
            signal_row("e2", "u2", "sig-a", 2),
            signal_row("e3", "u1", "sig-a", 3),
        ]
    }

    #[test]
    fn boundary_at_thresholds_passes() {
        // Exactly min_support=3 events and min_unique_users=2 users.
        let outcome = build_clusters(&rows_meeting_gates(), &ClusteringConfig::default(), Utc::now());
        assert_eq!(outcome.clusters.len(), 2); // day + week
        for cluster in &outcome.clusters {
            assert_eq!(cluster.event_count, 3);
            assert_eq!(cluster.unique_users, 2);
        }
    }

    #[test]
    fn single_user_noise_is_blocked() {
        let rows = vec![
            signal_row("e1", "u1", "sig-a", 1),
            signal_row("e2", "u1", "sig-a", 2),
            signal_row("e3", "u1", "sig-a", 3),
        ];
        let outcome = build_clusters(&rows, &ClusteringConfig::default(), Utc::now());
        assert!(outcome.clusters.is_empty());
    }

    #[test]
    fn rejects_are_counted_by_reason() {
        let mut rows = rows_meeting_gates();
        rows.push(EventRow {
            event_id: "bad".to_string(),
            event_type: "learning.signal.logged".to_string(),
            occurred_at: "2026-08-24T09:00:00Z".to_string(),
            data: json!([1, 2, 3]),
        });
        let outcome = build_clusters(&rows, &ClusteringConfig::default(), Utc::now());
        assert_eq!(outcome.telemetry.rejected.get("invalid_payload"), Some(&1));
        assert_eq!(outcome.telemetry.parsed_samples, 3);
    }

    #[test]
    fn output_is_sorted_by_granularity_period_then_score_desc() {
        let mut rows = rows_meeting_gates();
        // Second, weaker signature in the same window.
        rows.extend([
            signal_row("f1", "u1", "sig-b", 4),
            signal_row("f2", "u2", "sig-b", 5),
            signal_row("f3", "u3", "sig-b", 6),
            signal_row("f4", "u3", "sig-b", 7),
        ]);
        let outcome = build_clusters(&rows, &ClusteringConfig::default(), Utc::now());
        let days: Vec<_> = outcome
            .clusters
            .iter()
            .filter(|c| c.granularity == PeriodGranularity::Day)
            .collect();
        assert_eq!(days.len(), 2);
        assert!(days[0].score >= days[1].score);
        let weeks: Vec<_> = outcome
            .clusters
            .iter()
            .filter(|c| c.granularity == PeriodGranularity::Week)
            .collect();
        assert_eq!(weeks.len(), 2);
    }

    #[test]
    fn cluster_payload_carries_schema_version_and_controls() {
        let outcome = build_clusters(&rows_meeting_gates(), &ClusteringConfig::default(), Utc::now());
        let cluster = &outcome.clusters[0];
        assert_eq!(cluster.cluster_data.schema_version, CLUSTER_SCHEMA_VERSION);
        let controls = &cluster.cluster_data.false_positive_controls;
        assert_eq!(
            controls.counted_events + controls.dominance_dropped_events,
            controls.total_samples
        );
    }
}
