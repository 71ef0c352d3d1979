//! Property tests: caps are hard limits, dedup never loses priority,
//! accounting over drops stays exact.

use chrono::Utc;
use proptest::prelude::*;

use flywheel_backlog::build_candidates;
use flywheel_core::config::BacklogConfig;
use flywheel_core::models::{
    ClusterData, FalsePositiveControls, IssueCluster, ScoreFactors,
};
use flywheel_core::period::PeriodGranularity;

fn cluster(signature: usize, score: f64, events: usize, users: usize) -> IssueCluster {
    IssueCluster {
        granularity: PeriodGranularity::Week,
        period_key: "2026-W34".to_string(),
        cluster_signature: format!("sig-{signature}"),
        score,
        event_count: events,
        unique_users: users,
        cluster_data: ClusterData {
            schema_version: "issue_cluster.v1".to_string(),
            summary: String::new(),
            score_factors: ScoreFactors {
                frequency: score,
                severity: 1.0,
                impact: 1.0,
                reproducibility: 1.0,
                user_coverage: 1.0,
                repeatability: 1.0,
            },
            examples: vec![],
            false_positive_controls: FalsePositiveControls {
                total_samples: events,
                counted_events: events,
                dominance_dropped_events: 0,
                examples_truncated: 0,
            },
            extra: serde_json::Map::new(),
        },
        computed_at: Utc::now(),
    }
}

proptest! {
    #[test]
    fn prop_caps_are_hard_limits(
        specs in prop::collection::vec((0usize..40, 0.0f64..1.0, 3usize..20, 2usize..8), 0..80),
        per_source in 1usize..10,
        per_run in 1usize..10,
    ) {
        let config = BacklogConfig {
            max_candidates_per_source: per_source,
            max_candidates_per_run: per_run,
            ..BacklogConfig::default()
        };
        let clusters: Vec<IssueCluster> = specs
            .iter()
            .map(|(sig, score, events, users)| cluster(*sig, *score, *events, *users))
            .collect();

        let outcome = build_candidates(&clusters, &[], &[], &config, Utc::now());
        prop_assert!(outcome.candidates.len() <= per_source.min(per_run));
        prop_assert_eq!(
            outcome.telemetry.candidates_out,
            outcome.candidates.len()
        );
    }

    #[test]
    fn prop_dedup_keeps_the_maximum_priority(
        scores in prop::collection::vec(0.1f64..1.0, 2..20)
    ) {
        let config = BacklogConfig::default();
        let clusters: Vec<IssueCluster> = scores
            .iter()
            .map(|score| cluster(0, *score, 6, 3))
            .collect();

        let outcome = build_candidates(&clusters, &[], &[], &config, Utc::now());
        prop_assert_eq!(outcome.candidates.len(), 1);
        let max = scores.iter().cloned().fold(f64::MIN, f64::max);
        prop_assert!((outcome.candidates[0].priority_score - max).abs() < 1e-12);
        prop_assert_eq!(outcome.telemetry.duplicates_in_run, scores.len() - 1);
    }

    #[test]
    fn prop_output_sorted_descending_by_priority(
        specs in prop::collection::vec((0usize..30, 0.1f64..1.0), 0..40)
    ) {
        let config = BacklogConfig::default();
        let clusters: Vec<IssueCluster> = specs
            .iter()
            .map(|(sig, score)| cluster(*sig, *score, 6, 3))
            .collect();

        let outcome = build_candidates(&clusters, &[], &[], &config, Utc::now());
        let scores: Vec<f64> = outcome.candidates.iter().map(|c| c.priority_score).collect();
        prop_assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }
}
