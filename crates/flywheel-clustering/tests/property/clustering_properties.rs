//! Property tests: dominance accounting, gate enforcement, score bounds.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use flywheel_clustering::build_clusters;
use flywheel_core::config::ClusteringConfig;
use flywheel_core::models::EventRow;

fn signal_row(event_id: usize, user: usize, signature: usize, minute: usize) -> EventRow {
    let ts = Utc.with_ymd_and_hms(2026, 8, 24, 0, 0, 0).unwrap()
        + chrono::Duration::minutes(minute as i64);
    EventRow {
        event_id: format!("e{event_id}"),
        event_type: "learning.signal.logged".to_string(),
        occurred_at: ts.to_rfc3339(),
        data: serde_json::json!({
            "category": "friction_signal",
            "signal_type": "retry_storm",
            "signature": {
                "cluster_signature": format!("sig-{signature}"),
                "confidence_band": "high"
            },
            "user_ref": { "pseudonymized_user_id": format!("u{user}") }
        }),
    }
}

proptest! {
    #[test]
    fn prop_no_cluster_below_gates(
        assignments in prop::collection::vec((0usize..6, 0usize..3), 1..60)
    ) {
        let config = ClusteringConfig::default();
        let rows: Vec<EventRow> = assignments
            .iter()
            .enumerate()
            .map(|(i, (user, signature))| signal_row(i, *user, *signature, i))
            .collect();

        let outcome = build_clusters(&rows, &config, Utc::now());
        for cluster in &outcome.clusters {
            prop_assert!(cluster.event_count >= config.min_support);
            prop_assert!(cluster.unique_users >= config.min_unique_users);
        }
    }

    #[test]
    fn prop_scores_bounded_and_accounting_exact(
        assignments in prop::collection::vec((0usize..4, 0usize..2), 1..80)
    ) {
        let config = ClusteringConfig::default();
        let rows: Vec<EventRow> = assignments
            .iter()
            .enumerate()
            .map(|(i, (user, signature))| signal_row(i, *user, *signature, i))
            .collect();

        let outcome = build_clusters(&rows, &config, Utc::now());
        for cluster in &outcome.clusters {
            prop_assert!((0.0..=1.0).contains(&cluster.score));
            let controls = &cluster.cluster_data.false_positive_controls;
            prop_assert_eq!(
                controls.counted_events + controls.dominance_dropped_events,
                controls.total_samples
            );
        }
    }

    #[test]
    fn prop_rerun_is_deterministic(
        assignments in prop::collection::vec((0usize..5, 0usize..3), 1..40)
    ) {
        let config = ClusteringConfig::default();
        let rows: Vec<EventRow> = assignments
            .iter()
            .enumerate()
            .map(|(i, (user, signature))| signal_row(i, *user, *signature, i))
            .collect();

        let now = Utc::now();
        let first = build_clusters(&rows, &config, now);
        let second = build_clusters(&rows, &config, now);
        prop_assert_eq!(
            serde_json::to_string(&first.clusters.iter().map(|c| (
                c.granularity,
                &c.period_key,
                &c.cluster_signature,
                c.score,
                c.event_count,
            )).collect::<Vec<_>>()).unwrap(),
            serde_json::to_string(&second.clusters.iter().map(|c| (
                c.granularity,
                &c.period_key,
                &c.cluster_signature,
                c.score,
                c.event_count,
            )).collect::<Vec<_>>()).unwrap()
        );
    }
}
