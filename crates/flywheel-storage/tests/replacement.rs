//! Replacement semantics: a recompute clears every period its window covers,
//! including periods that produced no output rows this time.

use chrono::{Duration, Utc};

use flywheel_core::models::{ClusterData, FalsePositiveControls, IssueCluster, ScoreFactors};
use flywheel_core::period::{PeriodGranularity, PeriodKey};
use flywheel_storage::queries::cluster_ops;
use flywheel_storage::StorageEngine;

fn cluster(period_key: &str, signature: &str) -> IssueCluster {
    IssueCluster {
        granularity: PeriodGranularity::Week,
        period_key: period_key.to_string(),
        cluster_signature: signature.to_string(),
        score: 0.5,
        event_count: 6,
        unique_users: 3,
        cluster_data: ClusterData {
            schema_version: "issue_cluster.v1".to_string(),
            summary: String::new(),
            score_factors: ScoreFactors {
                frequency: 0.5,
                severity: 1.0,
                impact: 1.0,
                reproducibility: 1.0,
                user_coverage: 1.0,
                repeatability: 1.0,
            },
            examples: vec![],
            false_positive_controls: FalsePositiveControls {
                total_samples: 6,
                counted_events: 6,
                dominance_dropped_events: 0,
                examples_truncated: 0,
            },
            extra: serde_json::Map::new(),
        },
        computed_at: Utc::now(),
    }
}

fn cluster_count(engine: &StorageEngine) -> i64 {
    engine
        .with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM learning_issue_clusters", [], |row| {
                row.get(0)
            })
            .map_err(|e| flywheel_storage::to_storage_err(e.to_string()))
        })
        .unwrap()
}

#[test]
fn empty_recompute_clears_window_periods() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let now = Utc::now();
    let since = now - Duration::days(7);
    let window = PeriodKey::covering(PeriodGranularity::Week, since, now);
    let key = window[0].key.clone();

    engine
        .with_conn(|conn| cluster_ops::replace_clusters(conn, &window, &[cluster(&key, "sig-a")]))
        .unwrap();
    assert_eq!(cluster_count(&engine), 1);

    // The events behind that period are gone; the recompute emits nothing,
    // yet the stale row must not survive.
    engine
        .with_conn(|conn| cluster_ops::replace_clusters(conn, &window, &[]))
        .unwrap();
    assert_eq!(cluster_count(&engine), 0);
}

#[test]
fn periods_outside_the_window_keep_their_history() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let now = Utc::now();
    let since = now - Duration::days(7);
    let window = PeriodKey::covering(PeriodGranularity::Week, since, now);

    // Row from an old period no current window reaches.
    engine
        .with_conn(|conn| {
            cluster_ops::replace_clusters(
                conn,
                &[PeriodKey {
                    granularity: PeriodGranularity::Week,
                    key: "2020-W01".to_string(),
                }],
                &[cluster("2020-W01", "sig-old")],
            )
        })
        .unwrap();

    engine
        .with_conn(|conn| cluster_ops::replace_clusters(conn, &window, &[]))
        .unwrap();
    assert_eq!(cluster_count(&engine), 1);
}
