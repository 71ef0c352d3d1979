//! Issue clusters: the ClusterBuilder output rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sample::ConfidenceBand;
use crate::period::PeriodGranularity;

/// The explainable score breakdown. Every factor is in `[0, 1]` and the
/// final score is their product, so a reviewer can see exactly which factor
/// suppressed or boosted a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactors {
    pub frequency: f64,
    pub severity: f64,
    pub impact: f64,
    pub reproducibility: f64,
    pub user_coverage: f64,
    pub repeatability: f64,
}

/// A representative sample kept in the cluster payload for human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterExample {
    pub event_id: String,
    pub captured_at: DateTime<Utc>,
    pub confidence_band: ConfidenceBand,
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// False-positive-control telemetry. Dropped samples are counted here, never
/// silently discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FalsePositiveControls {
    pub total_samples: usize,
    pub counted_events: usize,
    pub dominance_dropped_events: usize,
    pub examples_truncated: usize,
}

/// JSON payload persisted in `learning_issue_clusters.cluster_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterData {
    pub schema_version: String,
    pub summary: String,
    pub score_factors: ScoreFactors,
    pub examples: Vec<ClusterExample>,
    pub false_positive_controls: FalsePositiveControls,
    /// Forward-compatibility escape hatch: unknown fields written by a newer
    /// producer survive a round-trip through this struct.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One identified issue cluster. Keyed by
/// `(period_granularity, period_key, cluster_signature)`; recomputed and
/// fully replaced each run, no independent lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueCluster {
    pub granularity: PeriodGranularity,
    pub period_key: String,
    pub cluster_signature: String,
    pub score: f64,
    pub event_count: usize,
    pub unique_users: usize,
    pub cluster_data: ClusterData,
    pub computed_at: DateTime<Utc>,
}
