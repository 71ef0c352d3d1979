//! Nightly run reporting: one outcome per phase, mirrored into the audit table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Clustering,
    Calibration,
    Dimensions,
    Backlog,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::Clustering => "clustering",
            PipelinePhase::Calibration => "calibration",
            PipelinePhase::Dimensions => "dimensions",
            PipelinePhase::Backlog => "backlog",
        }
    }
}

/// A phase either completed, degraded to a no-op (target tables missing),
/// or failed with its error recorded. Failures never abort the other phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Success,
    Skipped,
    Failed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Success => "success",
            PhaseStatus::Skipped => "skipped",
            PhaseStatus::Failed => "failed",
        }
    }
}

/// What one phase did: status plus a counts/details blob for the audit row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: PipelinePhase,
    pub status: PhaseStatus,
    pub details: serde_json::Value,
}

/// Full report for one nightly invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightlyRunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub phases: Vec<PhaseOutcome>,
}
