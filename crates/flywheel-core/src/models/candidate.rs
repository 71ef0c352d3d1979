//! Backlog candidates: the uniform shape every source maps into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candidate lifecycle. Once a row reaches `approved` or `promoted` no later
/// run may downgrade it; only `dismissed` rows are eligible to reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Candidate,
    Approved,
    Dismissed,
    Promoted,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Candidate => "candidate",
            CandidateStatus::Approved => "approved",
            CandidateStatus::Dismissed => "dismissed",
            CandidateStatus::Promoted => "promoted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "candidate" => Some(CandidateStatus::Candidate),
            "approved" => Some(CandidateStatus::Approved),
            "dismissed" => Some(CandidateStatus::Dismissed),
            "promoted" => Some(CandidateStatus::Promoted),
            _ => None,
        }
    }
}

/// Which producer a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    IssueCluster,
    CalibrationDrift,
    UnknownDimension,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::IssueCluster => "issue_cluster",
            SourceType::CalibrationDrift => "calibration_drift",
            SourceType::UnknownDimension => "unknown_dimension",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "issue_cluster" => Some(SourceType::IssueCluster),
            "calibration_drift" => Some(SourceType::CalibrationDrift),
            "unknown_dimension" => Some(SourceType::UnknownDimension),
            _ => None,
        }
    }
}

/// Whether a checklist step is filled in by the pipeline or by a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Completed,
    Pending,
}

/// One step of the promotion workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistStep {
    pub id: String,
    pub kind: StepKind,
    pub state: StepState,
}

/// The fixed 6-step promotion workflow. The first three steps are `auto`:
/// the approval gate stays pending until a human records a decision, the
/// other two complete iff the candidate payload actually carries that
/// evidence. The last three are manual and stay pending until a human
/// finishes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionChecklist {
    pub steps: Vec<ChecklistStep>,
}

pub const CHECKLIST_STEP_IDS: [(&str, StepKind); 6] = [
    ("human_approval_gate", StepKind::Auto),
    ("root_cause_hypothesis_attached", StepKind::Auto),
    ("invariant_policy_mapping", StepKind::Auto),
    ("regression_test_plan", StepKind::Manual),
    ("regression_test_implementation", StepKind::Manual),
    ("shadow_re_evaluation", StepKind::Manual),
];

/// One backlog candidate, keyed by the stable hash of `source_type:source_ref`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningBacklogCandidate {
    pub candidate_key: String,
    pub source_type: SourceType,
    pub source_ref: String,
    pub status: CandidateStatus,
    pub priority_score: f64,
    pub title: String,
    pub root_cause_hypothesis: String,
    pub suggested_updates: Vec<String>,
    pub promotion_checklist: PromotionChecklist,
    /// Source-specific evidence payload, carries `schema_version`.
    pub issue_payload: serde_json::Value,
    /// The thresholds and caps that let this row through, for reviewers.
    pub guardrails: serde_json::Value,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}
