//! Unknown-dimension proposals mined from free-form observations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Proposal lifecycle. `dismissed` rows may resurface as `candidate` when new
/// evidence arrives; `accepted` and `promoted` are human decisions a later
/// run must never overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Candidate,
    Accepted,
    Dismissed,
    Promoted,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Candidate => "candidate",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Dismissed => "dismissed",
            ProposalStatus::Promoted => "promoted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "candidate" => Some(ProposalStatus::Candidate),
            "accepted" => Some(ProposalStatus::Accepted),
            "dismissed" => Some(ProposalStatus::Dismissed),
            "promoted" => Some(ProposalStatus::Promoted),
            _ => None,
        }
    }
}

/// Scope an observation was logged at. More granular scopes are costlier to
/// leave unmodeled, so `weight()` decreases from set to session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeLevel {
    Set,
    Exercise,
    Session,
}

impl ScopeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeLevel::Set => "set",
            ScopeLevel::Exercise => "exercise",
            ScopeLevel::Session => "session",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "set" => Some(ScopeLevel::Set),
            "exercise" => Some(ScopeLevel::Exercise),
            "session" => Some(ScopeLevel::Session),
            _ => None,
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            ScopeLevel::Set => 1.0,
            ScopeLevel::Exercise => 0.86,
            ScopeLevel::Session => 0.72,
        }
    }
}

/// Inferred value type of an observed dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    Integer,
    Text,
    Boolean,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::Integer => "integer",
            ValueType::Text => "text",
            ValueType::Boolean => "boolean",
        }
    }
}

/// Observed numeric range, attached when the dominant type is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

/// The candidate schema inferred for an unknown dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedDimension {
    pub name: String,
    pub value_type: ValueType,
    pub unit: Option<String>,
    pub scale: Option<NumericRange>,
}

/// One example observation kept as evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationExample {
    pub event_id: String,
    pub dimension: String,
    pub value: serde_json::Value,
    pub unit: Option<String>,
    pub context_text: Option<String>,
}

/// Evidence backing a proposal: fingerprint tokens, examples, and the raw
/// value/unit histograms the inference ran on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub schema_version: String,
    pub semantic_fingerprint: Vec<String>,
    pub examples: Vec<ObservationExample>,
    pub value_type_counts: BTreeMap<String, usize>,
    pub unit_counts: BTreeMap<String, usize>,
    pub examples_truncated: usize,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Risk annotations. Attached, never used to silently suppress a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskNote {
    MixedValueTypes,
    InconsistentUnits,
    LowConfidence,
    ProvisionalPrefix,
}

impl RiskNote {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskNote::MixedValueTypes => "mixed_value_types",
            RiskNote::InconsistentUnits => "inconsistent_units",
            RiskNote::LowConfidence => "low_confidence",
            RiskNote::ProvisionalPrefix => "provisional_prefix",
        }
    }
}

/// One unknown-dimension proposal, keyed by the stable hash of its cluster
/// signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnknownDimensionProposal {
    pub proposal_key: String,
    pub cluster_signature: String,
    pub scope_level: ScopeLevel,
    pub dimension_seed: String,
    pub status: ProposalStatus,
    pub confidence: f64,
    pub proposal_score: f64,
    pub observation_count: usize,
    pub unique_users: usize,
    pub suggested_dimension: SuggestedDimension,
    pub evidence_bundle: EvidenceBundle,
    pub risk_notes: Vec<RiskNote>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}
