//! Validated in-memory learning-signal samples.
//!
//! Samples are ephemeral: rebuilt every run from the trailing event window
//! and never persisted as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream confidence band attached to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::Low => "low",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::High => "high",
        }
    }
}

/// Broad signal category, used as the impact-weight fallback when a signal
/// type has no dedicated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    FrictionSignal,
    QualitySignal,
    CorrectionSignal,
    OutcomeSignal,
}

impl SignalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::FrictionSignal => "friction_signal",
            SignalCategory::QualitySignal => "quality_signal",
            SignalCategory::CorrectionSignal => "correction_signal",
            SignalCategory::OutcomeSignal => "outcome_signal",
        }
    }
}

/// One corroborated observation of friction/quality/outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningSignalSample {
    pub event_id: String,
    pub captured_at: DateTime<Utc>,
    /// Pre-computed stable string identifying the recurring issue pattern.
    pub cluster_signature: String,
    pub signal_type: String,
    pub category: SignalCategory,
    pub confidence_band: ConfidenceBand,
    /// One-way hash; the raw user id never enters this pipeline.
    pub pseudonymized_user_id: String,
    /// Free-form attributes (e.g. `mismatch_severity`), passed through untouched.
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Why a raw event row was not turned into a sample. Rejections are data,
/// not errors: they are counted per reason and never abort the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InvalidPayload,
    InvalidSignature,
    InvalidUserRef,
    MissingClusterOrUserRef,
    LowConfidenceFiltered,
    InvalidTimestamp,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidPayload => "invalid_payload",
            RejectReason::InvalidSignature => "invalid_signature",
            RejectReason::InvalidUserRef => "invalid_user_ref",
            RejectReason::MissingClusterOrUserRef => "missing_cluster_or_user_ref",
            RejectReason::LowConfidenceFiltered => "low_confidence_filtered",
            RejectReason::InvalidTimestamp => "invalid_timestamp",
        }
    }
}
