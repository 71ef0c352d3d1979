//! Extraction calibration metrics per `(period, claim_class, parser_version)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::period::PeriodGranularity;

/// Health of one calibration stream in one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationStatus {
    Healthy,
    Monitor,
    Degraded,
}

impl CalibrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationStatus::Healthy => "healthy",
            CalibrationStatus::Monitor => "monitor",
            CalibrationStatus::Degraded => "degraded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "healthy" => Some(CalibrationStatus::Healthy),
            "monitor" => Some(CalibrationStatus::Monitor),
            "degraded" => Some(CalibrationStatus::Degraded),
            _ => None,
        }
    }
}

/// Week-over-week drift verdict. Computed strictly against the immediately
/// preceding period of the same stream key, never a global baseline. The
/// first observed period of a stream is always `insufficient_history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatus {
    InsufficientHistory,
    Stable,
    DriftAlert,
}

impl DriftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftStatus::InsufficientHistory => "insufficient_history",
            DriftStatus::Stable => "stable",
            DriftStatus::DriftAlert => "drift_alert",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "insufficient_history" => Some(DriftStatus::InsufficientHistory),
            "stable" => Some(DriftStatus::Stable),
            "drift_alert" => Some(DriftStatus::DriftAlert),
            _ => None,
        }
    }
}

/// One calibration metric row. Keyed by
/// `(period_granularity, period_key, claim_class, parser_version)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationMetric {
    pub granularity: PeriodGranularity,
    pub period_key: String,
    pub claim_class: String,
    pub parser_version: String,
    pub sample_count: usize,
    pub correct_count: usize,
    pub incorrect_count: usize,
    /// Mean squared error between predicted confidence and outcome label.
    pub brier_score: f64,
    /// Precision over the `confidence >= high_conf_threshold` slice; `None`
    /// when that slice is empty.
    pub precision_high_conf: Option<f64>,
    pub recall_high_conf: Option<f64>,
    pub status: CalibrationStatus,
    pub drift_status: DriftStatus,
    /// Brier delta vs. the preceding period; `None` without history.
    pub drift_delta_brier: Option<f64>,
    pub computed_at: DateTime<Utc>,
}
