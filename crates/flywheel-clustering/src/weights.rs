//! Per-sample severity and impact weight tables.
//!
//! Severity is keyed by signal type; impact falls back to the broad category
//! when a signal type has no dedicated entry. `save_claim_mismatch_attempt`
//! additionally carries a mismatch-severity modifier multiplied into both
//! weights: the same signal type is not equally dangerous in every context.

use flywheel_core::models::{LearningSignalSample, SignalCategory};

const SEVERITY_BY_SIGNAL_TYPE: &[(&str, f64)] = &[
    ("save_claim_mismatch_attempt", 0.9),
    ("policy_violation_blocked", 0.8),
    ("extraction_gap", 0.7),
    ("retry_storm", 0.7),
    ("plan_adjustment_rejected", 0.6),
    ("session_abandoned", 0.6),
    ("manual_correction", 0.5),
    ("stale_projection_read", 0.4),
];

const DEFAULT_SEVERITY: f64 = 0.5;

const IMPACT_BY_SIGNAL_TYPE: &[(&str, f64)] = &[
    ("save_claim_mismatch_attempt", 0.86),
    ("policy_violation_blocked", 0.8),
    ("extraction_gap", 0.72),
    ("retry_storm", 0.6),
];

const IMPACT_BY_CATEGORY: &[(SignalCategory, f64)] = &[
    (SignalCategory::OutcomeSignal, 0.86),
    (SignalCategory::CorrectionSignal, 0.75),
    (SignalCategory::QualitySignal, 0.7),
    (SignalCategory::FrictionSignal, 0.6),
];

const MISMATCH_SIGNAL_TYPE: &str = "save_claim_mismatch_attempt";

/// Severity weight for one sample, in `[0, 1]`.
pub fn severity_weight(sample: &LearningSignalSample) -> f64 {
    let base = lookup(SEVERITY_BY_SIGNAL_TYPE, &sample.signal_type).unwrap_or(DEFAULT_SEVERITY);
    base * mismatch_modifier(sample)
}

/// Impact weight for one sample, in `[0, 1]`. Falls back to the category
/// table when the signal type has no dedicated entry.
pub fn impact_weight(sample: &LearningSignalSample) -> f64 {
    let base = lookup(IMPACT_BY_SIGNAL_TYPE, &sample.signal_type).unwrap_or_else(|| {
        IMPACT_BY_CATEGORY
            .iter()
            .find(|(cat, _)| *cat == sample.category)
            .map(|(_, w)| *w)
            .unwrap_or(0.5)
    });
    base * mismatch_modifier(sample)
}

/// Context modifier for claim-mismatch signals. Absent field means the base
/// weight stands; an explicit "none" zeroes the sample out.
fn mismatch_modifier(sample: &LearningSignalSample) -> f64 {
    if sample.signal_type != MISMATCH_SIGNAL_TYPE {
        return 1.0;
    }
    match sample
        .attributes
        .get("mismatch_severity")
        .and_then(|v| v.as_str())
    {
        Some("critical") => 1.0,
        Some("warning") => 0.5,
        Some("info") => 0.1,
        Some("none") => 0.0,
        Some(_) | None => 1.0,
    }
}

fn lookup(table: &[(&str, f64)], key: &str) -> Option<f64> {
    table.iter().find(|(k, _)| *k == key).map(|(_, w)| *w)
}
