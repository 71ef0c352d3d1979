//! Per-bucket calibration metrics and status thresholds.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use flywheel_core::config::CalibrationConfig;
use flywheel_core::models::{CalibrationMetric, CalibrationStatus, DriftStatus};
use flywheel_core::period::{PeriodGranularity, PeriodKey};

use crate::labeling::LabeledClaim;

/// Group labeled claims into `(granularity, period, claim_class,
/// parser_version)` buckets and compute metrics for each.
///
/// Drift fields are initialized to `insufficient_history` here; `apply_drift`
/// fills them in once prior-period scores are available.
pub fn bucket_metrics(
    labeled: &[LabeledClaim],
    config: &CalibrationConfig,
    now: DateTime<Utc>,
) -> Vec<CalibrationMetric> {
    let mut grouped: BTreeMap<(PeriodGranularity, String, String, String), Vec<&LabeledClaim>> =
        BTreeMap::new();
    for claim in labeled {
        for granularity in PeriodGranularity::ALL {
            let period = PeriodKey::containing(granularity, claim.captured_at);
            grouped
                .entry((
                    granularity,
                    period.key,
                    claim.claim_class.clone(),
                    claim.parser_version.clone(),
                ))
                .or_default()
                .push(claim);
        }
    }

    grouped
        .into_iter()
        .map(|((granularity, period_key, claim_class, parser_version), claims)| {
            let sample_count = claims.len();
            let correct_count = claims.iter().filter(|c| c.label == 1).count();
            let incorrect_count = sample_count - correct_count;

            let brier_score = claims
                .iter()
                .map(|c| {
                    let err = c.confidence - c.label as f64;
                    err * err
                })
                .sum::<f64>()
                / sample_count.max(1) as f64;

            let high_conf: Vec<_> = claims
                .iter()
                .filter(|c| c.confidence >= config.high_conf_threshold)
                .collect();
            let high_conf_correct = high_conf.iter().filter(|c| c.label == 1).count();
            let precision_high_conf = if high_conf.is_empty() {
                None
            } else {
                Some(high_conf_correct as f64 / high_conf.len() as f64)
            };
            let recall_high_conf = if correct_count == 0 {
                None
            } else {
                Some(high_conf_correct as f64 / correct_count as f64)
            };

            let status = classify(
                brier_score,
                precision_high_conf,
                sample_count,
                config,
            );

            CalibrationMetric {
                granularity,
                period_key,
                claim_class,
                parser_version,
                sample_count,
                correct_count,
                incorrect_count,
                brier_score,
                precision_high_conf,
                recall_high_conf,
                status,
                drift_status: DriftStatus::InsufficientHistory,
                drift_delta_brier: None,
                computed_at: now,
            }
        })
        .collect()
}

/// Status thresholds. A precision check only fires when the high-confidence
/// slice is non-empty; an empty slice alone never degrades a stream.
fn classify(
    brier: f64,
    precision: Option<f64>,
    sample_count: usize,
    config: &CalibrationConfig,
) -> CalibrationStatus {
    let precision_below = |floor: f64| precision.map(|p| p < floor).unwrap_or(false);

    if brier >= config.brier_degraded_max || precision_below(config.precision_degraded_min) {
        CalibrationStatus::Degraded
    } else if brier >= config.brier_monitor_max
        || precision_below(config.precision_monitor_min)
        || sample_count < config.min_samples
    {
        CalibrationStatus::Monitor
    } else {
        CalibrationStatus::Healthy
    }
}
