//! Week-over-week (and day-over-day) drift detection.
//!
//! Drift is computed strictly against the immediately preceding period of
//! the same stream key `(granularity, claim_class, parser_version)`, never a
//! global baseline. A stream's first observed period stays
//! `insufficient_history`, deliberately indistinguishable from "not enough
//! samples yet".

use std::collections::HashMap;

use tracing::info;

use flywheel_core::errors::FlywheelResult;
use flywheel_core::models::{CalibrationMetric, DriftStatus};
use flywheel_core::period::{PeriodGranularity, PeriodKey};

/// Fill in drift status for freshly computed metrics.
///
/// The preceding period is looked up first among the metrics computed this
/// run (windows usually span several periods), then through `prior_lookup`
/// for periods persisted by earlier runs.
pub fn apply_drift<F>(
    metrics: &mut [CalibrationMetric],
    drift_alert_delta_brier: f64,
    mut prior_lookup: F,
) -> FlywheelResult<()>
where
    F: FnMut(PeriodGranularity, &str, &str, &str) -> FlywheelResult<Option<f64>>,
{
    let current: HashMap<(PeriodGranularity, String, String, String), f64> = metrics
        .iter()
        .map(|m| {
            (
                (
                    m.granularity,
                    m.period_key.clone(),
                    m.claim_class.clone(),
                    m.parser_version.clone(),
                ),
                m.brier_score,
            )
        })
        .collect();

    let mut alerts = 0usize;
    for metric in metrics.iter_mut() {
        let period = PeriodKey {
            granularity: metric.granularity,
            key: metric.period_key.clone(),
        };
        let Some(previous) = period.previous() else {
            continue;
        };

        let prior_brier = match current.get(&(
            metric.granularity,
            previous.key.clone(),
            metric.claim_class.clone(),
            metric.parser_version.clone(),
        )) {
            Some(brier) => Some(*brier),
            None => prior_lookup(
                metric.granularity,
                &previous.key,
                &metric.claim_class,
                &metric.parser_version,
            )?,
        };

        match prior_brier {
            None => {
                metric.drift_status = DriftStatus::InsufficientHistory;
                metric.drift_delta_brier = None;
            }
            Some(prior) => {
                let delta = metric.brier_score - prior;
                metric.drift_delta_brier = Some(delta);
                metric.drift_status = if delta >= drift_alert_delta_brier {
                    alerts += 1;
                    DriftStatus::DriftAlert
                } else {
                    DriftStatus::Stable
                };
            }
        }
    }

    if alerts > 0 {
        info!(alerts, "calibration drift alerts raised");
    }
    Ok(())
}
