//! Property tests: Brier bounds, count accounting, drift history rule.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use flywheel_calibration::{apply_drift, bucket_metrics, LabeledClaim};
use flywheel_core::config::CalibrationConfig;
use flywheel_core::models::DriftStatus;

fn claim(day_offset: i64, confidence: f64, label: u8) -> LabeledClaim {
    LabeledClaim {
        captured_at: Utc.with_ymd_and_hms(2026, 8, 3, 10, 0, 0).unwrap()
            + chrono::Duration::days(day_offset),
        claim_class: "weight_kg".to_string(),
        parser_version: "p3".to_string(),
        confidence,
        label,
    }
}

proptest! {
    #[test]
    fn prop_brier_bounded_and_counts_add_up(
        samples in prop::collection::vec((0.0f64..=1.0, 0u8..=1), 1..50)
    ) {
        let claims: Vec<_> = samples
            .iter()
            .map(|(confidence, label)| claim(0, *confidence, *label))
            .collect();
        let metrics = bucket_metrics(&claims, &CalibrationConfig::default(), Utc::now());
        for metric in &metrics {
            prop_assert!((0.0..=1.0).contains(&metric.brier_score));
            prop_assert_eq!(
                metric.correct_count + metric.incorrect_count,
                metric.sample_count
            );
            if let Some(p) = metric.precision_high_conf {
                prop_assert!((0.0..=1.0).contains(&p));
            }
        }
    }

    #[test]
    fn prop_first_period_never_has_drift(
        samples in prop::collection::vec((0.0f64..=1.0, 0u8..=1), 1..30)
    ) {
        let claims: Vec<_> = samples
            .iter()
            .map(|(confidence, label)| claim(0, *confidence, *label))
            .collect();
        let mut metrics = bucket_metrics(&claims, &CalibrationConfig::default(), Utc::now());
        // No persisted history at all.
        apply_drift(&mut metrics, 0.05, |_, _, _, _| Ok(None)).unwrap();
        for metric in &metrics {
            prop_assert_eq!(metric.drift_status, DriftStatus::InsufficientHistory);
            prop_assert_eq!(metric.drift_delta_brier, None);
        }
    }
}
