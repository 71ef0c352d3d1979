//! # flywheel-calibration
//!
//! CalibrationEngine: labels `evidence.claim.logged` records against later
//! retractions/corrections, computes per-`(period, claim_class,
//! parser_version)` Brier/precision/recall metrics, and flags drift against
//! the immediately preceding period of the same stream.

pub mod drift;
pub mod labeling;
pub mod metrics;

pub use drift::apply_drift;
pub use labeling::{build_labeled_claims, LabeledClaim, LabelingTelemetry};
pub use metrics::bucket_metrics;
