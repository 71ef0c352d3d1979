//! Documented defaults and valid ranges for every tunable threshold.
//!
//! Each constant pairs with an env var (see `settings.rs`). Values outside
//! the valid range are clamped; unparsable values fall back to the default.

// Trailing read window.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;
pub const WINDOW_DAYS_RANGE: (i64, i64) = (1, 90);

// Cross-user corroboration gates, shared by clustering and dimension mining.
pub const DEFAULT_MIN_SUPPORT: usize = 3;
pub const MIN_SUPPORT_RANGE: (usize, usize) = (1, 100);
pub const DEFAULT_MIN_UNIQUE_USERS: usize = 2;
pub const MIN_UNIQUE_USERS_RANGE: (usize, usize) = (1, 50);

// Per-user dominance cap within one bucket.
pub const DEFAULT_PER_USER_CAP: usize = 3;
pub const PER_USER_CAP_RANGE: (usize, usize) = (1, 50);

// Score normalization references.
pub const DEFAULT_FREQUENCY_REFERENCE_COUNT: usize = 10;
pub const FREQUENCY_REFERENCE_COUNT_RANGE: (usize, usize) = (1, 10_000);
pub const DEFAULT_REPRODUCIBILITY_REFERENCE_USERS: usize = 4;
pub const REPRODUCIBILITY_REFERENCE_USERS_RANGE: (usize, usize) = (1, 1_000);

// Representative-example payload caps.
pub const DEFAULT_MAX_EXAMPLES_PER_CLUSTER: usize = 5;
pub const MAX_EXAMPLES_PER_CLUSTER_RANGE: (usize, usize) = (1, 50);

// Calibration bands.
pub const DEFAULT_HIGH_CONF_THRESHOLD: f64 = 0.86;
pub const HIGH_CONF_THRESHOLD_RANGE: (f64, f64) = (0.5, 1.0);
pub const DEFAULT_BRIER_MONITOR_MAX: f64 = 0.15;
pub const DEFAULT_BRIER_DEGRADED_MAX: f64 = 0.25;
pub const BRIER_RANGE: (f64, f64) = (0.0, 1.0);
pub const DEFAULT_PRECISION_MONITOR_MIN: f64 = 0.85;
pub const DEFAULT_PRECISION_DEGRADED_MIN: f64 = 0.70;
pub const PRECISION_RANGE: (f64, f64) = (0.0, 1.0);
pub const DEFAULT_CALIBRATION_MIN_SAMPLES: usize = 10;
pub const CALIBRATION_MIN_SAMPLES_RANGE: (usize, usize) = (1, 10_000);
pub const DEFAULT_DRIFT_ALERT_DELTA_BRIER: f64 = 0.05;
pub const DRIFT_ALERT_DELTA_BRIER_RANGE: (f64, f64) = (0.001, 1.0);

// Dimension mining.
pub const DEFAULT_LOW_CONFIDENCE_FLOOR: f64 = 0.5;
pub const LOW_CONFIDENCE_FLOOR_RANGE: (f64, f64) = (0.0, 1.0);
pub const DEFAULT_MAX_EXAMPLES_PER_PROPOSAL: usize = 5;
pub const MAX_EXAMPLES_PER_PROPOSAL_RANGE: (usize, usize) = (1, 50);

// Backlog noise floors and volume caps.
pub const DEFAULT_MIN_CLUSTER_SCORE: f64 = 0.05;
pub const MIN_CLUSTER_SCORE_RANGE: (f64, f64) = (0.0, 1.0);
pub const DEFAULT_MIN_PROPOSAL_SCORE: f64 = 0.05;
pub const MIN_PROPOSAL_SCORE_RANGE: (f64, f64) = (0.0, 1.0);
pub const DEFAULT_MAX_CANDIDATES_PER_SOURCE: usize = 25;
pub const MAX_CANDIDATES_PER_SOURCE_RANGE: (usize, usize) = (1, 500);
pub const DEFAULT_MAX_CANDIDATES_PER_RUN: usize = 50;
pub const MAX_CANDIDATES_PER_RUN_RANGE: (usize, usize) = (1, 1_000);
