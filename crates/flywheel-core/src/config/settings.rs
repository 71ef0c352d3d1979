use serde::{Deserialize, Serialize};

use super::defaults;

/// Read an env var as `usize`, clamped to `range`; default on absence or
/// parse failure. Misconfiguration must never abort the nightly run.
fn env_usize(key: &str, default: usize, range: (usize, usize)) -> usize {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_or(default, |v: usize| v.clamp(range.0, range.1)),
        Err(_) => default,
    }
}

fn env_i64(key: &str, default: i64, range: (i64, i64)) -> i64 {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_or(default, |v: i64| v.clamp(range.0, range.1)),
        Err(_) => default,
    }
}

fn env_f64(key: &str, default: f64, range: (f64, f64)) -> f64 {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_or(default, |v: f64| v.clamp(range.0, range.1)),
        Err(_) => default,
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Trailing read window shared by all phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// How many days of events each run reads (`FLYWHEEL_WINDOW_DAYS`).
    pub window_days: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_days: defaults::DEFAULT_WINDOW_DAYS,
        }
    }
}

/// ClusterBuilder thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Minimum events for a bucket to survive (`FLYWHEEL_MIN_SUPPORT`).
    pub min_support: usize,
    /// Minimum distinct users for a bucket to survive (`FLYWHEEL_MIN_UNIQUE_USERS`).
    pub min_unique_users: usize,
    /// Max counted samples per user per bucket (`FLYWHEEL_PER_USER_CAP`).
    pub per_user_cap: usize,
    /// Event count at which frequency saturates (`FLYWHEEL_FREQUENCY_REFERENCE_COUNT`).
    pub frequency_reference_count: usize,
    /// User count at which user coverage saturates
    /// (`FLYWHEEL_REPRODUCIBILITY_REFERENCE_USERS`).
    pub reproducibility_reference_users: usize,
    /// Keep low-confidence samples instead of rejecting them
    /// (`FLYWHEEL_INCLUDE_LOW_CONFIDENCE`).
    pub include_low_confidence: bool,
    /// Representative examples kept in the cluster payload
    /// (`FLYWHEEL_MAX_EXAMPLES_PER_CLUSTER`).
    pub max_examples_per_cluster: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_support: defaults::DEFAULT_MIN_SUPPORT,
            min_unique_users: defaults::DEFAULT_MIN_UNIQUE_USERS,
            per_user_cap: defaults::DEFAULT_PER_USER_CAP,
            frequency_reference_count: defaults::DEFAULT_FREQUENCY_REFERENCE_COUNT,
            reproducibility_reference_users: defaults::DEFAULT_REPRODUCIBILITY_REFERENCE_USERS,
            include_low_confidence: false,
            max_examples_per_cluster: defaults::DEFAULT_MAX_EXAMPLES_PER_CLUSTER,
        }
    }
}

/// CalibrationEngine thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Confidence floor for the high-confidence precision/recall slice
    /// (`FLYWHEEL_HIGH_CONF_THRESHOLD`).
    pub high_conf_threshold: f64,
    /// Brier score at or above which a stream is `monitor`
    /// (`FLYWHEEL_BRIER_MONITOR_MAX`).
    pub brier_monitor_max: f64,
    /// Brier score at or above which a stream is `degraded`
    /// (`FLYWHEEL_BRIER_DEGRADED_MAX`).
    pub brier_degraded_max: f64,
    /// Precision below which a stream is `monitor` (`FLYWHEEL_PRECISION_MONITOR_MIN`).
    pub precision_monitor_min: f64,
    /// Precision below which a stream is `degraded` (`FLYWHEEL_PRECISION_DEGRADED_MIN`).
    pub precision_degraded_min: f64,
    /// Sample count below which a stream cannot be `healthy`
    /// (`FLYWHEEL_CALIBRATION_MIN_SAMPLES`).
    pub min_samples: usize,
    /// Week-over-week Brier increase that raises a drift alert
    /// (`FLYWHEEL_DRIFT_ALERT_DELTA_BRIER`).
    pub drift_alert_delta_brier: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            high_conf_threshold: defaults::DEFAULT_HIGH_CONF_THRESHOLD,
            brier_monitor_max: defaults::DEFAULT_BRIER_MONITOR_MAX,
            brier_degraded_max: defaults::DEFAULT_BRIER_DEGRADED_MAX,
            precision_monitor_min: defaults::DEFAULT_PRECISION_MONITOR_MIN,
            precision_degraded_min: defaults::DEFAULT_PRECISION_DEGRADED_MIN,
            min_samples: defaults::DEFAULT_CALIBRATION_MIN_SAMPLES,
            drift_alert_delta_brier: defaults::DEFAULT_DRIFT_ALERT_DELTA_BRIER,
        }
    }
}

/// UnknownDimensionMiner thresholds. Shares the corroboration gates with
/// clustering by default but is independently tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionConfig {
    /// Minimum observations for a cluster to survive (`FLYWHEEL_DIM_MIN_SUPPORT`).
    pub min_support: usize,
    /// Minimum distinct users for a cluster to survive
    /// (`FLYWHEEL_DIM_MIN_UNIQUE_USERS`).
    pub min_unique_users: usize,
    /// Event count at which frequency saturates
    /// (`FLYWHEEL_DIM_FREQUENCY_REFERENCE_COUNT`).
    pub frequency_reference_count: usize,
    /// User count at which user coverage saturates
    /// (`FLYWHEEL_DIM_REPRODUCIBILITY_REFERENCE_USERS`).
    pub reproducibility_reference_users: usize,
    /// Confidence below which a `low_confidence` risk note is attached
    /// (`FLYWHEEL_DIM_LOW_CONFIDENCE_FLOOR`).
    pub low_confidence_floor: f64,
    /// Example observations kept in the evidence bundle
    /// (`FLYWHEEL_DIM_MAX_EXAMPLES`).
    pub max_examples_per_proposal: usize,
}

impl Default for DimensionConfig {
    fn default() -> Self {
        Self {
            min_support: defaults::DEFAULT_MIN_SUPPORT,
            min_unique_users: defaults::DEFAULT_MIN_UNIQUE_USERS,
            frequency_reference_count: defaults::DEFAULT_FREQUENCY_REFERENCE_COUNT,
            reproducibility_reference_users: defaults::DEFAULT_REPRODUCIBILITY_REFERENCE_USERS,
            low_confidence_floor: defaults::DEFAULT_LOW_CONFIDENCE_FLOOR,
            max_examples_per_proposal: defaults::DEFAULT_MAX_EXAMPLES_PER_PROPOSAL,
        }
    }
}

/// BacklogBridge noise floors and volume caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklogConfig {
    /// Minimum cluster score to become a candidate (`FLYWHEEL_MIN_CLUSTER_SCORE`).
    pub min_cluster_score: f64,
    /// Minimum cluster events (`FLYWHEEL_BACKLOG_MIN_CLUSTER_EVENTS`).
    pub min_cluster_events: usize,
    /// Minimum cluster users (`FLYWHEEL_BACKLOG_MIN_CLUSTER_USERS`).
    pub min_cluster_users: usize,
    /// Minimum calibration sample count (`FLYWHEEL_BACKLOG_MIN_CALIBRATION_SAMPLES`).
    pub min_calibration_samples: usize,
    /// Minimum proposal score (`FLYWHEEL_MIN_PROPOSAL_SCORE`).
    pub min_proposal_score: f64,
    /// Per-source cap (`FLYWHEEL_MAX_CANDIDATES_PER_SOURCE`).
    pub max_candidates_per_source: usize,
    /// Overall cap (`FLYWHEEL_MAX_CANDIDATES_PER_RUN`).
    pub max_candidates_per_run: usize,
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            min_cluster_score: defaults::DEFAULT_MIN_CLUSTER_SCORE,
            min_cluster_events: defaults::DEFAULT_MIN_SUPPORT,
            min_cluster_users: defaults::DEFAULT_MIN_UNIQUE_USERS,
            min_calibration_samples: defaults::DEFAULT_CALIBRATION_MIN_SAMPLES,
            min_proposal_score: defaults::DEFAULT_MIN_PROPOSAL_SCORE,
            max_candidates_per_source: defaults::DEFAULT_MAX_CANDIDATES_PER_SOURCE,
            max_candidates_per_run: defaults::DEFAULT_MAX_CANDIDATES_PER_RUN,
        }
    }
}

/// All pipeline configuration, built once per run and never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub window: WindowConfig,
    pub clustering: ClusteringConfig,
    pub calibration: CalibrationConfig,
    pub dimensions: DimensionConfig,
    pub backlog: BacklogConfig,
}

impl Settings {
    /// Build settings from the environment. Every threshold has a documented
    /// default and a clamped valid range; a bad value is silently replaced by
    /// its default rather than aborting the run.
    pub fn from_env() -> Self {
        Self {
            window: WindowConfig {
                window_days: env_i64(
                    "FLYWHEEL_WINDOW_DAYS",
                    defaults::DEFAULT_WINDOW_DAYS,
                    defaults::WINDOW_DAYS_RANGE,
                ),
            },
            clustering: ClusteringConfig {
                min_support: env_usize(
                    "FLYWHEEL_MIN_SUPPORT",
                    defaults::DEFAULT_MIN_SUPPORT,
                    defaults::MIN_SUPPORT_RANGE,
                ),
                min_unique_users: env_usize(
                    "FLYWHEEL_MIN_UNIQUE_USERS",
                    defaults::DEFAULT_MIN_UNIQUE_USERS,
                    defaults::MIN_UNIQUE_USERS_RANGE,
                ),
                per_user_cap: env_usize(
                    "FLYWHEEL_PER_USER_CAP",
                    defaults::DEFAULT_PER_USER_CAP,
                    defaults::PER_USER_CAP_RANGE,
                ),
                frequency_reference_count: env_usize(
                    "FLYWHEEL_FREQUENCY_REFERENCE_COUNT",
                    defaults::DEFAULT_FREQUENCY_REFERENCE_COUNT,
                    defaults::FREQUENCY_REFERENCE_COUNT_RANGE,
                ),
                reproducibility_reference_users: env_usize(
                    "FLYWHEEL_REPRODUCIBILITY_REFERENCE_USERS",
                    defaults::DEFAULT_REPRODUCIBILITY_REFERENCE_USERS,
                    defaults::REPRODUCIBILITY_REFERENCE_USERS_RANGE,
                ),
                include_low_confidence: env_bool("FLYWHEEL_INCLUDE_LOW_CONFIDENCE", false),
                max_examples_per_cluster: env_usize(
                    "FLYWHEEL_MAX_EXAMPLES_PER_CLUSTER",
                    defaults::DEFAULT_MAX_EXAMPLES_PER_CLUSTER,
                    defaults::MAX_EXAMPLES_PER_CLUSTER_RANGE,
                ),
            },
            calibration: CalibrationConfig {
                high_conf_threshold: env_f64(
                    "FLYWHEEL_HIGH_CONF_THRESHOLD",
                    defaults::DEFAULT_HIGH_CONF_THRESHOLD,
                    defaults::HIGH_CONF_THRESHOLD_RANGE,
                ),
                brier_monitor_max: env_f64(
                    "FLYWHEEL_BRIER_MONITOR_MAX",
                    defaults::DEFAULT_BRIER_MONITOR_MAX,
                    defaults::BRIER_RANGE,
                ),
                brier_degraded_max: env_f64(
                    "FLYWHEEL_BRIER_DEGRADED_MAX",
                    defaults::DEFAULT_BRIER_DEGRADED_MAX,
                    defaults::BRIER_RANGE,
                ),
                precision_monitor_min: env_f64(
                    "FLYWHEEL_PRECISION_MONITOR_MIN",
                    defaults::DEFAULT_PRECISION_MONITOR_MIN,
                    defaults::PRECISION_RANGE,
                ),
                precision_degraded_min: env_f64(
                    "FLYWHEEL_PRECISION_DEGRADED_MIN",
                    defaults::DEFAULT_PRECISION_DEGRADED_MIN,
                    defaults::PRECISION_RANGE,
                ),
                min_samples: env_usize(
                    "FLYWHEEL_CALIBRATION_MIN_SAMPLES",
                    defaults::DEFAULT_CALIBRATION_MIN_SAMPLES,
                    defaults::CALIBRATION_MIN_SAMPLES_RANGE,
                ),
                drift_alert_delta_brier: env_f64(
                    "FLYWHEEL_DRIFT_ALERT_DELTA_BRIER",
                    defaults::DEFAULT_DRIFT_ALERT_DELTA_BRIER,
                    defaults::DRIFT_ALERT_DELTA_BRIER_RANGE,
                ),
            },
            dimensions: DimensionConfig {
                min_support: env_usize(
                    "FLYWHEEL_DIM_MIN_SUPPORT",
                    defaults::DEFAULT_MIN_SUPPORT,
                    defaults::MIN_SUPPORT_RANGE,
                ),
                min_unique_users: env_usize(
                    "FLYWHEEL_DIM_MIN_UNIQUE_USERS",
                    defaults::DEFAULT_MIN_UNIQUE_USERS,
                    defaults::MIN_UNIQUE_USERS_RANGE,
                ),
                frequency_reference_count: env_usize(
                    "FLYWHEEL_DIM_FREQUENCY_REFERENCE_COUNT",
                    defaults::DEFAULT_FREQUENCY_REFERENCE_COUNT,
                    defaults::FREQUENCY_REFERENCE_COUNT_RANGE,
                ),
                reproducibility_reference_users: env_usize(
                    "FLYWHEEL_DIM_REPRODUCIBILITY_REFERENCE_USERS",
                    defaults::DEFAULT_REPRODUCIBILITY_REFERENCE_USERS,
                    defaults::REPRODUCIBILITY_REFERENCE_USERS_RANGE,
                ),
                low_confidence_floor: env_f64(
                    "FLYWHEEL_DIM_LOW_CONFIDENCE_FLOOR",
                    defaults::DEFAULT_LOW_CONFIDENCE_FLOOR,
                    defaults::LOW_CONFIDENCE_FLOOR_RANGE,
                ),
                max_examples_per_proposal: env_usize(
                    "FLYWHEEL_DIM_MAX_EXAMPLES",
                    defaults::DEFAULT_MAX_EXAMPLES_PER_PROPOSAL,
                    defaults::MAX_EXAMPLES_PER_PROPOSAL_RANGE,
                ),
            },
            backlog: BacklogConfig {
                min_cluster_score: env_f64(
                    "FLYWHEEL_MIN_CLUSTER_SCORE",
                    defaults::DEFAULT_MIN_CLUSTER_SCORE,
                    defaults::MIN_CLUSTER_SCORE_RANGE,
                ),
                min_cluster_events: env_usize(
                    "FLYWHEEL_BACKLOG_MIN_CLUSTER_EVENTS",
                    defaults::DEFAULT_MIN_SUPPORT,
                    defaults::MIN_SUPPORT_RANGE,
                ),
                min_cluster_users: env_usize(
                    "FLYWHEEL_BACKLOG_MIN_CLUSTER_USERS",
                    defaults::DEFAULT_MIN_UNIQUE_USERS,
                    defaults::MIN_UNIQUE_USERS_RANGE,
                ),
                min_calibration_samples: env_usize(
                    "FLYWHEEL_BACKLOG_MIN_CALIBRATION_SAMPLES",
                    defaults::DEFAULT_CALIBRATION_MIN_SAMPLES,
                    defaults::CALIBRATION_MIN_SAMPLES_RANGE,
                ),
                min_proposal_score: env_f64(
                    "FLYWHEEL_MIN_PROPOSAL_SCORE",
                    defaults::DEFAULT_MIN_PROPOSAL_SCORE,
                    defaults::MIN_PROPOSAL_SCORE_RANGE,
                ),
                max_candidates_per_source: env_usize(
                    "FLYWHEEL_MAX_CANDIDATES_PER_SOURCE",
                    defaults::DEFAULT_MAX_CANDIDATES_PER_SOURCE,
                    defaults::MAX_CANDIDATES_PER_SOURCE_RANGE,
                ),
                max_candidates_per_run: env_usize(
                    "FLYWHEEL_MAX_CANDIDATES_PER_RUN",
                    defaults::DEFAULT_MAX_CANDIDATES_PER_RUN,
                    defaults::MAX_CANDIDATES_PER_RUN_RANGE,
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; each test uses a distinct key so
    // they stay independent under the parallel test runner.

    #[test]
    fn unparsable_value_falls_back_to_default() {
        std::env::set_var("FLYWHEEL_TEST_BAD_USIZE", "not-a-number");
        assert_eq!(env_usize("FLYWHEEL_TEST_BAD_USIZE", 3, (1, 100)), 3);
    }

    #[test]
    fn out_of_range_value_is_clamped() {
        std::env::set_var("FLYWHEEL_TEST_BIG_USIZE", "9999");
        assert_eq!(env_usize("FLYWHEEL_TEST_BIG_USIZE", 3, (1, 100)), 100);
    }

    #[test]
    fn absent_value_uses_default() {
        assert_eq!(env_f64("FLYWHEEL_TEST_ABSENT_F64", 0.86, (0.5, 1.0)), 0.86);
    }

    #[test]
    fn bool_accepts_common_spellings() {
        std::env::set_var("FLYWHEEL_TEST_BOOL_YES", "Yes");
        std::env::set_var("FLYWHEEL_TEST_BOOL_ZERO", "0");
        assert!(env_bool("FLYWHEEL_TEST_BOOL_YES", false));
        assert!(!env_bool("FLYWHEEL_TEST_BOOL_ZERO", true));
    }

    #[test]
    fn default_settings_match_documented_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.window.window_days, 7);
        assert_eq!(settings.clustering.min_support, 3);
        assert_eq!(settings.clustering.min_unique_users, 2);
        assert_eq!(settings.clustering.per_user_cap, 3);
        assert!((settings.calibration.high_conf_threshold - 0.86).abs() < 1e-9);
    }
}
