//! # flywheel-core
//!
//! Foundation crate for the Flywheel learning-telemetry pipeline.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod keys;
pub mod models;
pub mod period;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::Settings;
pub use errors::{FlywheelError, FlywheelResult};
pub use models::{
    CalibrationMetric, IssueCluster, LearningBacklogCandidate, LearningSignalSample,
    UnknownDimensionProposal,
};
pub use period::{PeriodGranularity, PeriodKey};
