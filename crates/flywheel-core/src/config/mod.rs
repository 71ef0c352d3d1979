//! Run configuration.
//!
//! One immutable [`Settings`] is constructed per run (from env vars, or
//! `Settings::default()` in tests) and threaded through every component.
//! Scoring functions never read the environment themselves.

pub mod defaults;
mod settings;

pub use settings::{
    BacklogConfig, CalibrationConfig, ClusteringConfig, DimensionConfig, Settings, WindowConfig,
};
