//! # flywheel-pipeline
//!
//! The nightly orchestrator. Runs clustering, calibration, dimension mining,
//! and the backlog bridge in order, each phase isolated so one failure never
//! aborts the night, and records one audit row per phase.

pub mod observability;
pub mod phases;
pub mod runner;

pub use runner::run_nightly;
