//! # flywheel-backlog
//!
//! BacklogBridge: converts the latest-week outputs of the clustering,
//! calibration, and dimension-mining phases into uniform backlog candidates
//! with a fixed promotion checklist, then filters, dedups, and caps them.

pub mod bridge;
pub mod builders;
pub mod checklist;

pub use bridge::{build_candidates, BridgeOutcome, BridgeTelemetry};
