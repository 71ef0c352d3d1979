//! Per-table query modules.

pub mod backlog_ops;
pub mod calibration_ops;
pub mod cluster_ops;
pub mod proposal_ops;
pub mod registry_ops;
pub mod run_log;
