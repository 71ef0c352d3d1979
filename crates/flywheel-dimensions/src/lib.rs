//! # flywheel-dimensions
//!
//! UnknownDimensionMiner: clusters free-form `observation.logged` rows whose
//! dimension is not yet modeled, infers a candidate schema (type/unit/scale),
//! and scores proposal confidence. Risk notes are attached, never used to
//! silently suppress a proposal.

pub mod infer;
pub mod miner;
pub mod observation;
pub mod registry;
pub mod text;

pub use miner::{mine_proposals, MiningOutcome, MiningTelemetry};
pub use registry::KnownDimensions;
