//! # flywheel-clustering
//!
//! SignalSampler + ClusterBuilder: parses raw `learning.signal.logged`
//! events into validated samples, groups them into day/week buckets by
//! cluster signature, applies per-user dominance caps, and computes an
//! explainable priority score per surviving bucket.

pub mod buckets;
pub mod builder;
pub mod sampler;
pub mod scoring;
pub mod weights;

pub use builder::{build_clusters, ClusteringOutcome, ClusteringTelemetry};
pub use sampler::parse_sample;
