/// Flywheel pipeline version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version tag for the key-hashing scheme. Changing the hash algorithm or
/// namespace layout invalidates all existing dedup history and is a breaking
/// migration, so the tag is part of every derived key.
pub const KEY_HASH_VERSION: &str = "v1";

/// Schema version strings carried by every persisted JSON payload.
/// Downstream consumers key off these; bump on any breaking shape change.
pub const CLUSTER_SCHEMA_VERSION: &str = "issue_cluster.v1";
pub const CALIBRATION_SCHEMA_VERSION: &str = "calibration_metric.v1";
pub const PROPOSAL_SCHEMA_VERSION: &str = "dimension_proposal.v1";
pub const CANDIDATE_SCHEMA_VERSION: &str = "backlog_candidate.v1";

/// Event types this pipeline consumes from the event store.
pub const EVENT_SIGNAL_LOGGED: &str = "learning.signal.logged";
pub const EVENT_OBSERVATION_LOGGED: &str = "observation.logged";
pub const EVENT_CLAIM_LOGGED: &str = "evidence.claim.logged";
pub const EVENT_RETRACTED: &str = "event.retracted";
pub const EVENT_SET_CORRECTED: &str = "set.corrected";
