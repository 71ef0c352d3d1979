//! Seams between the pipeline and its collaborators.

use chrono::{DateTime, Utc};

use crate::errors::FlywheelResult;
use crate::models::EventRow;

/// Read-only access to the event store this pipeline consumes. The concrete
/// implementation lives in `flywheel-storage`; component crates only ever see
/// this trait so they stay testable with in-memory fixtures.
pub trait EventSource {
    /// All events of one type with `occurred_at >= since`, oldest first.
    fn events_by_type(&self, event_type: &str, since: DateTime<Utc>) -> FlywheelResult<Vec<EventRow>>;
}
