//! Raw event-store rows as the collaborator writes them.

use serde::{Deserialize, Serialize};

/// One row from the append-only event store. `occurred_at` is kept as the
/// raw string so a malformed timestamp can be rejected with a reason code
/// instead of failing deserialization of the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub event_id: String,
    pub event_type: String,
    pub occurred_at: String,
    pub data: serde_json::Value,
}
