//! Parsing of `observation.logged` rows.

use chrono::{DateTime, Utc};
use serde_json::Value;

use flywheel_core::models::{EventRow, ScopeLevel};

/// One validated observation. Malformed rows are skipped and counted by the
/// miner; parsing never raises.
#[derive(Debug, Clone)]
pub struct ObservationRecord {
    pub event_id: String,
    pub captured_at: DateTime<Utc>,
    pub dimension_raw: String,
    pub value: Value,
    pub unit: Option<String>,
    pub scope: ScopeLevel,
    pub context_text: Option<String>,
    pub tags: Vec<String>,
    pub pseudonymized_user_id: String,
}

pub fn parse_observation(row: &EventRow) -> Option<ObservationRecord> {
    let data = row.data.as_object()?;

    let dimension_raw = data
        .get("dimension")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())?
        .to_string();
    let value = data.get("value")?.clone();
    if value.is_null() {
        return None;
    }

    let scope = data
        .get("scope")
        .and_then(|s| s.get("level"))
        .and_then(Value::as_str)
        .and_then(ScopeLevel::parse)?;

    let pseudonymized_user_id = data
        .get("user_ref")
        .and_then(|u| u.get("pseudonymized_user_id"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?
        .to_string();

    let raw_ts = data
        .get("captured_at")
        .and_then(Value::as_str)
        .unwrap_or(&row.occurred_at);
    let captured_at = raw_ts.parse::<DateTime<Utc>>().ok()?;

    let unit = data
        .get("unit")
        .and_then(Value::as_str)
        .map(|u| u.trim().to_lowercase())
        .filter(|u| !u.is_empty());
    let context_text = data
        .get("context_text")
        .and_then(Value::as_str)
        .map(str::to_string);
    let tags = data
        .get("tags")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(ObservationRecord {
        event_id: row.event_id.clone(),
        captured_at,
        dimension_raw,
        value,
        unit,
        scope,
        context_text,
        tags,
        pseudonymized_user_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(data: serde_json::Value) -> EventRow {
        EventRow {
            event_id: "obs-1".to_string(),
            event_type: "observation.logged".to_string(),
            occurred_at: "2026-08-24T18:00:00Z".to_string(),
            data,
        }
    }

    #[test]
    fn parses_full_observation() {
        let record = parse_observation(&row(json!({
            "dimension": "grip_width",
            "value": 58,
            "unit": "CM",
            "scope": { "level": "set" },
            "context_text": "wide grip bench",
            "tags": ["bench", "grip"],
            "user_ref": { "pseudonymized_user_id": "u-1" }
        })))
        .unwrap();
        assert_eq!(record.scope, ScopeLevel::Set);
        assert_eq!(record.unit.as_deref(), Some("cm"));
        assert_eq!(record.tags.len(), 2);
    }

    #[test]
    fn missing_scope_level_is_skipped() {
        assert!(parse_observation(&row(json!({
            "dimension": "grip_width",
            "value": 58,
            "user_ref": { "pseudonymized_user_id": "u-1" }
        })))
        .is_none());
    }

    #[test]
    fn null_value_is_skipped() {
        assert!(parse_observation(&row(json!({
            "dimension": "grip_width",
            "value": null,
            "scope": { "level": "set" },
            "user_ref": { "pseudonymized_user_id": "u-1" }
        })))
        .is_none());
    }
}
