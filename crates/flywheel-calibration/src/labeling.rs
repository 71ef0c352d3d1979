//! Outcome labeling for extraction claims.
//!
//! A claim gets `label = 0` when its originating event was later retracted,
//! or when the specific field it claimed was corrected; otherwise `label = 1`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use flywheel_core::models::EventRow;

/// One claim with its outcome label attached.
#[derive(Debug, Clone)]
pub struct LabeledClaim {
    pub captured_at: DateTime<Utc>,
    pub claim_class: String,
    pub parser_version: String,
    pub confidence: f64,
    /// 1 = claim held, 0 = retracted or corrected.
    pub label: u8,
}

/// Counts for the audit row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LabelingTelemetry {
    pub claims_total: usize,
    pub claims_skipped: usize,
    pub retractions: usize,
    pub corrections: usize,
    pub labeled_incorrect: usize,
}

/// Join claims against retraction and correction events.
pub fn build_labeled_claims(
    claim_rows: &[EventRow],
    retraction_rows: &[EventRow],
    correction_rows: &[EventRow],
) -> (Vec<LabeledClaim>, LabelingTelemetry) {
    let mut telemetry = LabelingTelemetry {
        claims_total: claim_rows.len(),
        retractions: retraction_rows.len(),
        corrections: correction_rows.len(),
        ..LabelingTelemetry::default()
    };

    let retracted: HashSet<&str> = retraction_rows
        .iter()
        .filter_map(|row| row.data.get("original_event_id").and_then(Value::as_str))
        .collect();

    // source event id → fields corrected on it.
    let mut corrected: HashMap<&str, HashSet<&str>> = HashMap::new();
    for row in correction_rows {
        let Some(original) = row.data.get("original_event_id").and_then(Value::as_str) else {
            continue;
        };
        let fields = corrected.entry(original).or_default();
        if let Some(list) = row.data.get("corrected_fields").and_then(Value::as_array) {
            fields.extend(list.iter().filter_map(Value::as_str));
        }
    }

    let mut labeled = Vec::with_capacity(claim_rows.len());
    for row in claim_rows {
        let Some(claim) = parse_claim(row) else {
            telemetry.claims_skipped += 1;
            continue;
        };

        let was_retracted = retracted.contains(claim.source_event_id.as_str());
        let was_corrected = claim
            .claimed_field
            .as_deref()
            .and_then(|field| corrected.get(claim.source_event_id.as_str()).map(|f| f.contains(field)))
            .unwrap_or(false);

        let label = if was_retracted || was_corrected { 0 } else { 1 };
        if label == 0 {
            telemetry.labeled_incorrect += 1;
        }
        labeled.push(LabeledClaim {
            captured_at: claim.captured_at,
            claim_class: claim.claim_class,
            parser_version: claim.parser_version,
            confidence: claim.confidence,
            label,
        });
    }

    (labeled, telemetry)
}

struct ParsedClaim {
    captured_at: DateTime<Utc>,
    claim_class: String,
    parser_version: String,
    confidence: f64,
    source_event_id: String,
    claimed_field: Option<String>,
}

fn parse_claim(row: &EventRow) -> Option<ParsedClaim> {
    let data = row.data.as_object()?;
    let claim_class = data.get("claim_class")?.as_str()?.to_string();
    let parser_version = data.get("parser_version")?.as_str()?.to_string();
    let confidence = data.get("confidence")?.as_f64()?;
    if !(0.0..=1.0).contains(&confidence) {
        return None;
    }
    let source_event_id = data.get("source_event_id")?.as_str()?.to_string();
    let claimed_field = data
        .get("claimed_field")
        .and_then(Value::as_str)
        .map(str::to_string);
    let raw_ts = data
        .get("captured_at")
        .and_then(Value::as_str)
        .unwrap_or(&row.occurred_at);
    let captured_at = raw_ts.parse::<DateTime<Utc>>().ok()?;
    Some(ParsedClaim {
        captured_at,
        claim_class,
        parser_version,
        confidence,
        source_event_id,
        claimed_field,
    })
}
