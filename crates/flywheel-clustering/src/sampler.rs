//! SignalSampler: raw event rows → typed, validated samples.
//!
//! Pure function, no side effects. Malformed rows are rejected with a reason
//! code and counted by the caller; rejection never raises.

use chrono::{DateTime, Utc};
use serde_json::Value;

use flywheel_core::models::{
    ConfidenceBand, EventRow, LearningSignalSample, RejectReason, SignalCategory,
};

/// Parse one event row into a sample, or reject it with a reason.
///
/// Low-confidence samples are dropped unless `include_low_confidence` is set.
pub fn parse_sample(
    row: &EventRow,
    include_low_confidence: bool,
) -> Result<LearningSignalSample, RejectReason> {
    let data = match &row.data {
        Value::Object(map) => map,
        _ => return Err(RejectReason::InvalidPayload),
    };

    let category = data
        .get("category")
        .and_then(Value::as_str)
        .and_then(parse_category)
        .ok_or(RejectReason::InvalidPayload)?;
    let signal_type = data
        .get("signal_type")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(RejectReason::InvalidPayload)?;

    let signature = match data.get("signature") {
        Some(Value::Object(map)) => map,
        _ => return Err(RejectReason::InvalidSignature),
    };
    let confidence_band = match signature.get("confidence_band") {
        Some(Value::String(band)) => parse_band(band).ok_or(RejectReason::InvalidSignature)?,
        None => ConfidenceBand::Medium,
        _ => return Err(RejectReason::InvalidSignature),
    };

    let user_ref = match data.get("user_ref") {
        Some(Value::Object(map)) => map,
        _ => return Err(RejectReason::InvalidUserRef),
    };

    let cluster_signature = signature
        .get("cluster_signature")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    let pseudonymized_user_id = user_ref
        .get("pseudonymized_user_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    let (cluster_signature, pseudonymized_user_id) = match (cluster_signature, pseudonymized_user_id)
    {
        (Some(sig), Some(user)) => (sig, user),
        _ => return Err(RejectReason::MissingClusterOrUserRef),
    };

    if confidence_band == ConfidenceBand::Low && !include_low_confidence {
        return Err(RejectReason::LowConfidenceFiltered);
    }

    // Event-level capture time wins over the row timestamp when present.
    let raw_ts = data
        .get("captured_at")
        .and_then(Value::as_str)
        .unwrap_or(&row.occurred_at);
    let captured_at = raw_ts
        .parse::<DateTime<Utc>>()
        .map_err(|_| RejectReason::InvalidTimestamp)?;

    let attributes = match data.get("attributes") {
        Some(Value::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    };

    Ok(LearningSignalSample {
        event_id: row.event_id.clone(),
        captured_at,
        cluster_signature: cluster_signature.to_string(),
        signal_type: signal_type.to_string(),
        category,
        confidence_band,
        pseudonymized_user_id: pseudonymized_user_id.to_string(),
        attributes,
    })
}

fn parse_category(s: &str) -> Option<SignalCategory> {
    match s {
        "friction_signal" => Some(SignalCategory::FrictionSignal),
        "quality_signal" => Some(SignalCategory::QualitySignal),
        "correction_signal" => Some(SignalCategory::CorrectionSignal),
        "outcome_signal" => Some(SignalCategory::OutcomeSignal),
        _ => None,
    }
}

fn parse_band(s: &str) -> Option<ConfidenceBand> {
    match s {
        "low" => Some(ConfidenceBand::Low),
        "medium" => Some(ConfidenceBand::Medium),
        "high" => Some(ConfidenceBand::High),
        _ => None,
    }
}
