//! Schema inference over one cluster of observations.

use std::collections::BTreeMap;

use serde_json::Value;

use flywheel_core::models::{NumericRange, ValueType};

use crate::observation::ObservationRecord;

/// The inferred shape of a cluster's values.
#[derive(Debug, Clone)]
pub struct InferredSchema {
    pub value_type: ValueType,
    pub type_consistency: f64,
    pub unit: Option<String>,
    pub unit_consistency: f64,
    pub numeric_range: Option<NumericRange>,
    pub value_type_counts: BTreeMap<String, usize>,
    pub unit_counts: BTreeMap<String, usize>,
}

/// Classify one observed value.
pub fn classify_value(value: &Value) -> ValueType {
    match value {
        Value::Bool(_) => ValueType::Boolean,
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                ValueType::Integer
            } else {
                ValueType::Number
            }
        }
        // Numeric strings count as numbers; users type "58" into free text.
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.parse::<i64>().is_ok() {
                ValueType::Integer
            } else if trimmed.parse::<f64>().is_ok() {
                ValueType::Number
            } else if matches!(trimmed.to_lowercase().as_str(), "true" | "false" | "yes" | "no") {
                ValueType::Boolean
            } else {
                ValueType::Text
            }
        }
        _ => ValueType::Text,
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Infer the dominant value type and unit for a cluster.
///
/// Integers count toward a dominant `number` type (an all-integer cluster
/// stays `integer`; a mix of integers and floats is `number`, not mixed).
/// Unit consistency is measured over unit-bearing observations only; a
/// cluster where nobody supplied a unit is consistently unitless.
pub fn infer_schema(observations: &[&ObservationRecord]) -> InferredSchema {
    let total = observations.len().max(1);

    let mut value_type_counts: BTreeMap<String, usize> = BTreeMap::new();
    for obs in observations {
        let vt = classify_value(&obs.value);
        *value_type_counts.entry(vt.as_str().to_string()).or_insert(0) += 1;
    }

    let integers = *value_type_counts.get("integer").unwrap_or(&0);
    let floats = *value_type_counts.get("number").unwrap_or(&0);
    let numeric = integers + floats;
    let texts = *value_type_counts.get("text").unwrap_or(&0);
    let booleans = *value_type_counts.get("boolean").unwrap_or(&0);

    let (value_type, dominant_count) = if numeric >= texts && numeric >= booleans && numeric > 0 {
        let vt = if floats == 0 { ValueType::Integer } else { ValueType::Number };
        (vt, numeric)
    } else if texts >= booleans && texts > 0 {
        (ValueType::Text, texts)
    } else if booleans > 0 {
        (ValueType::Boolean, booleans)
    } else {
        (ValueType::Text, 0)
    };
    let type_consistency = dominant_count as f64 / total as f64;

    let mut unit_counts: BTreeMap<String, usize> = BTreeMap::new();
    for obs in observations {
        if let Some(unit) = &obs.unit {
            *unit_counts.entry(unit.clone()).or_insert(0) += 1;
        }
    }
    let unit_bearing: usize = unit_counts.values().sum();
    let (unit, unit_consistency) = if unit_bearing == 0 {
        (None, 1.0)
    } else {
        let (dominant_unit, count) = unit_counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(u, c)| (u.clone(), *c))
            .unwrap_or_default();
        (Some(dominant_unit), count as f64 / unit_bearing as f64)
    };

    let numeric_range = if matches!(value_type, ValueType::Number | ValueType::Integer) {
        let values: Vec<f64> = observations
            .iter()
            .filter_map(|obs| numeric_value(&obs.value))
            .collect();
        if values.is_empty() {
            None
        } else {
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            Some(NumericRange { min, max })
        }
    } else {
        None
    };

    InferredSchema {
        value_type,
        type_consistency,
        unit,
        unit_consistency,
        numeric_range,
        value_type_counts,
        unit_counts,
    }
}
