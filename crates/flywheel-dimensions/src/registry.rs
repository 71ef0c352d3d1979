//! Known-dimension registry.
//!
//! Dimensions already modeled by the projection handlers never become
//! proposals. The built-in list covers the core training schema; rows from
//! the optional `dimension_registry` table extend it at runtime.

use std::collections::HashSet;

use crate::text::dimension_seed;

/// Dimensions the core schema already models, by seed form.
const BUILTIN_DIMENSIONS: &[&str] = &[
    "weight_kg",
    "reps",
    "sets",
    "rpe",
    "rir",
    "rest_seconds",
    "tempo",
    "duration_seconds",
    "distance_m",
    "heart_rate_bpm",
    "calories_kcal",
    "protein_g",
    "carbs_g",
    "fat_g",
    "bodyweight_kg",
    "sleep_hours",
    "soreness",
    "session_rating",
];

/// The combined known-dimension set, matched by seed so near-duplicate
/// spellings of a modeled dimension are filtered too.
#[derive(Debug, Clone)]
pub struct KnownDimensions {
    seeds: HashSet<String>,
}

impl KnownDimensions {
    /// Built-in list plus dimensions registered at runtime.
    pub fn with_registered(registered: &[String]) -> Self {
        let mut seeds: HashSet<String> = BUILTIN_DIMENSIONS
            .iter()
            .map(|d| dimension_seed(d).seed)
            .collect();
        seeds.extend(registered.iter().map(|d| dimension_seed(d).seed));
        Self { seeds }
    }

    pub fn contains(&self, raw_dimension: &str) -> bool {
        self.seeds.contains(&dimension_seed(raw_dimension).seed)
    }
}

impl Default for KnownDimensions {
    fn default() -> Self {
        Self::with_registered(&[])
    }
}
