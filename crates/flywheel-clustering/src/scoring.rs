//! Explainable priority scoring.
//!
//! `priority_score = frequency × severity × impact × reproducibility`, every
//! factor in `[0, 1]`, so the product is bounded and each factor can be shown
//! to a reviewer as the reason a cluster ranked where it did.

use flywheel_core::config::ClusteringConfig;
use flywheel_core::models::ScoreFactors;

use crate::buckets::Bucket;
use crate::weights;

/// Compute the score factors for one surviving bucket.
pub fn score_bucket(bucket: &Bucket, config: &ClusteringConfig) -> ScoreFactors {
    let event_count = bucket.counted.len() as f64;
    let unique_users = bucket.unique_users.max(1) as f64;

    let frequency = (event_count / config.frequency_reference_count.max(1) as f64).min(1.0);

    let severity = mean(bucket.counted.iter().map(weights::severity_weight));
    let impact = mean(bucket.counted.iter().map(weights::impact_weight));

    let user_coverage =
        (unique_users / config.reproducibility_reference_users.max(1) as f64).min(1.0);
    let repeatability = ((event_count / unique_users) / 2.0).min(1.0);
    let reproducibility = (user_coverage + repeatability) / 2.0;

    ScoreFactors {
        frequency,
        severity,
        impact,
        reproducibility,
        user_coverage,
        repeatability,
    }
}

/// Final score: the product of the four factors, clamped to `[0, 1]`.
pub fn priority_score(factors: &ScoreFactors) -> f64 {
    (factors.frequency * factors.severity * factors.impact * factors.reproducibility)
        .clamp(0.0, 1.0)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
