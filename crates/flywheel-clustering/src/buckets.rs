//! Day/week bucketing and the per-user dominance cap.

use std::collections::BTreeMap;

use flywheel_core::config::ClusteringConfig;
use flywheel_core::models::LearningSignalSample;
use flywheel_core::period::{PeriodGranularity, PeriodKey};

/// Identity of one bucket: every sample lands in both its daily and weekly
/// bucket for the same signature.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BucketKey {
    pub granularity: PeriodGranularity,
    pub period_key: String,
    pub cluster_signature: String,
}

/// One assembled bucket after dominance capping. Dropped samples are counted,
/// never silently discarded: `counted.len() + dominance_dropped == total_samples`.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub key: BucketKey,
    pub counted: Vec<LearningSignalSample>,
    pub unique_users: usize,
    pub total_samples: usize,
    pub dominance_dropped: usize,
}

/// Group samples into day and week buckets and apply the per-user cap.
///
/// Samples are ordered by `(captured_at, event_id)` before capping so the
/// same input always keeps the same representatives.
pub fn build_buckets(samples: &[LearningSignalSample], config: &ClusteringConfig) -> Vec<Bucket> {
    let mut grouped: BTreeMap<BucketKey, Vec<&LearningSignalSample>> = BTreeMap::new();
    for sample in samples {
        for granularity in PeriodGranularity::ALL {
            let period = PeriodKey::containing(granularity, sample.captured_at);
            let key = BucketKey {
                granularity,
                period_key: period.key,
                cluster_signature: sample.cluster_signature.clone(),
            };
            grouped.entry(key).or_default().push(sample);
        }
    }

    grouped
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by(|a, b| {
                a.captured_at
                    .cmp(&b.captured_at)
                    .then_with(|| a.event_id.cmp(&b.event_id))
            });

            let total_samples = members.len();
            let mut per_user: BTreeMap<&str, usize> = BTreeMap::new();
            let mut counted = Vec::new();
            let mut dominance_dropped = 0usize;

            for sample in members {
                let seen = per_user
                    .entry(sample.pseudonymized_user_id.as_str())
                    .or_insert(0);
                if *seen < config.per_user_cap {
                    *seen += 1;
                    counted.push(sample.clone());
                } else {
                    dominance_dropped += 1;
                }
            }

            let unique_users = per_user.len();
            Bucket {
                key,
                counted,
                unique_users,
                total_samples,
                dominance_dropped,
            }
        })
        .collect()
}
