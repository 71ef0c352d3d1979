//! Dimension-name normalization and semantic fingerprinting.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Prefixes users and agents prepend to ad-hoc dimensions. Stripping them
/// keeps `tmp_grip_width` and `grip_width` in the same cluster.
pub const PROVISIONAL_PREFIXES: &[&str] =
    &["tmp_", "temp_", "provisional_", "custom_", "x_", "new_"];

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "of", "in", "on", "for", "with", "and", "to", "at", "is", "was", "it",
    "this", "that", "per", "during", "after", "before", "my", "her", "his", "their",
];

fn non_alnum() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static regex"))
}

/// A normalized dimension name plus whether a provisional prefix was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionSeed {
    pub seed: String,
    pub had_provisional_prefix: bool,
}

/// Slugify a raw dimension name: lowercase, strip one provisional prefix,
/// collapse non-alphanumeric runs to `_`.
pub fn dimension_seed(raw: &str) -> DimensionSeed {
    let lowered = raw.trim().to_lowercase();
    let slug = non_alnum().replace_all(&lowered, "_");
    let slug = slug.trim_matches('_').to_string();

    for prefix in PROVISIONAL_PREFIXES {
        if let Some(stripped) = slug.strip_prefix(prefix) {
            if !stripped.is_empty() {
                return DimensionSeed {
                    seed: stripped.to_string(),
                    had_provisional_prefix: true,
                };
            }
        }
    }
    DimensionSeed {
        seed: slug,
        had_provisional_prefix: false,
    }
}

/// Top-4 ranked non-stopword tokens from dimension + context + tags.
///
/// Ranked by frequency, ties broken alphabetically, so the fingerprint is
/// deterministic. Carried as evidence only; clustering never keys on it.
pub fn semantic_fingerprint(texts: impl Iterator<Item = String>) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for text in texts {
        let lowered = text.to_lowercase();
        for token in non_alnum().split(&lowered) {
            if token.len() < 3 || STOPWORDS.contains(&token) {
                continue;
            }
            *counts.entry(token.to_string()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(4).map(|(token, _)| token).collect()
}
