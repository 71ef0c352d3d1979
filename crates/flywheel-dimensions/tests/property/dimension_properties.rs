//! Property tests: seeds stay in slug form, prefixed and bare names cluster
//! together, fingerprints stay bounded and order-independent.

use proptest::prelude::*;

use flywheel_dimensions::text::{dimension_seed, semantic_fingerprint, PROVISIONAL_PREFIXES};

proptest! {
    #[test]
    fn prop_seed_is_a_clean_slug(raw in ".*") {
        let seed = dimension_seed(&raw).seed;
        prop_assert!(seed
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        prop_assert!(!seed.starts_with('_'));
        prop_assert!(!seed.ends_with('_'));
        prop_assert!(!seed.contains("__"));
    }

    #[test]
    fn prop_unprefixed_seed_is_a_fixed_point(raw in ".*") {
        let first = dimension_seed(&raw);
        if !first.had_provisional_prefix {
            let second = dimension_seed(&first.seed);
            prop_assert_eq!(&second.seed, &first.seed);
            prop_assert!(!second.had_provisional_prefix);
        }
    }

    #[test]
    fn prop_prefixed_and_bare_names_share_a_seed(
        base in "[a-z][a-z0-9]{2,10}(_[a-z0-9]{1,6}){0,2}",
        prefix in prop::sample::select(PROVISIONAL_PREFIXES),
    ) {
        prop_assume!(!PROVISIONAL_PREFIXES.iter().any(|p| base.starts_with(p)));
        let bare = dimension_seed(&base);
        let prefixed = dimension_seed(&format!("{prefix}{base}"));
        prop_assert_eq!(prefixed.seed, bare.seed);
        prop_assert!(prefixed.had_provisional_prefix);
    }

    #[test]
    fn prop_fingerprint_tokens_are_bounded_and_distinct(
        texts in prop::collection::vec(".*", 0..12)
    ) {
        let fp = semantic_fingerprint(texts.into_iter());
        prop_assert!(fp.len() <= 4);
        for token in &fp {
            prop_assert!(token.len() >= 3);
            prop_assert!(token
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
        let mut deduped = fp.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), fp.len());
    }

    #[test]
    fn prop_fingerprint_ignores_input_order(
        texts in prop::collection::vec("[a-z ]{0,30}", 1..8)
    ) {
        let forward = semantic_fingerprint(texts.iter().cloned());
        let reversed = semantic_fingerprint(texts.iter().rev().cloned());
        prop_assert_eq!(forward, reversed);
    }
}
