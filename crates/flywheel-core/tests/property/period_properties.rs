//! Property tests for period-key math: every timestamp lands in exactly one
//! key per granularity, and `previous()` walks backwards without gaps.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use flywheel_core::period::{PeriodGranularity, PeriodKey};

fn arb_timestamp() -> impl Strategy<Value = chrono::DateTime<Utc>> {
    // 2020-01-01 .. 2035-01-01, second resolution.
    (0i64..473_385_600).prop_map(|offset| {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(offset)
    })
}

proptest! {
    #[test]
    fn prop_day_keys_are_iso_dates(ts in arb_timestamp()) {
        let key = PeriodKey::containing(PeriodGranularity::Day, ts);
        prop_assert_eq!(key.key.len(), 10);
        prop_assert_eq!(&key.key[..], ts.format("%Y-%m-%d").to_string());
    }

    #[test]
    fn prop_week_keys_have_the_iso_week_shape(ts in arb_timestamp()) {
        let key = PeriodKey::containing(PeriodGranularity::Week, ts);
        prop_assert_eq!(key.key.len(), 8);
        prop_assert_eq!(&key.key[4..6], "-W");
        let week: u32 = key.key[6..].parse().unwrap();
        prop_assert!((1..=53).contains(&week));
    }

    #[test]
    fn prop_previous_day_is_exactly_one_day_back(ts in arb_timestamp()) {
        let key = PeriodKey::containing(PeriodGranularity::Day, ts);
        let expected = PeriodKey::containing(PeriodGranularity::Day, ts - Duration::days(1));
        prop_assert_eq!(key.previous().map(|p| p.key), Some(expected.key));
    }

    #[test]
    fn prop_previous_week_is_exactly_seven_days_back(ts in arb_timestamp()) {
        let key = PeriodKey::containing(PeriodGranularity::Week, ts);
        let expected = PeriodKey::containing(PeriodGranularity::Week, ts - Duration::days(7));
        prop_assert_eq!(key.previous().map(|p| p.key), Some(expected.key));
    }

    #[test]
    fn prop_same_period_timestamps_share_a_key(ts in arb_timestamp(), hours in 0i64..23) {
        let day = PeriodKey::containing(PeriodGranularity::Day, ts);
        let midnight = ts.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
        let shifted = PeriodKey::containing(PeriodGranularity::Day, midnight + Duration::hours(hours));
        prop_assert_eq!(day.key, shifted.key);
    }
}
