//! Day/week period bucketing.
//!
//! Every sample lands in both its daily and weekly bucket. Keys are plain
//! strings (`2026-08-27`, `2026-W35`) so they sort lexicographically within
//! a granularity and survive round-trips through the database unchanged.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Bucketing granularity for all period-keyed tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodGranularity {
    Day,
    Week,
}

impl PeriodGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodGranularity::Day => "day",
            PeriodGranularity::Week => "week",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(PeriodGranularity::Day),
            "week" => Some(PeriodGranularity::Week),
            _ => None,
        }
    }

    /// Both granularities, in the order buckets are built and persisted.
    pub const ALL: [PeriodGranularity; 2] = [PeriodGranularity::Day, PeriodGranularity::Week];
}

/// A `(granularity, key)` pair identifying one period bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub granularity: PeriodGranularity,
    pub key: String,
}

impl PeriodKey {
    /// The period containing `ts` at the given granularity.
    pub fn containing(granularity: PeriodGranularity, ts: DateTime<Utc>) -> Self {
        let key = match granularity {
            PeriodGranularity::Day => ts.format("%Y-%m-%d").to_string(),
            PeriodGranularity::Week => {
                let iso = ts.iso_week();
                format!("{:04}-W{:02}", iso.year(), iso.week())
            }
        };
        Self { granularity, key }
    }

    /// Every period of this granularity touched by `[since, until]`, oldest
    /// first. Recompute passes delete exactly these periods, so a period
    /// whose events vanished between runs is still cleared.
    pub fn covering(
        granularity: PeriodGranularity,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Vec<Self> {
        let mut keys = Vec::new();
        let mut ts = since;
        while ts <= until {
            let key = Self::containing(granularity, ts);
            if keys.last() != Some(&key) {
                keys.push(key);
            }
            ts += Duration::days(1);
        }
        let last = Self::containing(granularity, until);
        if keys.last() != Some(&last) {
            keys.push(last);
        }
        keys
    }

    /// The immediately preceding period, or `None` if the key is malformed.
    /// Drift comparison reads exactly one period back, never further.
    pub fn previous(&self) -> Option<Self> {
        match self.granularity {
            PeriodGranularity::Day => {
                let date = NaiveDate::parse_from_str(&self.key, "%Y-%m-%d").ok()?;
                let prev = date - Duration::days(1);
                Some(Self {
                    granularity: self.granularity,
                    key: prev.format("%Y-%m-%d").to_string(),
                })
            }
            PeriodGranularity::Week => {
                let (year, week) = parse_week_key(&self.key)?;
                let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
                let prev = monday - Duration::days(7);
                let iso = prev.iso_week();
                Some(Self {
                    granularity: self.granularity,
                    key: format!("{:04}-W{:02}", iso.year(), iso.week()),
                })
            }
        }
    }
}

fn parse_week_key(key: &str) -> Option<(i32, u32)> {
    let (year, week) = key.split_once("-W")?;
    Some((year.parse().ok()?, week.parse().ok()?))
}
