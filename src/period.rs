use chrono::{DateTime, Duration, Months, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Hour,
    Day,
    Week,
    Month,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 4] = [
        TimeBucket::Hour,
        TimeBucket::Day,
        TimeBucket::Week,
        TimeBucket::Month,
    ];

    pub fn code(self) -> &'static str {
        match self {
            TimeBucket::Hour => "hour",
            TimeBucket::Day => "day",
            TimeBucket::Week => "week",
            TimeBucket::Month => "month",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.code() == code)
    }

    /// Most forecast points that can be appended at this granularity.
    pub fn forecast_max(self) -> usize {
        match self {
            TimeBucket::Hour => 72,
            TimeBucket::Day => 21,
            TimeBucket::Week => 8,
            TimeBucket::Month => 3,
        }
    }

    /// Start of the bucket following `ts`.
    pub fn step(self, ts: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeBucket::Hour => ts + Duration::hours(1),
            TimeBucket::Day => ts + Duration::days(1),
            TimeBucket::Week => ts + Duration::weeks(1),
            TimeBucket::Month => ts
                .checked_add_months(Months::new(1))
                .unwrap_or(ts + Duration::days(30)),
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Free,
    Paid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "yesterday")]
    Yesterday,
    #[serde(rename = "1d")]
    LastDay,
    #[serde(rename = "7d")]
    #[default]
    Last7Days,
    #[serde(rename = "4w")]
    Last4Weeks,
    #[serde(rename = "3M")]
    Last3Months,
    #[serde(rename = "12M")]
    Last12Months,
    #[serde(rename = "24M")]
    Last24Months,
    #[serde(rename = "custom")]
    Custom,
}

impl Period {
    pub const ALL: [Period; 9] = [
        Period::Today,
        Period::Yesterday,
        Period::LastDay,
        Period::Last7Days,
        Period::Last4Weeks,
        Period::Last3Months,
        Period::Last12Months,
        Period::Last24Months,
        Period::Custom,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Yesterday => "yesterday",
            Period::LastDay => "1d",
            Period::Last7Days => "7d",
            Period::Last4Weeks => "4w",
            Period::Last3Months => "3M",
            Period::Last12Months => "12M",
            Period::Last24Months => "24M",
            Period::Custom => "custom",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }

    pub fn access(self) -> Access {
        match self {
            Period::Last12Months | Period::Last24Months => Access::Paid,
            _ => Access::Free,
        }
    }

    /// Buckets the period may be viewed at. Custom ranges are narrowed
    /// further by [`infer_bucket`].
    pub fn allowed_buckets(self) -> &'static [TimeBucket] {
        match self {
            Period::Today | Period::Yesterday | Period::LastDay => &[TimeBucket::Hour],
            Period::Last7Days => &[TimeBucket::Hour, TimeBucket::Day],
            Period::Last4Weeks => &[TimeBucket::Day, TimeBucket::Week],
            Period::Last3Months | Period::Last12Months => &[TimeBucket::Week, TimeBucket::Month],
            Period::Last24Months => &[TimeBucket::Month],
            Period::Custom => &TimeBucket::ALL,
        }
    }

    pub fn default_bucket(self) -> TimeBucket {
        self.allowed_buckets()[0]
    }

    pub fn allows(self, bucket: TimeBucket) -> bool {
        self.allowed_buckets().contains(&bucket)
    }

    pub fn days(self) -> Option<i64> {
        match self {
            Period::Today | Period::Yesterday | Period::LastDay => Some(1),
            Period::Last7Days => Some(7),
            Period::Last4Weeks => Some(28),
            Period::Last3Months => Some(90),
            Period::Last12Months => Some(365),
            Period::Last24Months => Some(730),
            Period::Custom => None,
        }
    }

    /// Absolute window covered by a relative period at `now`. `None` for custom.
    pub fn time_range(self, now: DateTime<Utc>) -> Option<DateRange> {
        let today_start = start_of_day(now);

        let (from, to) = match self {
            Period::Today => (today_start, now),
            Period::Yesterday => (today_start - Duration::days(1), today_start),
            Period::LastDay => (now - Duration::days(1), now),
            Period::Last7Days => (now - Duration::days(7), now),
            Period::Last4Weeks => (now - Duration::weeks(4), now),
            Period::Last3Months => (shift_months(now, 3), now),
            Period::Last12Months => (shift_months(now, 12), now),
            Period::Last24Months => (shift_months(now, 24), now),
            Period::Custom => return None,
        };

        Some(DateRange { from, to })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Whole days spanned, rounded up.
    pub fn days(&self) -> i64 {
        const DAY_MS: i64 = 86_400_000;
        let ms = (self.to - self.from).num_milliseconds().abs();
        (ms + DAY_MS - 1) / DAY_MS
    }

    /// Bucket starts from `from` up to and including `to`.
    pub fn buckets(&self, bucket: TimeBucket) -> Vec<DateTime<Utc>> {
        let mut out = Vec::new();
        let mut current = self.from;
        while current <= self.to {
            out.push(current);
            current = bucket.step(current);
        }
        out
    }
}

const BUCKETS_BY_RANGE: [(i64, &[TimeBucket]); 5] = [
    (1, &[TimeBucket::Hour]),
    (7, &[TimeBucket::Hour, TimeBucket::Day]),
    (28, &[TimeBucket::Day, TimeBucket::Week]),
    (366, &[TimeBucket::Week, TimeBucket::Month]),
    (732, &[TimeBucket::Month]),
];

/// Buckets allowed for a custom range of the given length.
pub fn buckets_for_range(range: &DateRange) -> &'static [TimeBucket] {
    let days = range.days();
    BUCKETS_BY_RANGE
        .iter()
        .find(|(less_than_days, _)| *less_than_days >= days)
        .map(|(_, buckets)| *buckets)
        .unwrap_or(BUCKETS_BY_RANGE[BUCKETS_BY_RANGE.len() - 1].1)
}

/// Keeps `current` if the range allows it, otherwise picks the first allowed bucket.
pub fn infer_bucket(range: &DateRange, current: TimeBucket) -> TimeBucket {
    let allowed = buckets_for_range(range);
    if allowed.contains(&current) {
        current
    } else {
        allowed[0]
    }
}

fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&ts.date_naive().and_time(NaiveTime::MIN))
}

fn shift_months(ts: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    ts.checked_sub_months(Months::new(months))
        .unwrap_or_else(|| ts - Duration::days(30 * i64::from(months)))
}
