use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use crate::dimension::Dimension;
use crate::filter::{Filter, FilterSet};
use crate::metrics::parse_timestamp;
use crate::period::{buckets_for_range, infer_bucket, Access, DateRange, Period, TimeBucket};

pub const PERIOD_PARAM: &str = "period";
pub const TIME_BUCKET_PARAM: &str = "timeBucket";
pub const FROM_PARAM: &str = "from";
pub const TO_PARAM: &str = "to";

/// Reporting window, granularity and filters of a dashboard view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQuery {
    pub period: Period,
    pub time_bucket: TimeBucket,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
    #[serde(default)]
    pub filters: FilterSet,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self::relative(Period::default())
    }
}

impl ViewQuery {
    /// A relative period at its default bucket. `Custom` falls back to the default period.
    pub fn relative(period: Period) -> Self {
        let period = if period == Period::Custom {
            Period::default()
        } else {
            period
        };

        Self {
            period,
            time_bucket: period.default_bucket(),
            range: None,
            filters: FilterSet::new(),
        }
    }

    /// A custom range; the bucket is kept when the range allows it.
    pub fn custom(range: DateRange, bucket: Option<TimeBucket>) -> Self {
        let range = if range.from > range.to {
            DateRange::new(range.to, range.from)
        } else {
            range
        };
        let time_bucket = match bucket {
            Some(bucket) => infer_bucket(&range, bucket),
            None => buckets_for_range(&range)[0],
        };

        Self {
            period: Period::Custom,
            time_bucket,
            range: Some(range),
            filters: FilterSet::new(),
        }
    }

    /// Rebuilds a query that may have been assembled field by field so that it
    /// survives an encode/decode round trip: a custom period needs a range and
    /// the bucket must be one the period allows.
    pub fn normalized(&self) -> Self {
        let query = match (self.period, &self.range) {
            (Period::Custom, Some(range)) => ViewQuery::custom(*range, Some(self.time_bucket)),
            (Period::Custom, None) => {
                debug!("Custom period without a range, using {}", Period::default());
                ViewQuery::default()
            }
            (period, _) if period.allows(self.time_bucket) => {
                let mut query = ViewQuery::relative(period);
                query.time_bucket = self.time_bucket;
                query
            }
            (period, _) => {
                debug!(
                    "Bucket {} is not allowed for {}, using {}",
                    self.time_bucket,
                    period,
                    period.default_bucket()
                );
                ViewQuery::relative(period)
            }
        };
        query.with_filters(self.filters.clone())
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    pub fn allowed_buckets(&self) -> &'static [TimeBucket] {
        match (self.period, &self.range) {
            (Period::Custom, Some(range)) => buckets_for_range(range),
            (period, _) => period.allowed_buckets(),
        }
    }

    /// Bucket that is implied when `timeBucket` is absent from the query.
    pub fn implicit_bucket(&self) -> TimeBucket {
        self.allowed_buckets()[0]
    }

    /// Key under which the fetched payload for this view is memoised.
    pub fn cache_key(&self) -> String {
        let mut key = match &self.range {
            Some(range) if self.period == Period::Custom => format!(
                "{}-{}-{}",
                format_query_date(range.from),
                format_query_date(range.to),
                self.time_bucket
            ),
            _ => format!("{}{}", self.period, self.time_bucket),
        };

        if !self.filters.is_empty() {
            key.push_str(&serde_json::to_string(&self.filters).unwrap_or_default());
        }
        key
    }
}

/// Who is asking; decides access to paid-only periods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Entitlement {
    pub paid: bool,
    pub shared: bool,
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DecodeOutcome {
    Applied {
        query: ViewQuery,
    },
    /// The requested period needs a paid plan; `fallback` is what to show meanwhile.
    UpgradeRequired {
        requested: Period,
        fallback: ViewQuery,
    },
}

impl DecodeOutcome {
    pub fn query(&self) -> &ViewQuery {
        match self {
            DecodeOutcome::Applied { query } => query,
            DecodeOutcome::UpgradeRequired { fallback, .. } => fallback,
        }
    }

    pub fn is_upgrade_required(&self) -> bool {
        matches!(self, DecodeOutcome::UpgradeRequired { .. })
    }
}

/// Maps [`ViewQuery`] to and from dashboard URL query strings.
#[derive(Debug, Clone)]
pub struct PeriodCodec {
    demo_project_id: String,
}

impl PeriodCodec {
    pub fn new(demo_project_id: impl Into<String>) -> Self {
        Self {
            demo_project_id: demo_project_id.into(),
        }
    }

    pub fn is_entitled(&self, entitlement: &Entitlement, period: Period) -> bool {
        match period.access() {
            Access::Free => true,
            Access::Paid => {
                entitlement.paid
                    || entitlement.shared
                    || entitlement.project_id == self.demo_project_id
            }
        }
    }

    /// Encodes the normalized form of `query`.
    pub fn encode(&self, query: &ViewQuery) -> String {
        let query = &query.normalized();
        let mut out = form_urlencoded::Serializer::new(String::new());
        out.append_pair(PERIOD_PARAM, query.period.code());

        if let (Period::Custom, Some(range)) = (query.period, &query.range) {
            out.append_pair(FROM_PARAM, &format_query_date(range.from));
            out.append_pair(TO_PARAM, &format_query_date(range.to));
        }

        if query.time_bucket != query.implicit_bucket() {
            out.append_pair(TIME_BUCKET_PARAM, query.time_bucket.code());
        }

        for filter in query.filters.iter() {
            out.append_pair(filter.column.code(), &filter.query_value());
        }

        out.finish()
    }

    /// Decodes a query string (with or without the leading `?`).
    ///
    /// Unknown or illegal values fall back to defaults and are never reported
    /// as errors.
    pub fn decode(&self, raw: &str, entitlement: &Entitlement) -> DecodeOutcome {
        let raw = raw.strip_prefix('?').unwrap_or(raw);

        let mut period = None;
        let mut bucket = None;
        let mut from = None;
        let mut to = None;
        let mut filters = FilterSet::new();

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                PERIOD_PARAM => period = Some(value.into_owned()),
                TIME_BUCKET_PARAM => bucket = TimeBucket::parse(&value),
                FROM_PARAM => from = parse_timestamp(&value).ok(),
                TO_PARAM => to = parse_timestamp(&value).ok(),
                other => match Dimension::parse(other) {
                    Some(column) => {
                        if let Some(filter) = Filter::from_query_value(column, &value) {
                            filters.apply(filter);
                        }
                    }
                    None => debug!("Ignoring unknown query parameter '{}'", other),
                },
            }
        }

        let period = period.as_deref().and_then(Period::parse);

        let query = match period {
            Some(Period::Custom) => match (from, to) {
                (Some(from), Some(to)) => ViewQuery::custom(DateRange::new(from, to), bucket),
                _ => {
                    debug!("Custom period without a valid range, using default period");
                    ViewQuery::default()
                }
            },
            Some(period) => {
                if !self.is_entitled(entitlement, period) {
                    return DecodeOutcome::UpgradeRequired {
                        requested: period,
                        fallback: ViewQuery::default().with_filters(filters),
                    };
                }
                let mut query = ViewQuery::relative(period);
                if let Some(bucket) = bucket.filter(|b| period.allows(*b)) {
                    query.time_bucket = bucket;
                }
                query
            }
            None => {
                let mut query = ViewQuery::default();
                if let Some(bucket) = bucket.filter(|b| query.period.allows(*b)) {
                    query.time_bucket = bucket;
                }
                query
            }
        };

        DecodeOutcome::Applied {
            query: query.with_filters(filters),
        }
    }
}

/// Date-only when the timestamp is at midnight, RFC 3339 otherwise.
fn format_query_date(ts: DateTime<Utc>) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.to_rfc3339()
    }
}
