use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::debug;

use crate::dimension::Dimension;
use crate::metrics::{ChartPayload, StatsPayload};
use crate::period::{DateRange, Period, TimeBucket};

const SAMPLE_PAGES: &[&str] = &[
    "/",
    "/pricing",
    "/features",
    "/blog",
    "/blog/privacy-first-analytics",
    "/docs",
    "/signup",
];

const SAMPLE_COUNTRIES: &[&str] = &["US", "GB", "DE", "UA", "FR", "PL", "CA", "IN", "JP", "BR"];

const SAMPLE_REFERRERS: &[&str] = &[
    "google.com",
    "news.ycombinator.com",
    "github.com",
    "twitter.com",
    "reddit.com",
];

const SAMPLE_BROWSERS: &[&str] = &["Chrome", "Firefox", "Safari", "Edge", "Opera"];
const SAMPLE_OS: &[&str] = &["Windows", "Mac OS", "Linux", "iOS", "Android"];
const SAMPLE_DEVICES: &[&str] = &["desktop", "mobile", "tablet"];
const SAMPLE_LOCALES: &[&str] = &["en-US", "en-GB", "de-DE", "uk-UA", "fr-FR"];
const SAMPLE_SOURCES: &[&str] = &["newsletter", "producthunt", "twitter"];
const SAMPLE_EVENTS: &[&str] = &["signup", "purchase", "download"];

/// Produces plausible statistics payloads for the demo project.
pub struct PayloadGenerator {
    rng: StdRng,
}

impl PayloadGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Payload for a relative period; `None` for custom periods.
    pub fn generate(
        &mut self,
        period: Period,
        bucket: TimeBucket,
        now: DateTime<Utc>,
    ) -> Option<StatsPayload> {
        let range = period.time_range(now)?;
        Some(self.generate_for_range(&range, bucket))
    }

    pub fn generate_for_range(&mut self, range: &DateRange, bucket: TimeBucket) -> StatsPayload {
        let from = range
            .from
            .duration_trunc(Duration::hours(1))
            .unwrap_or(range.from);
        let x = DateRange::new(from, range.to).buckets(bucket);

        let mut chart = ChartPayload::default();
        for ts in &x {
            let uniques = self.rng.gen_range(0..120) as f64;
            let visits = uniques + self.rng.gen_range(0..80) as f64;
            let sdur = if visits > 0.0 {
                self.rng.gen_range(20..600) as f64
            } else {
                0.0
            };

            chart.x.push(ts.format("%Y-%m-%d %H:%M:%S").to_string());
            chart.uniques.push(uniques);
            chart.visits.push(visits);
            chart.sdur.push(sdur);
        }

        let total: f64 = chart.visits.iter().sum();
        let mut params = BTreeMap::new();
        for (dimension, keys) in [
            (Dimension::Country, SAMPLE_COUNTRIES),
            (Dimension::Page, SAMPLE_PAGES),
            (Dimension::Referrer, SAMPLE_REFERRERS),
            (Dimension::Browser, SAMPLE_BROWSERS),
            (Dimension::OperatingSystem, SAMPLE_OS),
            (Dimension::Device, SAMPLE_DEVICES),
            (Dimension::Locale, SAMPLE_LOCALES),
            (Dimension::UtmSource, SAMPLE_SOURCES),
        ] {
            params.insert(dimension.code().to_string(), self.split(total, keys));
        }

        let customs = self.split(total / 10.0, SAMPLE_EVENTS);

        debug!(
            "Generated sample payload with {} buckets at {} granularity",
            x.len(),
            bucket
        );

        StatsPayload {
            chart,
            params,
            customs,
            applied_filters: None,
        }
    }

    /// Spreads `total` over a random subset of `keys`.
    fn split(&mut self, total: f64, keys: &[&str]) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        if total < 1.0 {
            return out;
        }

        let count = self.rng.gen_range(1..=keys.len());
        let chosen: Vec<&&str> = keys.choose_multiple(&mut self.rng, count).collect();
        let weights: Vec<f64> = chosen.iter().map(|_| self.rng.gen_range(1.0..10.0)).collect();
        let weight_sum: f64 = weights.iter().sum();

        for (key, weight) in chosen.into_iter().zip(weights) {
            let value = (total * weight / weight_sum).round();
            if value > 0.0 {
                out.insert(key.to_string(), value);
            }
        }
        out
    }
}
