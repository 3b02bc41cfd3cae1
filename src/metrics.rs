use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::filter::{parse_applied_filters, FilterSet};

/// Time-bucketed traffic numbers, one value per bucket in every array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsBundle {
    x: Vec<DateTime<Utc>>,
    uniques: Vec<f64>,
    visits: Vec<f64>,
    sdur: Vec<f64>,
}

impl MetricsBundle {
    pub fn new(
        x: Vec<DateTime<Utc>>,
        uniques: Vec<f64>,
        visits: Vec<f64>,
        sdur: Vec<f64>,
    ) -> Result<Self> {
        let expected = x.len();
        for (field, len) in [
            ("uniques", uniques.len()),
            ("visits", visits.len()),
            ("sdur", sdur.len()),
        ] {
            if len != expected {
                return Err(Error::LengthMismatch {
                    field,
                    expected,
                    actual: len,
                });
            }
        }

        Ok(Self {
            x,
            uniques,
            visits,
            sdur,
        })
    }

    pub fn x(&self) -> &[DateTime<Utc>] {
        &self.x
    }

    pub fn uniques(&self) -> &[f64] {
        &self.uniques
    }

    pub fn visits(&self) -> &[f64] {
        &self.visits
    }

    pub fn sdur(&self) -> &[f64] {
        &self.sdur
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Returns a new bundle with `tail` appended, keeping at most `max_tail` tail points.
    pub fn extended(&self, tail: &MetricsBundle, max_tail: usize) -> MetricsBundle {
        let take = tail.len().min(max_tail);
        let mut out = self.clone();
        out.x.extend_from_slice(&tail.x[..take]);
        out.uniques.extend_from_slice(&tail.uniques[..take]);
        out.visits.extend_from_slice(&tail.visits[..take]);
        out.sdur.extend_from_slice(&tail.sdur[..take]);
        out
    }
}

/// Which chart metrics are switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveMetricFlags {
    pub unique: bool,
    pub views: bool,
    pub bounce: bool,
    pub views_per_unique: bool,
    pub trendlines: bool,
    pub session_duration: bool,
}

impl Default for ActiveMetricFlags {
    fn default() -> Self {
        Self {
            unique: true,
            views: true,
            bounce: false,
            views_per_unique: false,
            trendlines: false,
            session_duration: false,
        }
    }
}

impl ActiveMetricFlags {
    pub fn none() -> Self {
        Self {
            unique: false,
            views: false,
            bounce: false,
            views_per_unique: false,
            trendlines: false,
            session_duration: false,
        }
    }

    pub fn with(mut self, metric: ChartMetric) -> Self {
        self.set(metric, true);
        self
    }

    pub fn is_active(&self, metric: ChartMetric) -> bool {
        match metric {
            ChartMetric::Unique => self.unique,
            ChartMetric::Views => self.views,
            ChartMetric::Bounce => self.bounce,
            ChartMetric::ViewsPerUnique => self.views_per_unique,
            ChartMetric::Trendlines => self.trendlines,
            ChartMetric::SessionDuration => self.session_duration,
        }
    }

    pub fn set(&mut self, metric: ChartMetric, value: bool) {
        let flag = match metric {
            ChartMetric::Unique => &mut self.unique,
            ChartMetric::Views => &mut self.views,
            ChartMetric::Bounce => &mut self.bounce,
            ChartMetric::ViewsPerUnique => &mut self.views_per_unique,
            ChartMetric::Trendlines => &mut self.trendlines,
            ChartMetric::SessionDuration => &mut self.session_duration,
        };
        *flag = value;
    }

    pub fn toggle(&mut self, metric: ChartMetric) {
        let current = self.is_active(metric);
        self.set(metric, !current);
    }

    /// Whether the secondary y axis is needed.
    pub fn uses_secondary_axis(&self) -> bool {
        self.bounce || self.session_duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartMetric {
    Unique,
    Views,
    Bounce,
    ViewsPerUnique,
    Trendlines,
    SessionDuration,
}

/// `chart` object of a backend statistics response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartPayload {
    pub x: Vec<String>,
    #[serde(default)]
    pub uniques: Vec<f64>,
    #[serde(default)]
    pub visits: Vec<f64>,
    #[serde(default)]
    pub sdur: Vec<f64>,
}

impl ChartPayload {
    /// Parses timestamps and validates array lengths. A missing `sdur` array is read as zeros.
    pub fn to_bundle(&self) -> Result<MetricsBundle> {
        let x = self
            .x
            .iter()
            .map(|s| parse_timestamp(s))
            .collect::<Result<Vec<_>>>()?;

        let sdur = if self.sdur.is_empty() {
            vec![0.0; x.len()]
        } else {
            self.sdur.clone()
        };

        MetricsBundle::new(x, self.uniques.clone(), self.visits.clone(), sdur)
    }
}

/// Backend statistics response consumed by the chart and export paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsPayload {
    pub chart: ChartPayload,
    #[serde(default)]
    pub params: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub customs: BTreeMap<String, f64>,
    #[serde(default)]
    pub applied_filters: Option<String>,
}

impl StatsPayload {
    pub fn applied_filters(&self) -> FilterSet {
        parse_applied_filters(self.applied_filters.as_deref())
    }
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }

    Err(Error::InvalidTimestamp(raw.to_string()))
}
