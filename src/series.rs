use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::{ActiveMetricFlags, MetricsBundle};
use crate::trendline::{round_to, trendline};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: DateTime<Utc>,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesKind {
    Unique,
    TrendlineUnique,
    Total,
    TrendlineTotal,
    Bounce,
    ViewsPerUnique,
    SessionDuration,
    CustomEvent,
}

impl SeriesKind {
    pub const BUILTIN: [SeriesKind; 7] = [
        SeriesKind::Unique,
        SeriesKind::TrendlineUnique,
        SeriesKind::Total,
        SeriesKind::TrendlineTotal,
        SeriesKind::Bounce,
        SeriesKind::ViewsPerUnique,
        SeriesKind::SessionDuration,
    ];

    /// Whether `id` names a built-in metric series, whether or not it is enabled.
    pub fn is_builtin_id(id: &str) -> bool {
        Self::BUILTIN.iter().any(|k| k.id() == id)
    }

    pub fn id(self) -> &'static str {
        match self {
            SeriesKind::Unique => "unique",
            SeriesKind::TrendlineUnique => "trendlineUnique",
            SeriesKind::Total => "total",
            SeriesKind::TrendlineTotal => "trendlineTotal",
            SeriesKind::Bounce => "bounce",
            SeriesKind::ViewsPerUnique => "viewsPerUnique",
            SeriesKind::SessionDuration => "sessionDuration",
            SeriesKind::CustomEvent => "customEvent",
        }
    }

    pub fn color(self) -> Option<&'static str> {
        match self {
            SeriesKind::Unique => Some("#2563EB"),
            SeriesKind::TrendlineUnique => Some("#436abf"),
            SeriesKind::Total => Some("#D97706"),
            SeriesKind::TrendlineTotal => Some("#eba14b"),
            SeriesKind::Bounce => Some("#2AC4B3"),
            SeriesKind::ViewsPerUnique => Some("#F87171"),
            SeriesKind::SessionDuration => Some("#c945ed"),
            SeriesKind::CustomEvent => None,
        }
    }

    pub fn is_trendline(self) -> bool {
        matches!(self, SeriesKind::TrendlineUnique | SeriesKind::TrendlineTotal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub id: String,
    #[serde(skip)]
    pub kind: SeriesKind,
    pub color: String,
    pub data: Vec<Point>,
}

impl Series {
    fn builtin(kind: SeriesKind, x: &[DateTime<Utc>], values: &[f64]) -> Self {
        Self {
            id: kind.id().to_string(),
            kind,
            color: kind.color().unwrap_or_default().to_string(),
            data: pair(x, values),
        }
    }

    pub fn values(&self) -> Vec<f64> {
        self.data.iter().map(|p| p.y).collect()
    }
}

pub struct SeriesBuilder<'a> {
    bundle: &'a MetricsBundle,
    flags: ActiveMetricFlags,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(bundle: &'a MetricsBundle, flags: ActiveMetricFlags) -> Self {
        Self { bundle, flags }
    }

    pub fn build(&self) -> Vec<Series> {
        let x = self.bundle.x();
        let uniques = self.bundle.uniques();
        let visits = self.bundle.visits();
        let mut series = Vec::new();

        if self.flags.unique {
            series.push(Series::builtin(SeriesKind::Unique, x, uniques));
            if self.flags.trendlines {
                series.push(Series::builtin(
                    SeriesKind::TrendlineUnique,
                    x,
                    &trendline(uniques),
                ));
            }
        }

        if self.flags.views {
            series.push(Series::builtin(SeriesKind::Total, x, visits));
            if self.flags.trendlines {
                series.push(Series::builtin(
                    SeriesKind::TrendlineTotal,
                    x,
                    &trendline(visits),
                ));
            }
        }

        if self.flags.bounce {
            series.push(Series::builtin(
                SeriesKind::Bounce,
                x,
                &bounce_rates(uniques, visits),
            ));
        }

        if self.flags.views_per_unique {
            series.push(Series::builtin(
                SeriesKind::ViewsPerUnique,
                x,
                &views_per_unique(uniques, visits),
            ));
        }

        if self.flags.session_duration {
            series.push(Series::builtin(
                SeriesKind::SessionDuration,
                x,
                self.bundle.sdur(),
            ));
        }

        series
    }
}

/// `uniques * 100 / visits` per bucket, one decimal; zero visits give 0.
pub fn bounce_rates(uniques: &[f64], visits: &[f64]) -> Vec<f64> {
    uniques
        .iter()
        .zip(visits)
        .map(|(&u, &v)| {
            let rate = round_to(u * 100.0 / v, 1);
            if rate.is_finite() {
                rate
            } else {
                0.0
            }
        })
        .collect()
}

pub fn views_per_unique(uniques: &[f64], visits: &[f64]) -> Vec<f64> {
    uniques
        .iter()
        .zip(visits)
        .map(|(&u, &v)| if u == 0.0 { 0.0 } else { round_to(v / u, 1) })
        .collect()
}

fn pair(x: &[DateTime<Utc>], values: &[f64]) -> Vec<Point> {
    x.iter()
        .zip(values)
        .map(|(&x, &y)| Point { x, y })
        .collect()
}
