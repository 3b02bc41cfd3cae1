use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::metrics::{ActiveMetricFlags, MetricsBundle};
use crate::period::TimeBucket;
use crate::series::{Point, Series, SeriesBuilder, SeriesKind};

pub mod color;
pub mod format;


pub use color::string_to_color;
pub use format::{
    compact_number, format_duration, format_x, tooltip_x_format, x_tick_format, TickFormat,
    TimeFormat, TooltipFormat,
};

pub const FORECAST_LABEL: &str = "Forecast";
pub const DASHED_REGION: &str = "6 2";
const BOUNCE_AXIS_RANGE: (f64, f64) = (10.0, 100.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderType {
    Area,
    Spline,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisId {
    Y,
    Y2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub id: String,
    #[serde(skip)]
    pub kind: SeriesKind,
    pub color: String,
    pub render: RenderType,
    pub axis: AxisId,
    pub tooltip: TooltipFormat,
    pub data: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XAxis {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub tick_format: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YAxis {
    pub show: bool,
    pub tick: TickFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axes {
    pub x: XAxis,
    pub y: YAxis,
    pub y2: YAxis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLine {
    pub value: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub series: String,
    pub start: DateTime<Utc>,
    pub dasharray: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub x_format: &'static str,
}

/// Declarative chart description handed to the charting library.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub series: Vec<ChartSeries>,
    pub axis: Axes,
    pub x_lines: Vec<GridLine>,
    pub regions: Vec<Region>,
    pub tooltip: Tooltip,
}

impl ChartConfig {
    pub fn series(&self, id: &str) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.id == id)
    }

    /// Tooltip rows (`id`, formatted value) for the point at `index`.
    pub fn tooltip_rows(&self, index: usize) -> Vec<(String, String)> {
        self.series
            .iter()
            .filter_map(|s| {
                let point = s.data.get(index)?;
                let label = s.tooltip.format(point.y)?;
                Some((s.id.clone(), label))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartOptions {
    pub apply_regions: bool,
    pub time_bucket: TimeBucket,
    pub time_format: TimeFormat,
    pub chart_kind: ChartKind,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            apply_regions: false,
            time_bucket: TimeBucket::Day,
            time_format: TimeFormat::default(),
            chart_kind: ChartKind::default(),
        }
    }
}

pub struct ChartConfigAssembler<'a> {
    bundle: &'a MetricsBundle,
    flags: ActiveMetricFlags,
    options: ChartOptions,
    forecast: Option<&'a MetricsBundle>,
    custom_events: Option<&'a BTreeMap<String, Vec<f64>>>,
}

impl<'a> ChartConfigAssembler<'a> {
    pub fn new(bundle: &'a MetricsBundle, flags: ActiveMetricFlags, options: ChartOptions) -> Self {
        Self {
            bundle,
            flags,
            options,
            forecast: None,
            custom_events: None,
        }
    }

    pub fn with_forecast(mut self, forecast: Option<&'a MetricsBundle>) -> Self {
        self.forecast = forecast.filter(|f| !f.is_empty());
        self
    }

    pub fn with_custom_events(mut self, events: Option<&'a BTreeMap<String, Vec<f64>>>) -> Self {
        self.custom_events = events.filter(|e| !e.is_empty());
        self
    }

    pub fn assemble(&self) -> ChartConfig {
        let bucket = self.options.time_bucket;
        let last_real_x = self.bundle.x().last().copied();

        let data = match self.forecast {
            Some(forecast) => {
                let max = bucket.forecast_max();
                if forecast.len() > max {
                    warn!(
                        "Forecast has {} points, only {} are shown at {} granularity",
                        forecast.len(),
                        max,
                        bucket
                    );
                }
                self.bundle.extended(forecast, max)
            }
            None => self.bundle.clone(),
        };

        let mut series: Vec<ChartSeries> = SeriesBuilder::new(&data, self.flags)
            .build()
            .into_iter()
            .map(|s| self.decorate(s))
            .collect();

        if let Some(events) = self.custom_events {
            for (name, values) in events {
                if SeriesKind::is_builtin_id(name) {
                    warn!("Skipping custom event '{}': reserved metric id", name);
                    continue;
                }
                series.push(ChartSeries {
                    id: name.clone(),
                    kind: SeriesKind::CustomEvent,
                    color: string_to_color(name),
                    render: match self.options.chart_kind {
                        ChartKind::Line => RenderType::Spline,
                        ChartKind::Bar => RenderType::Bar,
                    },
                    axis: AxisId::Y,
                    tooltip: TooltipFormat::Number,
                    data: data
                        .x()
                        .iter()
                        .zip(values)
                        .map(|(&x, &y)| Point { x, y })
                        .collect(),
                });
            }
        }

        let x_lines = match (self.forecast, last_real_x) {
            (Some(_), Some(value)) => vec![GridLine {
                value,
                text: FORECAST_LABEL.to_string(),
            }],
            _ => Vec::new(),
        };

        let regions = self.regions(&series);

        debug!(
            "Assembled chart with {} series over {} points",
            series.len(),
            data.len()
        );

        ChartConfig {
            kind: self.options.chart_kind,
            series,
            axis: self.axes(),
            x_lines,
            regions,
            tooltip: Tooltip {
                x_format: tooltip_x_format(bucket, self.options.time_format),
            },
        }
    }

    fn decorate(&self, series: Series) -> ChartSeries {
        let kind = series.kind;

        let render = match (self.options.chart_kind, kind) {
            (_, k) if k.is_trendline() => RenderType::Spline,
            (ChartKind::Bar, _) => RenderType::Bar,
            (ChartKind::Line, SeriesKind::Unique | SeriesKind::Total) => RenderType::Area,
            (ChartKind::Line, _) => RenderType::Spline,
        };

        let axis = match kind {
            SeriesKind::Bounce | SeriesKind::SessionDuration => AxisId::Y2,
            _ => AxisId::Y,
        };

        let tooltip = match kind {
            SeriesKind::Bounce => TooltipFormat::Percent,
            SeriesKind::SessionDuration => TooltipFormat::Duration,
            k if k.is_trendline() => TooltipFormat::Hidden,
            _ => TooltipFormat::Number,
        };

        ChartSeries {
            id: series.id,
            kind,
            color: series.color,
            render,
            axis,
            tooltip,
            data: series.data,
        }
    }

    fn axes(&self) -> Axes {
        let y2 = if self.flags.bounce {
            YAxis {
                show: true,
                tick: TickFormat::Percent,
                min: Some(BOUNCE_AXIS_RANGE.0),
                max: Some(BOUNCE_AXIS_RANGE.1),
            }
        } else {
            YAxis {
                show: self.flags.uses_secondary_axis(),
                tick: TickFormat::Duration,
                min: None,
                max: None,
            }
        };

        Axes {
            x: XAxis {
                kind: "timeseries",
                tick_format: x_tick_format(self.options.time_bucket, self.options.time_format),
            },
            y: YAxis {
                show: true,
                tick: TickFormat::Compact,
                min: None,
                max: None,
            },
            y2,
        }
    }

    fn regions(&self, series: &[ChartSeries]) -> Vec<Region> {
        if !self.options.apply_regions {
            return Vec::new();
        }

        let real_x = self.bundle.x();
        let start = if self.forecast.is_some() {
            real_x.last().copied()
        } else if real_x.len() >= 2 {
            Some(real_x[real_x.len() - 2])
        } else {
            None
        };

        let Some(start) = start else {
            return Vec::new();
        };

        series
            .iter()
            .filter(|s| is_dashable(s.kind))
            .map(|s| Region {
                series: s.id.clone(),
                start,
                dasharray: DASHED_REGION,
            })
            .collect()
    }
}

fn is_dashable(kind: SeriesKind) -> bool {
    matches!(
        kind,
        SeriesKind::Unique
            | SeriesKind::Total
            | SeriesKind::Bounce
            | SeriesKind::ViewsPerUnique
            | SeriesKind::SessionDuration
    )
}
