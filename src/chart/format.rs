use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::period::TimeBucket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeFormat {
    #[serde(rename = "12-hour")]
    #[default]
    TwelveHour,
    #[serde(rename = "24-hour")]
    TwentyFourHour,
}

/// strftime pattern for x axis ticks.
pub fn x_tick_format(bucket: TimeBucket, time_format: TimeFormat) -> &'static str {
    match (bucket, time_format) {
        (TimeBucket::Hour, TimeFormat::TwelveHour) => "%I %p",
        (TimeBucket::Hour, TimeFormat::TwentyFourHour) => "%H:%M",
        (TimeBucket::Day | TimeBucket::Week, _) => "%d %b",
        (TimeBucket::Month, _) => "%b %Y",
    }
}

/// strftime pattern for the tooltip title.
pub fn tooltip_x_format(bucket: TimeBucket, time_format: TimeFormat) -> &'static str {
    match (bucket, time_format) {
        (TimeBucket::Hour, TimeFormat::TwelveHour) => "%d %b %I %p",
        (TimeBucket::Hour, TimeFormat::TwentyFourHour) => "%d %b %H:%M",
        (TimeBucket::Day | TimeBucket::Week, _) => "%d %b %Y",
        (TimeBucket::Month, _) => "%b %Y",
    }
}

pub fn format_x(
    ts: DateTime<Utc>,
    bucket: TimeBucket,
    time_format: TimeFormat,
) -> String {
    ts.format(x_tick_format(bucket, time_format)).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TooltipFormat {
    Number,
    Percent,
    Duration,
    /// Series is drawn but contributes no tooltip row.
    Hidden,
}

impl TooltipFormat {
    pub fn format(self, value: f64) -> Option<String> {
        match self {
            TooltipFormat::Number => Some(format_plain(value)),
            TooltipFormat::Percent => Some(format!("{}%", format_plain(value))),
            TooltipFormat::Duration => Some(format_duration(value)),
            TooltipFormat::Hidden => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TickFormat {
    Compact,
    Percent,
    Duration,
}

impl TickFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            TickFormat::Compact => compact_number(value),
            TickFormat::Percent => format!("{}%", format_plain(value)),
            TickFormat::Duration => format_duration(value),
        }
    }
}

/// Seconds as `1h 2m 5s`; zero components are omitted, zero is `0s`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{}s", secs));
    }
    parts.join(" ")
}

/// Axis label style: 950, 1.2k, 3.4M, 1B.
pub fn compact_number(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1.0, ""), (1e3, "k"), (1e6, "M"), (1e9, "B")];

    // The unit is picked on the rounded value so 999_999 reads 1M, not 1000k.
    for (i, (scale, suffix)) in UNITS.iter().enumerate() {
        let scaled = (value / scale * 10.0).round() / 10.0;
        if scaled.abs() < 1000.0 || i == UNITS.len() - 1 {
            return format!("{}{}", format_plain(scaled), suffix);
        }
    }
    format_plain(value)
}

/// Integers without a trailing `.0`.
fn format_plain(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
