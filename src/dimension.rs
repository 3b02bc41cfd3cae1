use serde::{Deserialize, Serialize};
use std::fmt;

/// Breakdown dimensions that can be filtered on and exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "cc")]
    Country,
    #[serde(rename = "pg")]
    Page,
    #[serde(rename = "lc")]
    Locale,
    #[serde(rename = "ref")]
    Referrer,
    #[serde(rename = "dv")]
    Device,
    #[serde(rename = "br")]
    Browser,
    #[serde(rename = "os")]
    OperatingSystem,
    #[serde(rename = "so")]
    UtmSource,
    #[serde(rename = "me")]
    UtmMedium,
    #[serde(rename = "ca")]
    UtmCampaign,
    #[serde(rename = "lt")]
    LoadTime,
    #[serde(rename = "ev")]
    CustomEvent,
}

impl Dimension {
    pub const ALL: [Dimension; 12] = [
        Dimension::Country,
        Dimension::Page,
        Dimension::Locale,
        Dimension::Referrer,
        Dimension::Device,
        Dimension::Browser,
        Dimension::OperatingSystem,
        Dimension::UtmSource,
        Dimension::UtmMedium,
        Dimension::UtmCampaign,
        Dimension::LoadTime,
        Dimension::CustomEvent,
    ];

    /// Query parameter / payload key.
    pub fn code(self) -> &'static str {
        match self {
            Dimension::Country => "cc",
            Dimension::Page => "pg",
            Dimension::Locale => "lc",
            Dimension::Referrer => "ref",
            Dimension::Device => "dv",
            Dimension::Browser => "br",
            Dimension::OperatingSystem => "os",
            Dimension::UtmSource => "so",
            Dimension::UtmMedium => "me",
            Dimension::UtmCampaign => "ca",
            Dimension::LoadTime => "lt",
            Dimension::CustomEvent => "ev",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code() == code)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Dimension::Country => "Country",
            Dimension::Page => "Page",
            Dimension::Locale => "Locale",
            Dimension::Referrer => "Referrer",
            Dimension::Device => "Device category",
            Dimension::Browser => "Browser",
            Dimension::OperatingSystem => "OS name",
            Dimension::UtmSource => "utm_source",
            Dimension::UtmMedium => "utm_medium",
            Dimension::UtmCampaign => "utm_campaign",
            Dimension::LoadTime => "Load time",
            Dimension::CustomEvent => "Custom event",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
