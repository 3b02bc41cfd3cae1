use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dimension::Dimension;

/// One active constraint on a breakdown dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub column: Dimension,
    pub filter: String,
    #[serde(default)]
    pub is_exclusive: bool,
}

impl Filter {
    pub fn include(column: Dimension, filter: impl Into<String>) -> Self {
        Self {
            column,
            filter: filter.into(),
            is_exclusive: false,
        }
    }

    pub fn exclude(column: Dimension, filter: impl Into<String>) -> Self {
        Self {
            column,
            filter: filter.into(),
            is_exclusive: true,
        }
    }

    /// Value as it appears in a query string (`!` marks exclusion).
    pub fn query_value(&self) -> String {
        if self.is_exclusive {
            format!("!{}", self.filter)
        } else {
            self.filter.clone()
        }
    }

    /// Parses a query-string value; `None` for empty values.
    pub fn from_query_value(column: Dimension, value: &str) -> Option<Self> {
        let (filter, is_exclusive) = match value.strip_prefix('!') {
            Some(rest) => (rest, true),
            None => (value, false),
        };

        if filter.is_empty() {
            return None;
        }

        Some(Self {
            column,
            filter: filter.to_string(),
            is_exclusive,
        })
    }
}

/// Active filters, at most one per column, kept in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(Vec<Filter>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a filter, replacing any existing one on the same column.
    pub fn apply(&mut self, filter: Filter) {
        match self.0.iter_mut().find(|f| f.column == filter.column) {
            Some(existing) => *existing = filter,
            None => self.0.push(filter),
        }
    }

    pub fn remove(&mut self, column: Dimension) -> Option<Filter> {
        let index = self.0.iter().position(|f| f.column == column)?;
        Some(self.0.remove(index))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn get(&self, column: Dimension) -> Option<&Filter> {
        self.0.iter().find(|f| f.column == column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Filter> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for filter in iter {
            set.apply(filter);
        }
        set
    }
}

/// Reads the backend's `appliedFilters` JSON string.
///
/// Anything that does not parse is treated as "no filters applied".
pub fn parse_applied_filters(raw: Option<&str>) -> FilterSet {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return FilterSet::new();
    };

    match serde_json::from_str::<Vec<Filter>>(raw) {
        Ok(filters) => filters.into_iter().collect(),
        Err(e) => {
            warn!("Ignoring malformed appliedFilters: {}", e);
            FilterSet::new()
        }
    }
}
