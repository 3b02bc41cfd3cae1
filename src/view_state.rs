use serde::Serialize;
use tracing::debug;

use crate::chart::{ChartKind, ChartOptions, TimeFormat};
use crate::dimension::Dimension;
use crate::filter::Filter;
use crate::metrics::{ActiveMetricFlags, ChartMetric};
use crate::period::{DateRange, Period, TimeBucket};
use crate::project::ProjectId;
use crate::query::{DecodeOutcome, Entitlement, PeriodCodec, ViewQuery};

/// Everything the project dashboard needs to render one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub project_id: ProjectId,
    pub query: ViewQuery,
    pub metrics: ActiveMetricFlags,
    pub chart_kind: ChartKind,
    pub time_format: TimeFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    SetPeriod(Period),
    SetCustomRange(DateRange),
    SetTimeBucket(TimeBucket),
    ApplyFilter(Filter),
    RemoveFilter(Dimension),
    ClearFilters,
    ToggleMetric(ChartMetric),
    SetChartKind(ChartKind),
    SetTimeFormat(TimeFormat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    Unchanged,
    /// The period needs a paid plan; state was left as is.
    UpgradeRequired(Period),
}

impl ViewState {
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            query: ViewQuery::default(),
            metrics: ActiveMetricFlags::default(),
            chart_kind: ChartKind::default(),
            time_format: TimeFormat::default(),
        }
    }

    /// Restores a view from a dashboard URL query. A denied paid period is
    /// returned alongside the fallback state.
    pub fn from_query(
        project_id: ProjectId,
        raw: &str,
        entitlement: &Entitlement,
        codec: &PeriodCodec,
    ) -> (Self, Option<Period>) {
        let mut state = Self::new(project_id);
        match codec.decode(raw, entitlement) {
            DecodeOutcome::Applied { query } => {
                state.query = query;
                (state, None)
            }
            DecodeOutcome::UpgradeRequired {
                requested,
                fallback,
            } => {
                state.query = fallback;
                (state, Some(requested))
            }
        }
    }

    pub fn to_query(&self, codec: &PeriodCodec) -> String {
        codec.encode(&self.query)
    }

    pub fn chart_options(&self, apply_regions: bool) -> ChartOptions {
        ChartOptions {
            apply_regions,
            time_bucket: self.query.time_bucket,
            time_format: self.time_format,
            chart_kind: self.chart_kind,
        }
    }

    pub fn reduce(
        &mut self,
        action: ViewAction,
        entitlement: &Entitlement,
        codec: &PeriodCodec,
    ) -> Transition {
        debug!("Reducing {:?} for project {}", action, self.project_id);

        match action {
            ViewAction::SetPeriod(Period::Custom) => {
                debug!("Custom period needs a range, ignoring");
                Transition::Unchanged
            }
            ViewAction::SetPeriod(period) => {
                if !codec.is_entitled(entitlement, period) {
                    return Transition::UpgradeRequired(period);
                }
                if self.query.period == period {
                    return Transition::Unchanged;
                }

                let mut query =
                    ViewQuery::relative(period).with_filters(self.query.filters.clone());
                if period.allows(self.query.time_bucket) {
                    query.time_bucket = self.query.time_bucket;
                }
                self.replace_query(query)
            }
            ViewAction::SetCustomRange(range) => {
                let query = ViewQuery::custom(range, Some(self.query.time_bucket))
                    .with_filters(self.query.filters.clone());
                self.replace_query(query)
            }
            ViewAction::SetTimeBucket(bucket) => {
                if bucket == self.query.time_bucket {
                    return Transition::Unchanged;
                }
                if !self.query.allowed_buckets().contains(&bucket) {
                    debug!("Bucket {} not allowed for {}", bucket, self.query.period);
                    return Transition::Unchanged;
                }
                self.query.time_bucket = bucket;
                Transition::Changed
            }
            ViewAction::ApplyFilter(filter) => {
                if self.query.filters.get(filter.column) == Some(&filter) {
                    return Transition::Unchanged;
                }
                self.query.filters.apply(filter);
                Transition::Changed
            }
            ViewAction::RemoveFilter(column) => match self.query.filters.remove(column) {
                Some(_) => Transition::Changed,
                None => Transition::Unchanged,
            },
            ViewAction::ClearFilters => {
                if self.query.filters.is_empty() {
                    return Transition::Unchanged;
                }
                self.query.filters.clear();
                Transition::Changed
            }
            ViewAction::ToggleMetric(metric) => {
                self.metrics.toggle(metric);
                Transition::Changed
            }
            ViewAction::SetChartKind(kind) => {
                if self.chart_kind == kind {
                    return Transition::Unchanged;
                }
                self.chart_kind = kind;
                Transition::Changed
            }
            ViewAction::SetTimeFormat(format) => {
                if self.time_format == format {
                    return Transition::Unchanged;
                }
                self.time_format = format;
                Transition::Changed
            }
        }
    }

    fn replace_query(&mut self, query: ViewQuery) -> Transition {
        if self.query == query {
            Transition::Unchanged
        } else {
            self.query = query;
            Transition::Changed
        }
    }
}
