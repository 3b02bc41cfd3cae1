use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, instrument};

use crate::chart::{ChartConfig, ChartConfigAssembler, ChartOptions};
use crate::error::Result;
use crate::filter::FilterSet;
use crate::metrics::{ActiveMetricFlags, ChartPayload, StatsPayload};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    pub payload: StatsPayload,
    #[serde(default)]
    pub metrics: ActiveMetricFlags,
    #[serde(default)]
    pub options: ChartOptions,
    #[serde(default)]
    pub forecast: Option<ChartPayload>,
    /// Per-bucket counts of custom events to overlay.
    #[serde(default)]
    pub custom_events: Option<BTreeMap<String, Vec<f64>>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    pub chart: ChartConfig,
    pub applied_filters: FilterSet,
}

#[instrument(skip_all)]
pub fn assemble_chart(request: &ChartRequest) -> Result<ChartResponse> {
    let bundle = request.payload.chart.to_bundle()?;
    let forecast = request
        .forecast
        .as_ref()
        .map(ChartPayload::to_bundle)
        .transpose()?;

    let chart = ChartConfigAssembler::new(&bundle, request.metrics, request.options)
        .with_forecast(forecast.as_ref())
        .with_custom_events(request.custom_events.as_ref())
        .assemble();

    Ok(ChartResponse {
        chart,
        applied_filters: request.payload.applied_filters(),
    })
}

pub async fn build_chart(
    Json(request): Json<ChartRequest>,
) -> std::result::Result<Json<ChartResponse>, StatusCode> {
    assemble_chart(&request).map(Json).map_err(|e| {
        error!("Failed to build chart: {}", e);
        StatusCode::UNPROCESSABLE_ENTITY
    })
}
