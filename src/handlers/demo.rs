use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dev_tools::PayloadGenerator;
use crate::metrics::StatsPayload;
use crate::period::{Period, TimeBucket};
use crate::project::ProjectId;
use crate::query::ViewQuery;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoParams {
    pub period: Option<String>,
    pub time_bucket: Option<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoPayload {
    pub project_id: ProjectId,
    pub query: ViewQuery,
    pub payload: StatsPayload,
}

pub async fn demo_payload(
    State(state): State<AppState>,
    Query(params): Query<DemoParams>,
) -> Result<Json<DemoPayload>, StatusCode> {
    let period = match params.period.as_deref() {
        Some(code) => Period::parse(code).ok_or_else(|| {
            warn!("Unknown demo period '{}'", code);
            StatusCode::BAD_REQUEST
        })?,
        None => Period::default(),
    };
    if period == Period::Custom {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut query = ViewQuery::relative(period);
    if let Some(bucket) = params
        .time_bucket
        .as_deref()
        .and_then(TimeBucket::parse)
        .filter(|b| period.allows(*b))
    {
        query.time_bucket = bucket;
    }

    let now = Utc::now();
    // Stable within the hour so reloads show the same numbers.
    let seed = params.seed.unwrap_or((now.timestamp() / 3600) as u64);
    let payload = PayloadGenerator::new(seed)
        .generate(period, query.time_bucket, now)
        .ok_or(StatusCode::BAD_REQUEST)?;

    Ok(Json(DemoPayload {
        project_id: state.config.demo_project_id.clone(),
        query,
        payload,
    }))
}
