//! Chart, export and period logic for the swetrix project dashboard.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod chart;
pub mod config;
pub mod dev_tools;
pub mod dimension;
pub mod error;
pub mod export;
pub mod filter;
pub mod handlers;
pub mod metrics;
pub mod period;
pub mod project;
pub mod query;
pub mod series;
pub mod sso;
pub mod trendline;
pub mod view_state;

#[cfg(test)]
mod metrics_test;
#[cfg(test)]
mod period_test;
#[cfg(test)]
mod query_test;

pub use config::Config;
pub use error::{Error, Result};
pub use query::PeriodCodec;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub codec: Arc<PeriodCodec>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let codec = PeriodCodec::new(config.demo_project_id.as_str());
        Self {
            config: Arc::new(config),
            codec: Arc::new(codec),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let export_limit = state.config.export_max_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/chart", post(handlers::build_chart))
        .route("/period/decode", post(handlers::decode_period))
        .route("/period/encode", post(handlers::encode_period))
        .route(
            "/export",
            post(handlers::export_breakdown).layer(DefaultBodyLimit::max(export_limit)),
        )
        .route("/demo/payload", get(handlers::demo_payload))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
