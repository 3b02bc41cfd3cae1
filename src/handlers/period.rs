use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::query::{Entitlement, ViewQuery};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeRequest {
    /// Raw URL query string, with or without the leading `?`.
    pub query: String,
    #[serde(default)]
    pub entitlement: Entitlement,
}

#[derive(Debug, Serialize)]
pub struct EncodeResponse {
    pub query: String,
}

pub async fn decode_period(
    State(state): State<AppState>,
    Json(request): Json<DecodeRequest>,
) -> Response {
    let outcome = state.codec.decode(&request.query, &request.entitlement);

    if outcome.is_upgrade_required() {
        info!(
            "Query '{}' needs a paid plan for project '{}'",
            request.query, request.entitlement.project_id
        );
        return (StatusCode::PAYMENT_REQUIRED, Json(outcome)).into_response();
    }

    Json(outcome).into_response()
}

pub async fn encode_period(
    State(state): State<AppState>,
    Json(query): Json<ViewQuery>,
) -> Json<EncodeResponse> {
    Json(EncodeResponse {
        query: state.codec.encode(&query),
    })
}
