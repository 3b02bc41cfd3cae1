use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{error, instrument};

use crate::error::{Error, Result};
use crate::export::{BreakdownBundle, ExportArchive, ExportAssembler, DEFAULT_LANGUAGE};
use crate::project::ProjectId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub project_id: String,
    pub breakdown: BreakdownBundle,
    #[serde(default)]
    pub display_names: BTreeMap<String, String>,
    #[serde(default)]
    pub language: Option<String>,
}

pub struct ExportHandler {
    assembler: ExportAssembler,
}

impl ExportHandler {
    pub fn new(request: &ExportRequest) -> Result<Self> {
        let project_id = ProjectId::parse(&request.project_id)?;
        let assembler = ExportAssembler::new(project_id.as_str())
            .with_display_names(request.display_names.clone())
            .with_language(request.language.as_deref().unwrap_or(DEFAULT_LANGUAGE));

        Ok(Self { assembler })
    }

    #[instrument(skip_all)]
    pub async fn export(&self, breakdown: &BreakdownBundle) -> Result<ExportArchive> {
        self.assembler
            .export(breakdown, Utc::now().date_naive())
            .await
    }
}

pub async fn export_breakdown(Json(request): Json<ExportRequest>) -> Response {
    let result = match ExportHandler::new(&request) {
        Ok(handler) => handler.export(&request.breakdown).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(archive) => (
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", archive.filename),
                ),
            ],
            archive.bytes,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to export breakdown: {}", e);
            let status = match e {
                Error::InvalidProjectId(_) | Error::InvalidPayload(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            status.into_response()
        }
    }
}
