use crate::error::Error;
use crate::service::IngestService;
use axum::{
    extract::{Json, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Request body: the registered Promob file to process
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub promob_file_id: Option<String>,
}

/// Success body
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub budget_id: Uuid,
    pub items_count: usize,
}

/// Failure body, shown verbatim to the user
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// Ingest one uploaded Promob XML file into its budget
pub async fn process_promob_file(
    State(service): State<Arc<IngestService>>,
    payload: Option<Json<ProcessRequest>>,
) -> Response {
    let file_id = match parse_file_id(payload.and_then(|Json(req)| req.promob_file_id)) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    match service.process_file(file_id).await {
        Ok(outcome) => {
            let response = ProcessResponse {
                success: true,
                budget_id: outcome.budget_id,
                items_count: outcome.items_count,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

fn parse_file_id(raw: Option<String>) -> Result<Uuid, Error> {
    let raw = raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(Error::MissingFileId)?;
    Uuid::parse_str(&raw).map_err(|_| Error::InvalidFileId(raw))
}

/// Budget with its line items
pub async fn get_budget(
    State(service): State<Arc<IngestService>>,
    Path(budget_id): Path<Uuid>,
) -> Response {
    match service.budget_detail(budget_id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Budget line items as CSV
pub async fn export_budget_items(
    State(service): State<Arc<IngestService>>,
    Path(budget_id): Path<Uuid>,
) -> Response {
    match service.export_budget_csv(budget_id).await {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
