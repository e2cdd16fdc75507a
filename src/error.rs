use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while ingesting files or serving budgets
#[derive(Error, Debug)]
pub enum Error {
    #[error("promob_file_id is required")]
    MissingFileId,

    #[error("Invalid promob_file_id: {0}")]
    InvalidFileId(String),

    #[error("Promob file {0} not found")]
    FileNotFound(Uuid),

    #[error("Failed to download {path}: {reason}")]
    Download { path: String, reason: String },

    #[error("Budget {0} not found")]
    BudgetNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Ingestion exceeded the {0:?} time budget")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status surfaced to the caller for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingFileId | Error::InvalidFileId(_) => StatusCode::BAD_REQUEST,
            Error::FileNotFound(_) | Error::BudgetNotFound(_) => StatusCode::NOT_FOUND,
            Error::Download { .. } => StatusCode::BAD_GATEWAY,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Database(_) | Error::Csv(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
