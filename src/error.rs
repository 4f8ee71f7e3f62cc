// Error types for the catalog client and the HTTP layer.
// The matching core itself never fails on malformed data.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::compare::CompareError;

/// Failures talking to the catalog (remote API or local snapshot).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned {status} for {url}")]
    Status { status: reqwest::StatusCode, url: String },

    #[error("Failed to read catalog snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<CompareError> for AppError {
    fn from(error: CompareError) -> Self {
        AppError::BadRequest(error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(message) => {
                tracing::debug!("Not found: {}", message);
                (StatusCode::NOT_FOUND, message.clone())
            }
            AppError::BadRequest(message) => {
                tracing::warn!("Bad request: {}", message);
                (StatusCode::BAD_REQUEST, message.clone())
            }
            AppError::Catalog(e) => {
                // Log the detail, don't expose it
                tracing::error!("Catalog error: {:?}", e);
                (StatusCode::BAD_GATEWAY, "Catalog unavailable".to_string())
            }
        };

        (status, Json(json!({ "success": false, "error": error_message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
