/// Error types for question-image-service
///
/// Every failure is rendered as `{"detail": "..."}`. Upload failures carry
/// the `Error uploading file:` prefix existing clients match on.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::services::UploadError;

/// Result type for question-image-service handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request (missing field, bad multipart, oversized file)
    #[error("{0}")]
    BadRequest(String),

    /// Failure inside the upload pipeline
    #[error("Error uploading file: {0}")]
    Upload(#[from] UploadError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upload(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        }

        HttpResponse::build(status).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}
