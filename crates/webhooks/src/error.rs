//! Unified error handling for the webhook service.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::email::EmailError;

/// Application-level error type for the webhook service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Email rendering or delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Request rejected for a missing or invalid signature.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed request body.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_) | Self::Email(_)) {
            tracing::error!(error = %self, "Request error");
        }

        let (status, message) = match &self {
            // Don't expose internal error details to callers
            Self::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            Self::Email(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send email".to_string(),
            ),
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.clone()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
