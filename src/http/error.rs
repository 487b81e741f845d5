// src/http/error.rs

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::errors::{LocatorError, StagingError, SupervisorError};

/// Error type for HTTP handlers.
///
/// Wraps the domain errors and renders them as `{"error": .., "code": ..}`.
/// Internal failures are logged in full and returned with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// Malformed request the domain layer never saw (e.g. broken multipart).
    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Staging(err) => match err {
                StagingError::MissingRequired(_) => {
                    (StatusCode::BAD_REQUEST, "MISSING_INPUT", err.to_string())
                }
                StagingError::InUse => (StatusCode::CONFLICT, "STAGING_IN_USE", err.to_string()),
                StagingError::Io(source) => {
                    tracing::error!(error = ?source, "staging I/O failure");
                    internal("STAGING_IO")
                }
            },

            ApiError::Supervisor(err) => match err {
                SupervisorError::AlreadyRunning { .. } => {
                    (StatusCode::CONFLICT, "ALREADY_RUNNING", err.to_string())
                }
                SupervisorError::LaunchFailure { .. } => {
                    tracing::error!(error = %err, "recovery launch failure");
                    internal("LAUNCH_FAILURE")
                }
            },

            // Both are reported as not found; Unreadable is worth a retry.
            ApiError::Locator(err) => match err {
                LocatorError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "BACKUP_NOT_FOUND",
                    "No backup file available".to_string(),
                ),
                LocatorError::Unreadable { name, .. } => {
                    tracing::warn!(error = %err, "backup vanished before it could be served");
                    (
                        StatusCode::NOT_FOUND,
                        "BACKUP_UNREADABLE",
                        format!("Backup file {name} is no longer available; try again"),
                    )
                }
            },

            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

fn internal(code: &'static str) -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        code,
        "An internal error occurred".to_string(),
    )
}
