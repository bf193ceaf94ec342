//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Library errors
//! (`UploadError`, `ChunkError`, `StorageError`) convert into `AppError` here so
//! every failure renders the same JSON body and is logged at its own level.

use alhadi_core::{AppError, ErrorMetadata, LogLevel};
use alhadi_storage::StorageError;
use alhadi_upload::{ChunkError, UploadError, ValidationError};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper so `AppError` from alhadi-core can implement `IntoResponse`.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        let message = err.localized_message();
        match err {
            ValidationError::FileTooLarge { .. } => HttpAppError(AppError::PayloadTooLarge(message)),
            _ => HttpAppError(AppError::InvalidInput(message)),
        }
    }
}

impl From<UploadError> for HttpAppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation(e) => e.into(),
            UploadError::Transport { message, .. } => {
                HttpAppError(AppError::StorageUnavailable(message))
            }
            UploadError::Storage { message, .. } => HttpAppError(AppError::StorageRejected(message)),
        }
    }
}

impl From<ChunkError> for HttpAppError {
    fn from(err: ChunkError) -> Self {
        match err {
            ChunkError::TooLarge { .. } => HttpAppError(AppError::PayloadTooLarge(err.to_string())),
            _ => HttpAppError(AppError::BadRequest(err.to_string())),
        }
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::Service { status: 404, message } => AppError::NotFound(message),
            StorageError::Service { message, .. } => AppError::StorageRejected(message),
            StorageError::Transport(msg) => AppError::StorageUnavailable(msg),
            other => AppError::Storage(other.to_string()),
        };
        HttpAppError(app)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let show_details = !is_production_env() && !app_error.is_sensitive();
        let body = ErrorResponse {
            error: app_error.client_message(),
            details: show_details.then(|| app_error.detailed_message()),
            error_type: show_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        };

        (status, Json(body)).into_response()
    }
}
