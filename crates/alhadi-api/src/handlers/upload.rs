//! Whole-file relay upload

use super::multipart::UploadForm;
use crate::error::HttpAppError;
use crate::state::AppState;
use alhadi_core::{AppError, FileUpload};
use alhadi_upload::{RelayUploadResponse, UploadOutcome};
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

pub(crate) fn relay_response(outcome: UploadOutcome, message: Option<String>) -> RelayUploadResponse {
    RelayUploadResponse {
        success: true,
        url: Some(outcome.public_url),
        file_path: Some(outcome.storage_path),
        file_name: Some(outcome.generated_name),
        duration: outcome.duration,
        message,
    }
}

/// `POST /api/upload`: validate, name and store one file.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut form = UploadForm::read(multipart, &["file"]).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;
    let kind = form.media_kind(&file.content_type)?;

    tracing::info!(
        file = %file.file_name,
        content_type = %file.content_type,
        size_bytes = file.data.len(),
        kind = %kind,
        "Relay upload received"
    );

    let outcome = state
        .uploader
        .upload(
            FileUpload::new(file.file_name, file.content_type, file.data),
            kind,
        )
        .await?;

    Ok(Json(relay_response(outcome, None)))
}
