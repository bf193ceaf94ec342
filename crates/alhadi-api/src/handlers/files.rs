//! Stored file deletion

use crate::error::HttpAppError;
use crate::state::AppState;
use alhadi_core::AppError;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    /// Object path inside the bucket, or the public URL of the object.
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteFileResponse {
    pub success: bool,
    pub path: String,
}

/// `DELETE /api/files`
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DeleteFileRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Json(request) = body?;
    let target = request.path.trim();
    if target.is_empty() {
        return Err(AppError::InvalidInput("File path is required".to_string()).into());
    }

    let path = state
        .storage
        .path_from_public_url(target)
        .unwrap_or_else(|| target.to_string());

    state.storage.remove(std::slice::from_ref(&path)).await?;
    tracing::info!(path = %path, "Stored file deleted");

    Ok(Json(DeleteFileResponse {
        success: true,
        path,
    }))
}
