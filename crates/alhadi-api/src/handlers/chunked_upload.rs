//! Chunked relay upload
//!
//! Each request carries one chunk. Chunks are buffered per `uploadId` until all
//! `totalChunks` have arrived, then the file is reassembled in index order and
//! stored like a whole-file upload.

use super::multipart::UploadForm;
use super::upload::relay_response;
use crate::error::HttpAppError;
use crate::state::AppState;
use alhadi_core::{AppError, FileUpload};
use alhadi_upload::{ChunkPart, ChunkProgress, RelayUploadResponse};
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// `POST /api/upload-chunk`
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut form = UploadForm::read(multipart, &["chunk"]).await?;
    let chunk = form
        .take_file("chunk")
        .ok_or_else(|| AppError::InvalidInput("No chunk provided".to_string()))?;

    let index: usize = form.parse("chunkIndex")?;
    let total: usize = form.parse("totalChunks")?;
    let upload_id = form.required("uploadId")?.to_string();
    let file_name = form
        .text("fileName")
        .map(String::from)
        .unwrap_or(chunk.file_name);
    let content_type = form
        .text("contentType")
        .map(String::from)
        .unwrap_or(chunk.content_type);
    let kind = form.media_kind(&content_type)?;

    let progress = state.chunks.accept(ChunkPart {
        upload_id: upload_id.clone(),
        index,
        total,
        file_name,
        content_type: Some(content_type),
        data: chunk.data,
    })?;

    let assembled = match progress {
        ChunkProgress::Pending { .. } => {
            return Ok(Json(RelayUploadResponse {
                success: true,
                message: Some(format!("Chunk {}/{} received", index + 1, total)),
                ..Default::default()
            }));
        }
        ChunkProgress::Complete(file) => file,
    };

    let content_type = assembled
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let outcome = state
        .uploader
        .upload(
            FileUpload::new(assembled.file_name, content_type, assembled.data),
            kind,
        )
        .await
        .inspect_err(|e| {
            tracing::error!(upload_id = %upload_id, error = %e, "Storing reassembled file failed");
        })?;

    Ok(Json(relay_response(
        outcome,
        Some(format!("File assembled from {} chunks", total)),
    )))
}
