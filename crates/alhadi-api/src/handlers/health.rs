use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

/// Liveness plus the configured storage backend and pending chunk sessions.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "storage": state.storage.backend_type().to_string(),
            "pending_chunk_uploads": state.chunks.len(),
        })),
    )
}
