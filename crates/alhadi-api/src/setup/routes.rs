//! Route configuration

use crate::handlers::{chunked_upload, files, health, upload};
use crate::state::AppState;
use alhadi_core::MediaKind;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Headroom for multipart framing and text fields on top of the largest file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn setup_routes(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1_000)
        .max(1);

    let body_limit = MediaKind::VIDEO_MAX_BYTES as usize + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/upload", post(upload::upload_file))
        .route("/api/upload-chunk", post(chunked_upload::upload_chunk))
        .route("/api/files", delete(files::delete_file))
        .layer(DefaultBodyLimit::disable())
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
