//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use alhadi_core::Config;
use alhadi_upload::FfprobeDurationProbe;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// How often idle chunked uploads are swept.
const CHUNK_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Build storage, state and routes, and start background maintenance.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;
    tracing::info!(environment = %config.environment, "Configuration loaded and validated successfully");

    let storage = alhadi_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage")?;
    tracing::info!(backend = %storage.backend_type(), "Storage initialized");

    let probe = Arc::new(FfprobeDurationProbe::new(config.ffprobe_path.clone()));
    let state = Arc::new(AppState::new(config, storage, Some(probe)));

    spawn_chunk_sweeper(state.clone());

    let router = routes::setup_routes(state.clone());
    Ok((state, router))
}

/// Periodically evict chunked uploads idle for longer than the configured TTL.
pub fn spawn_chunk_sweeper(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let ttl = state.config.chunk_session_ttl();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CHUNK_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            state.chunks.evict_stale(ttl);
        }
    })
}
