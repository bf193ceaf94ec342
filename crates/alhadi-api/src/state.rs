//! Shared application state

use alhadi_core::{Config, MediaKind};
use alhadi_storage::Storage;
use alhadi_upload::{
    ChunkStore, DirectStrategy, DurationProbe, ResilientUploader, UploaderSettings,
};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    /// Stores relayed files directly into `storage`.
    pub uploader: ResilientUploader,
    /// In-flight chunked uploads, keyed by upload id.
    pub chunks: ChunkStore,
}

impl AppState {
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        probe: Option<Arc<dyn DurationProbe>>,
    ) -> Self {
        let settings = UploaderSettings::default().cache_control(config.upload_cache_control.clone());
        let mut uploader = ResilientUploader::new(Arc::new(DirectStrategy::new(storage.clone())))
            .with_settings(settings);
        if let Some(probe) = probe {
            uploader = uploader.with_probe(probe);
        }

        Self {
            config,
            storage,
            uploader,
            chunks: ChunkStore::new(MediaKind::VIDEO_MAX_BYTES),
        }
    }
}
