#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-supabase")]
use crate::SupabaseStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use alhadi_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-supabase")]
        StorageBackend::Supabase => {
            let url = config.supabase_url.clone().ok_or_else(|| {
                StorageError::ConfigError("SUPABASE_URL not configured".to_string())
            })?;
            let key = config.supabase_anon_key.clone().ok_or_else(|| {
                StorageError::ConfigError("SUPABASE_ANON_KEY not configured".to_string())
            })?;

            let storage = SupabaseStorage::new(url, key, config.storage_bucket.clone());
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-supabase"))]
        StorageBackend::Supabase => Err(StorageError::ConfigError(
            "Supabase storage backend not available (storage-supabase feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
