use crate::keys::{path_after_prefix, validate_path};
use crate::traits::{Storage, StorageError, StorageResult, UploadOptions};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/alhadi/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Convert an object path to a filesystem path that stays under the base directory.
    fn key_to_path(&self, storage_path: &str) -> StorageResult<PathBuf> {
        validate_path(storage_path)?;

        let path = self.base_path.join(storage_path);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage path resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        storage_path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_path)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut open = fs::OpenOptions::new();
        open.write(true);
        if options.upsert {
            open.create(true).truncate(true);
        } else {
            open.create_new(true);
        }

        let mut file = open.open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                StorageError::AlreadyExists(storage_path.to_string())
            } else {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_path,
            content_type = %options.content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(storage_path.to_string())
    }

    fn public_url(&self, storage_path: &str) -> String {
        format!("{}/{}", self.base_url, storage_path)
    }

    async fn remove(&self, paths: &[String]) -> StorageResult<()> {
        for storage_path in paths {
            let path = self.key_to_path(storage_path)?;

            match fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Local storage delete successful");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "File already absent");
                }
                Err(e) => {
                    return Err(StorageError::DeleteFailed(format!(
                        "Failed to delete file {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
        Ok(())
    }

    fn path_from_public_url(&self, url: &str) -> Option<String> {
        path_after_prefix(url, &format!("{}/", self.base_url))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage_in(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:3000/media/".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_upload_and_remove() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let stored = storage
            .upload(
                "videos/1_abc.mp4",
                Bytes::from_static(b"video bytes"),
                &UploadOptions::new("video/mp4"),
            )
            .await
            .unwrap();
        assert_eq!(stored, "videos/1_abc.mp4");

        let on_disk = tokio::fs::read(dir.path().join("videos/1_abc.mp4"))
            .await
            .unwrap();
        assert_eq!(on_disk, b"video bytes");

        storage.remove(&[stored.clone()]).await.unwrap();
        assert!(!dir.path().join("videos/1_abc.mp4").exists());
    }

    #[tokio::test]
    async fn test_local_storage_refuses_overwrite_without_upsert() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let options = UploadOptions::new("image/jpeg");

        storage
            .upload("thumbnails/t.jpg", Bytes::from_static(b"one"), &options)
            .await
            .unwrap();
        let second = storage
            .upload("thumbnails/t.jpg", Bytes::from_static(b"two"), &options)
            .await;
        assert!(matches!(second, Err(StorageError::AlreadyExists(_))));

        storage
            .upload(
                "thumbnails/t.jpg",
                Bytes::from_static(b"two"),
                &options.clone().with_upsert(true),
            )
            .await
            .unwrap();
        let on_disk = tokio::fs::read(dir.path().join("thumbnails/t.jpg"))
            .await
            .unwrap();
        assert_eq!(on_disk, b"two");
    }

    #[tokio::test]
    async fn test_local_storage_path_traversal_protection() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let options = UploadOptions::new("video/mp4");

        let result = storage
            .upload("../escape.mp4", Bytes::from_static(b"x"), &options)
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.remove(&["/etc/passwd".to_string()]).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_remove_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage.remove(&["videos/missing.mp4".to_string()]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_public_url_round_trip() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let url = storage.public_url("videos/1_abc.mp4");
        assert_eq!(url, "http://localhost:3000/media/videos/1_abc.mp4");
        assert_eq!(
            storage.path_from_public_url(&url).as_deref(),
            Some("videos/1_abc.mp4")
        );
        assert_eq!(storage.path_from_public_url("https://elsewhere/x.mp4"), None);
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }
}
