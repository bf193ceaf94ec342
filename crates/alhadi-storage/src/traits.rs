//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage path: {0}")]
    InvalidKey(String),

    /// The storage service answered with an error payload.
    #[error("Storage service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The storage service could not be reached.
    #[error("Storage transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// True when the failure happened before the service produced a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, StorageError::Transport(_))
    }

    /// Message reported by the collaborator, without the local prefix.
    pub fn service_message(&self) -> String {
        match self {
            StorageError::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Metadata sent alongside an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    /// Cache lifetime in seconds, sent as `max-age`.
    pub cache_control: String,
    /// Overwrite an existing object at the same path.
    pub upsert: bool,
}

impl UploadOptions {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            cache_control: "3600".to_string(),
            upsert: false,
        }
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = cache_control.into();
        self
    }

    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }
}

/// Storage abstraction trait
///
/// Injected into the uploader and the relay server as `Arc<dyn Storage>`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` at `path` and return the stored path.
    ///
    /// Called at most once per upload attempt; backends never retry.
    async fn upload(&self, path: &str, data: Bytes, options: &UploadOptions)
        -> StorageResult<String>;

    /// Publicly reachable URL for a stored path.
    fn public_url(&self, path: &str) -> String;

    /// Remove the given paths. Missing objects are not an error.
    async fn remove(&self, paths: &[String]) -> StorageResult<()>;

    /// Invert `public_url`, returning the stored path if `url` belongs to this backend.
    fn path_from_public_url(&self, url: &str) -> Option<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
