//! Ways of getting file bytes into storage.
//!
//! `DirectStrategy` talks to the storage collaborator itself. `RelayStrategy`
//! and `ChunkedStrategy` route the bytes through the relay server, which
//! validates, names and stores the file on the client's behalf.

use crate::error::UploadError;
use crate::progress::{raise_progress, UploadState};
use alhadi_core::MediaKind;
use alhadi_storage::{Storage, UploadOptions};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Everything a strategy needs to store one file.
#[derive(Debug, Clone)]
pub struct StrategyRequest {
    pub kind: MediaKind,
    /// Target object path built from the generated name.
    pub path: String,
    pub original_name: String,
    pub content_type: String,
    pub cache_control: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub storage_path: String,
    pub public_url: String,
    /// Set when the intermediary already probed the duration.
    pub duration: Option<String>,
}

#[async_trait]
pub trait UploadStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether `send` raises progress itself. Otherwise the uploader simulates it.
    fn reports_progress(&self) -> bool {
        false
    }

    /// Store the file once. Implementations never retry.
    async fn send(
        &self,
        request: StrategyRequest,
        progress: &watch::Sender<UploadState>,
    ) -> Result<StoredObject, UploadError>;
}

/// Upload straight to the storage collaborator.
pub struct DirectStrategy {
    storage: Arc<dyn Storage>,
}

impl DirectStrategy {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl UploadStrategy for DirectStrategy {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn send(
        &self,
        request: StrategyRequest,
        _progress: &watch::Sender<UploadState>,
    ) -> Result<StoredObject, UploadError> {
        let options = UploadOptions::new(&request.content_type)
            .with_cache_control(&request.cache_control);

        let storage_path = self
            .storage
            .upload(&request.path, request.data, &options)
            .await
            .map_err(|e| UploadError::from_storage(request.kind, e))?;

        Ok(StoredObject {
            public_url: self.storage.public_url(&storage_path),
            storage_path,
            duration: None,
        })
    }
}

/// Body returned by the relay server's upload routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelayUploadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RelayUploadResponse {
    fn into_stored(self, kind: MediaKind) -> Result<StoredObject, UploadError> {
        match (self.url, self.file_path) {
            (Some(public_url), Some(storage_path)) if self.success => Ok(StoredObject {
                storage_path,
                public_url,
                duration: self.duration,
            }),
            _ => Err(UploadError::Storage {
                kind,
                status: None,
                message: self
                    .message
                    .unwrap_or_else(|| "Relay response did not include a file URL".to_string()),
            }),
        }
    }
}

async fn post_form(
    client: &Client,
    url: &str,
    form: Form,
    kind: MediaKind,
) -> Result<RelayUploadResponse, UploadError> {
    let response = client
        .post(url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| UploadError::Transport {
            kind,
            message: e.to_string(),
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| UploadError::Transport {
        kind,
        message: e.to_string(),
    })?;

    if !status.is_success() {
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .or_else(|| v.get("message"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or(body);
        return Err(UploadError::Storage {
            kind,
            status: Some(status.as_u16()),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| UploadError::Storage {
        kind,
        status: Some(status.as_u16()),
        message: format!("Invalid relay response: {}", e),
    })
}

fn file_part(data: Bytes, file_name: &str, content_type: &str, kind: MediaKind) -> Result<Part, UploadError> {
    let len = data.len() as u64;
    Part::stream_with_length(data, len)
        .file_name(file_name.to_string())
        .mime_str(content_type)
        .map_err(|e| UploadError::Transport {
            kind,
            message: format!("Invalid content type: {}", e),
        })
}

/// Send the whole file to the relay server's `/api/upload` route.
pub struct RelayStrategy {
    client: Client,
    endpoint: String,
}

impl RelayStrategy {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl UploadStrategy for RelayStrategy {
    fn name(&self) -> &'static str {
        "relay"
    }

    async fn send(
        &self,
        request: StrategyRequest,
        _progress: &watch::Sender<UploadState>,
    ) -> Result<StoredObject, UploadError> {
        let form = Form::new()
            .text("kind", request.kind.to_string())
            .part(
                "file",
                file_part(
                    request.data,
                    &request.original_name,
                    &request.content_type,
                    request.kind,
                )?,
            );

        let url = format!("{}/api/upload", self.endpoint);
        post_form(&self.client, &url, form, request.kind)
            .await?
            .into_stored(request.kind)
    }
}

/// Split the file into fixed-size pieces posted to `/api/upload-chunk`.
pub struct ChunkedStrategy {
    client: Client,
    endpoint: String,
    chunk_size: usize,
}

impl ChunkedStrategy {
    pub fn new(endpoint: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Number of chunks needed for `len` bytes.
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size).max(1)
    }
}

#[async_trait]
impl UploadStrategy for ChunkedStrategy {
    fn name(&self) -> &'static str {
        "chunked"
    }

    fn reports_progress(&self) -> bool {
        true
    }

    async fn send(
        &self,
        request: StrategyRequest,
        progress: &watch::Sender<UploadState>,
    ) -> Result<StoredObject, UploadError> {
        let total = self.chunk_count(request.data.len());
        let upload_id = uuid::Uuid::new_v4().to_string();
        let url = format!("{}/api/upload-chunk", self.endpoint);

        for index in 0..total {
            let start = index * self.chunk_size;
            let end = (start + self.chunk_size).min(request.data.len());
            let chunk = request.data.slice(start..end);

            let form = Form::new()
                .part(
                    "chunk",
                    file_part(chunk, &request.original_name, &request.content_type, request.kind)?,
                )
                .text("chunkIndex", index.to_string())
                .text("totalChunks", total.to_string())
                .text("fileName", request.original_name.clone())
                .text("uploadId", upload_id.clone())
                .text("contentType", request.content_type.clone())
                .text("kind", request.kind.to_string());

            let response = post_form(&self.client, &url, form, request.kind).await?;
            raise_progress(progress, ((index + 1) * 95 / total) as u8);

            tracing::debug!(
                upload_id = %upload_id,
                chunk = index + 1,
                total,
                "Chunk sent"
            );

            if index + 1 == total {
                return response.into_stored(request.kind);
            }
        }

        Err(UploadError::Storage {
            kind: request.kind,
            status: None,
            message: "Chunked upload ended without a result".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_count_rounds_up() {
        let strategy = ChunkedStrategy::new("http://localhost:3000", 4);
        assert_eq!(strategy.chunk_count(0), 1);
        assert_eq!(strategy.chunk_count(4), 1);
        assert_eq!(strategy.chunk_count(5), 2);
        assert_eq!(strategy.chunk_count(12), 3);
    }

    #[test]
    fn relay_response_requires_url_and_path() {
        let ok = RelayUploadResponse {
            success: true,
            url: Some("https://x/videos/a.mp4".to_string()),
            file_path: Some("videos/a.mp4".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ok.into_stored(MediaKind::Video).unwrap().storage_path,
            "videos/a.mp4"
        );

        let pending = RelayUploadResponse {
            success: true,
            message: Some("Chunk 1/3 received".to_string()),
            ..Default::default()
        };
        assert!(pending.into_stored(MediaKind::Video).is_err());
    }

    #[test]
    fn relay_response_uses_camel_case() {
        let json = serde_json::to_value(RelayUploadResponse {
            success: true,
            url: Some("u".to_string()),
            file_path: Some("p".to_string()),
            file_name: Some("n".to_string()),
            duration: None,
            message: None,
        })
        .unwrap();
        assert_eq!(json["filePath"], "p");
        assert_eq!(json["fileName"], "n");
        assert!(json.get("duration").is_none());
    }
}
