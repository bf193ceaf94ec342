use crate::keys::{encode_path, path_after_prefix, validate_path};
use crate::traits::{Storage, StorageError, StorageResult, UploadOptions};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

/// Supabase Storage backend speaking the storage REST API.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl SupabaseStorage {
    /// Create a new SupabaseStorage instance
    ///
    /// # Arguments
    /// * `base_url` - Project URL (e.g., "https://abc.supabase.co")
    /// * `api_key` - Anon or service key sent as `apikey` and bearer token
    /// * `bucket` - Bucket that holds every uploaded object
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key, bucket)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, storage_path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            encode_path(storage_path)
        )
    }

    fn public_prefix(&self) -> String {
        format!("{}/storage/v1/object/public/{}/", self.base_url, self.bucket)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Turn a non-success response into `StorageError::Service`, keeping the service's message.
    async fn service_error(response: Response) -> StorageError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        StorageError::Service {
            status: status.as_u16(),
            message: error_message(status, &body),
        }
    }
}

/// Extract the message from a storage error body, falling back to the raw body or the status text.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

fn transport_error(err: reqwest::Error) -> StorageError {
    StorageError::Transport(err.to_string())
}

#[async_trait]
impl Storage for SupabaseStorage {
    async fn upload(
        &self,
        storage_path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<String> {
        validate_path(storage_path)?;
        let size = data.len();
        let start = std::time::Instant::now();

        let response = self
            .authorized(self.client.post(self.object_url(storage_path)))
            .header(reqwest::header::CONTENT_TYPE, &options.content_type)
            .header(
                reqwest::header::CACHE_CONTROL,
                format!("max-age={}", options.cache_control),
            )
            .header("x-upsert", options.upsert.to_string())
            .body(data)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err = Self::service_error(response).await;
            tracing::warn!(
                bucket = %self.bucket,
                key = %storage_path,
                error = %err,
                "Supabase storage upload rejected"
            );
            return Err(err);
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_path,
            content_type = %options.content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase storage upload successful"
        );

        Ok(storage_path.to_string())
    }

    fn public_url(&self, storage_path: &str) -> String {
        format!("{}{}", self.public_prefix(), encode_path(storage_path))
    }

    async fn remove(&self, paths: &[String]) -> StorageResult<()> {
        for storage_path in paths {
            validate_path(storage_path)?;
        }

        let response = self
            .authorized(
                self.client
                    .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket)),
            )
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        tracing::info!(
            bucket = %self.bucket,
            count = paths.len(),
            "Supabase storage delete successful"
        );
        Ok(())
    }

    fn path_from_public_url(&self, url: &str) -> Option<String> {
        path_after_prefix(url, &self.public_prefix())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}
