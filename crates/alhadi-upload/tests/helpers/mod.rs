//! Mock collaborators for upload tests.

#![allow(dead_code)]

use alhadi_storage::{Storage, StorageBackend, StorageError, StorageResult, UploadOptions};
use alhadi_upload::{DurationProbe, ProbeError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const PUBLIC_BASE: &str = "https://cdn.test/storage/v1/object/public/videos";

/// In-memory storage that counts every call.
#[derive(Clone, Default)]
pub struct MockStorage {
    pub objects: Arc<Mutex<HashMap<String, (UploadOptions, Bytes)>>>,
    pub upload_calls: Arc<AtomicUsize>,
    pub fail_with: Arc<Mutex<Option<StorageError>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(err: StorageError) -> Self {
        let storage = Self::default();
        *storage.fail_with.lock().unwrap() = Some(err);
        storage
    }

    pub fn calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<String> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), (options.clone(), data));
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", PUBLIC_BASE, path)
    }

    async fn remove(&self, paths: &[String]) -> StorageResult<()> {
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }

    fn path_from_public_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&format!("{}/", PUBLIC_BASE))
            .map(String::from)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}

/// Probe returning a fixed result.
pub struct FixedProbe(pub Option<f64>);

#[async_trait]
impl DurationProbe for FixedProbe {
    async fn probe_seconds(&self, _url: &str) -> Result<f64, ProbeError> {
        self.0.ok_or(ProbeError::MissingDuration)
    }
}

pub fn megabytes(n: usize) -> Vec<u8> {
    vec![7u8; n * 1024 * 1024]
}
