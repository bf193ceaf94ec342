//! Test helpers: build AppState and router for integration tests.

#![allow(dead_code)]

use alhadi_api::setup::routes;
use alhadi_api::AppState;
use alhadi_core::{Config, StorageBackend};
use alhadi_storage::{LocalStorage, Storage, StorageError, StorageResult, UploadOptions};
use alhadi_upload::{DurationProbe, ProbeError};
use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const MEDIA_BASE_URL: &str = "http://localhost:3000/media";

/// Reports the same duration for every URL.
pub struct FixedProbe(pub f64);

#[async_trait]
impl DurationProbe for FixedProbe {
    async fn probe_seconds(&self, _url: &str) -> Result<f64, ProbeError> {
        Ok(self.0)
    }
}

/// Storage whose service rejects every upload.
pub struct RejectingStorage {
    pub message: String,
}

#[async_trait]
impl Storage for RejectingStorage {
    async fn upload(&self, _path: &str, _data: Bytes, _options: &UploadOptions) -> StorageResult<String> {
        Err(StorageError::Service {
            status: 400,
            message: self.message.clone(),
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", MEDIA_BASE_URL, path)
    }

    async fn remove(&self, _paths: &[String]) -> StorageResult<()> {
        Ok(())
    }

    fn path_from_public_url(&self, _url: &str) -> Option<String> {
        None
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}

pub fn test_config(storage_path: &str) -> Config {
    let storage_path = storage_path.to_string();
    Config::from_lookup(|key| match key {
        "STORAGE_BACKEND" => Some("local".to_string()),
        "LOCAL_STORAGE_PATH" => Some(storage_path.clone()),
        "LOCAL_STORAGE_BASE_URL" => Some(MEDIA_BASE_URL.to_string()),
        _ => None,
    })
    .expect("Failed to build test config")
}

/// Test application: server, state, and the storage directory.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Location of a stored object on disk.
    pub fn stored_file(&self, path: &str) -> PathBuf {
        self._temp_dir.path().join(path)
    }
}

async fn local_state() -> (Arc<AppState>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(temp_dir.path(), MEDIA_BASE_URL.to_string())
            .await
            .expect("Failed to create local storage"),
    );
    let config = test_config(&temp_dir.path().to_string_lossy());
    let state = Arc::new(AppState::new(
        config,
        storage,
        Some(Arc::new(FixedProbe(187.5))),
    ));
    (state, temp_dir)
}

/// Setup test app with local storage in a temporary directory.
pub async fn setup_test_app() -> TestApp {
    let (state, temp_dir) = local_state().await;
    let server = TestServer::new(routes::setup_routes(state.clone()))
        .expect("Failed to start test server");
    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}

/// Setup test app whose storage rejects every upload with `message`.
pub fn setup_rejecting_app(message: &str) -> TestServer {
    let storage: Arc<dyn Storage> = Arc::new(RejectingStorage {
        message: message.to_string(),
    });
    let state = Arc::new(AppState::new(test_config("/tmp/unused"), storage, None));
    TestServer::new(routes::setup_routes(state)).expect("Failed to start test server")
}

/// A relay reachable over real TCP, for the client-side strategies.
pub struct RelayServer {
    pub endpoint: String,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl RelayServer {
    pub fn stored_file(&self, path: &str) -> PathBuf {
        self._temp_dir.path().join(path)
    }
}

pub async fn spawn_relay() -> RelayServer {
    let (state, temp_dir) = local_state().await;
    let endpoint = serve(routes::setup_routes(state.clone())).await;
    RelayServer {
        endpoint,
        state,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_rejecting_relay(message: &str) -> String {
    let storage: Arc<dyn Storage> = Arc::new(RejectingStorage {
        message: message.to_string(),
    });
    let state = Arc::new(AppState::new(test_config("/tmp/unused"), storage, None));
    serve(routes::setup_routes(state)).await
}

async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
