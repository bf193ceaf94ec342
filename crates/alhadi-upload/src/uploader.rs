//! Validate-then-upload orchestration.

use crate::error::UploadError;
use crate::naming::{generate_name, object_path};
use crate::probe::{display_duration, DurationProbe};
use crate::progress::{
    ProgressSettings, SimulatedProgress, StateSender, UploadState, UploadStatus,
};
use crate::strategy::{StrategyRequest, UploadStrategy};
use crate::validator::MediaValidator;
use alhadi_core::{FileUpload, MediaKind};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub kind: MediaKind,
    pub public_url: String,
    pub storage_path: String,
    pub generated_name: String,
    /// `m:ss` for videos when a duration probe is configured.
    pub duration: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploaderSettings {
    pub cache_control: String,
    /// Store under `videos/` or `thumbnails/` instead of the bucket root.
    pub folder_prefixed: bool,
    pub progress: ProgressSettings,
}

impl Default for UploaderSettings {
    fn default() -> Self {
        Self {
            cache_control: "3600".to_string(),
            folder_prefixed: true,
            progress: ProgressSettings::default(),
        }
    }
}

impl UploaderSettings {
    pub fn cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = cache_control.into();
        self
    }

    pub fn folder_prefixed(mut self, folder_prefixed: bool) -> Self {
        self.folder_prefixed = folder_prefixed;
        self
    }

    pub fn progress(mut self, progress: ProgressSettings) -> Self {
        self.progress = progress;
        self
    }
}

/// One file selected for upload, with observable state.
///
/// Subscribers see status, progress and the result URL change as the upload
/// runs. A task is discarded after its outcome has been shown.
pub struct UploadTask {
    file: FileUpload,
    kind: MediaKind,
    state: StateSender,
    reset: Mutex<Option<JoinHandle<()>>>,
}

impl UploadTask {
    pub fn new(file: FileUpload, kind: MediaKind) -> Self {
        let (tx, _rx) = watch::channel(UploadState::default());
        Self {
            file,
            kind,
            state: Arc::new(tx),
            reset: Mutex::new(None),
        }
    }

    pub fn file(&self) -> &FileUpload {
        &self.file
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.kind.max_size_bytes()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> UploadState {
        self.state.borrow().clone()
    }

    fn cancel_reset(&self) {
        let pending = self
            .reset
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = pending {
            handle.abort();
        }
    }

    fn schedule_reset(&self, settings: &ProgressSettings) {
        let state = self.state.clone();
        let delay = settings.reset_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.send_modify(|s| s.progress = 0);
        });
        *self
            .reset
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
    }
}

impl Drop for UploadTask {
    fn drop(&mut self) {
        self.cancel_reset();
    }
}

/// Validates files locally, then stores them through an `UploadStrategy`.
pub struct ResilientUploader {
    strategy: Arc<dyn UploadStrategy>,
    probe: Option<Arc<dyn DurationProbe>>,
    settings: UploaderSettings,
}

impl ResilientUploader {
    pub fn new(strategy: Arc<dyn UploadStrategy>) -> Self {
        Self {
            strategy,
            probe: None,
            settings: UploaderSettings::default(),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_settings(mut self, settings: UploaderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Upload a file in one call, without observing intermediate state.
    pub async fn upload(
        &self,
        file: FileUpload,
        kind: MediaKind,
    ) -> Result<UploadOutcome, UploadError> {
        let task = UploadTask::new(file, kind);
        self.run(&task).await
    }

    /// Run one upload attempt for `task`. A failed task can be run again.
    #[tracing::instrument(skip(self, task), fields(kind = %task.kind, file = %task.file.name, strategy = self.strategy.name()))]
    pub async fn run(&self, task: &UploadTask) -> Result<UploadOutcome, UploadError> {
        task.cancel_reset();
        task.state.send_modify(|s| {
            *s = UploadState {
                status: UploadStatus::Validating,
                ..UploadState::default()
            }
        });

        let validator = MediaValidator::new(task.kind);
        if let Err(e) = validator.validate(&task.file) {
            tracing::debug!(error = %e, size_bytes = task.file.size_bytes(), "Upload rejected by validation");
            let err = UploadError::from(e);
            self.fail(task, &err);
            return Err(err);
        }

        let generated_name = generate_name(&task.file.name, task.kind);
        let path = object_path(&generated_name, task.kind, self.settings.folder_prefixed);
        task.state.send_modify(|s| {
            s.status = UploadStatus::Uploading;
            s.generated_name = Some(generated_name.clone());
        });

        let request = StrategyRequest {
            kind: task.kind,
            path,
            original_name: task.file.name.clone(),
            content_type: task.file.mime_type.clone(),
            cache_control: self.settings.cache_control.clone(),
            data: task.file.data.clone(),
        };

        let start = std::time::Instant::now();
        let stored = {
            let _simulation = (!self.strategy.reports_progress())
                .then(|| SimulatedProgress::start(task.state.clone(), self.settings.progress));
            self.strategy.send(request, &task.state).await
        };

        let stored = match stored {
            Ok(stored) => stored,
            Err(err) => {
                tracing::error!(error = %err, "Upload failed");
                self.fail(task, &err);
                return Err(err);
            }
        };

        task.state.send_modify(|s| {
            s.progress = 100;
            s.result_url = Some(stored.public_url.clone());
        });

        let duration = match (task.kind, stored.duration, &self.probe) {
            (MediaKind::Video, Some(duration), _) => Some(duration),
            (MediaKind::Video, None, Some(probe)) => {
                Some(display_duration(probe.as_ref(), &stored.public_url).await)
            }
            _ => None,
        };

        task.state.send_modify(|s| s.status = UploadStatus::Succeeded);
        task.schedule_reset(&self.settings.progress);

        tracing::info!(
            url = %stored.public_url,
            path = %stored.storage_path,
            size_bytes = task.file.size_bytes(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload successful"
        );

        let generated_name = stored
            .storage_path
            .rsplit('/')
            .next()
            .map(String::from)
            .unwrap_or(generated_name);

        Ok(UploadOutcome {
            kind: task.kind,
            public_url: stored.public_url,
            storage_path: stored.storage_path,
            generated_name,
            duration,
        })
    }

    /// Mark the task failed; progress keeps its last value.
    fn fail(&self, task: &UploadTask, err: &UploadError) {
        task.state.send_modify(|s| {
            s.status = UploadStatus::Failed;
            s.error = Some(err.localized_message());
        });
    }
}
