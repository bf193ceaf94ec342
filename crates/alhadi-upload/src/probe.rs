//! Duration probing for uploaded videos.

use crate::error::ProbeError;
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Shown when a video's duration cannot be read.
pub const PLACEHOLDER_DURATION: &str = "00:00";

/// Reads a media file's duration in seconds from its public URL.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn probe_seconds(&self, url: &str) -> Result<f64, ProbeError>;
}

/// `m:ss` with zero-padded seconds; fractional seconds are truncated.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return PLACEHOLDER_DURATION.to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Probe and format, degrading to the placeholder on any failure.
pub async fn display_duration(probe: &dyn DurationProbe, url: &str) -> String {
    match probe.probe_seconds(url).await {
        Ok(seconds) => format_duration(seconds),
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Duration probe failed, using placeholder");
            PLACEHOLDER_DURATION.to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
}

/// Parse `format.duration` from `ffprobe -of json` output.
pub fn parse_ffprobe_duration(stdout: &[u8]) -> Result<f64, ProbeError> {
    let output: FFprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| ProbeError::Parse(e.to_string()))?;

    output
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or(ProbeError::MissingDuration)
}

/// Runs `ffprobe` against the file URL.
pub struct FfprobeDurationProbe {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeDurationProbe {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    #[tracing::instrument(skip(self), fields(service = "ffprobe"))]
    async fn probe_seconds(&self, url: &str) -> Result<f64, ProbeError> {
        let mut command = Command::new(&self.ffprobe_path);
        command
            .args(["-v", "error", "-show_format", "-of", "json", url])
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ProbeError::Timeout)??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Failed(stderr.trim().to_string()));
        }

        parse_ffprobe_duration(&output.stdout)
    }
}
