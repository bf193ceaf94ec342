//! Upload task state and simulated progress.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Validating,
    Uploading,
    Succeeded,
    Failed,
}

/// Observable state of one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadState {
    pub status: UploadStatus,
    /// 0-100
    pub progress: u8,
    pub generated_name: Option<String>,
    pub result_url: Option<String>,
    pub error: Option<String>,
}

/// Timing of the simulated progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSettings {
    pub interval: Duration,
    /// Largest random increment per tick.
    pub max_step: u8,
    /// Simulated progress never passes this value.
    pub cap: u8,
    /// Delay between snapping to 100 and resetting to 0.
    pub reset_delay: Duration,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_step: 15,
            cap: 90,
            reset_delay: Duration::from_secs(1),
        }
    }
}

/// Shared handle to an upload's state.
pub type StateSender = Arc<watch::Sender<UploadState>>;

/// Raise progress to `value`, never lowering it.
pub fn raise_progress(state: &watch::Sender<UploadState>, value: u8) {
    state.send_if_modified(|s| {
        let value = value.min(100);
        if value > s.progress {
            s.progress = value;
            true
        } else {
            false
        }
    });
}

/// Background ticker that nudges progress upward until dropped.
///
/// Dropping the guard aborts the ticker, so every exit path of the upload
/// (success, error, cancellation of the calling future) stops it.
pub struct SimulatedProgress {
    handle: JoinHandle<()>,
}

impl SimulatedProgress {
    pub fn start(state: StateSender, settings: ProgressSettings) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(settings.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let current = state.borrow().progress;
                if current >= settings.cap {
                    continue;
                }
                let step = rand::rng().random_range(0..=settings.max_step);
                raise_progress(&state, current.saturating_add(step).min(settings.cap));
            }
        });
        Self { handle }
    }
}

impl Drop for SimulatedProgress {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_progress_is_monotonic() {
        let (tx, rx) = watch::channel(UploadState::default());
        raise_progress(&tx, 40);
        raise_progress(&tx, 20);
        assert_eq!(rx.borrow().progress, 40);
        raise_progress(&tx, 250);
        assert_eq!(rx.borrow().progress, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn simulation_stays_below_cap_and_stops_on_drop() {
        let (tx, rx) = watch::channel(UploadState::default());
        let tx = Arc::new(tx);
        let settings = ProgressSettings::default();
        let sim = SimulatedProgress::start(tx.clone(), settings);

        let mut last = 0;
        for _ in 0..40 {
            tokio::time::sleep(settings.interval).await;
            let now = rx.borrow().progress;
            assert!(now >= last);
            assert!(now <= settings.cap);
            last = now;
        }

        drop(sim);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_simulation_never_ticks() {
        let (tx, rx) = watch::channel(UploadState::default());
        let settings = ProgressSettings {
            max_step: 10,
            ..ProgressSettings::default()
        };
        drop(SimulatedProgress::start(Arc::new(tx), settings));

        tokio::time::sleep(settings.interval * 10).await;
        assert_eq!(rx.borrow().progress, 0);
    }
}
