use crate::engine::EngineTuning;
use crate::session::DEFAULT_PROGRESS_CAP;
use alhadi_core::Config;
use std::time::Duration;

/// Timers and engine tuning for a player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    /// Hard limit for a candidate to reach `available`.
    pub load_timeout: Duration,
    pub progress_interval: Duration,
    pub progress_max_step: u8,
    pub progress_cap: u8,
    /// Delay between showing 100% and clearing the progress bar.
    pub settle_delay: Duration,
    pub tuning: EngineTuning,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(45),
            progress_interval: Duration::from_millis(500),
            progress_max_step: 15,
            progress_cap: DEFAULT_PROGRESS_CAP,
            settle_delay: Duration::from_secs(1),
            tuning: EngineTuning::default(),
        }
    }
}

impl PlayerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            load_timeout: config.stream_load_timeout(),
            ..Self::default()
        }
    }
}
