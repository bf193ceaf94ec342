//! Decode engine seam.
//!
//! The engine owns manifest loading and media decoding. It reports what
//! happens through an event channel handed to it at creation; the player
//! drops that channel when the engine is torn down, so late events from a
//! destroyed engine are never observed.

use crate::element::MediaElement;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Class of an engine error, deciding the player's reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Manifest or segment could not be fetched.
    Network,
    /// Decoding failed; the engine may recover in place.
    Media,
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Media => write!(f, "media"),
            ErrorKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ManifestParsed,
    LevelLoaded,
    FragLoaded,
    Error {
        kind: ErrorKind,
        fatal: bool,
        details: String,
    },
}

impl EngineEvent {
    pub fn fatal(kind: ErrorKind, details: impl Into<String>) -> Self {
        EngineEvent::Error {
            kind,
            fatal: true,
            details: details.into(),
        }
    }

    pub fn non_fatal(kind: ErrorKind, details: impl Into<String>) -> Self {
        EngineEvent::Error {
            kind,
            fatal: false,
            details: details.into(),
        }
    }
}

pub type EngineEvents = mpsc::UnboundedSender<EngineEvent>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("HLS playback is not supported on this platform")]
    Unsupported,

    #[error("Failed to load stream engine: {0}")]
    Load(String),

    #[error("Engine cannot recover from media errors")]
    RecoveryUnsupported,
}

/// Buffering and retry tuning handed to every engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineTuning {
    pub max_buffer_length: Duration,
    pub max_max_buffer_length: Duration,
    /// Variant to start with; lower quality loads faster.
    pub start_level: usize,
    pub cap_level_to_player_size: bool,
    pub back_buffer_length: Duration,
    pub low_latency: bool,
    pub manifest_loading_timeout: Duration,
    pub manifest_loading_max_retry: u32,
    pub level_loading_timeout: Duration,
    pub level_loading_max_retry: u32,
    pub frag_loading_timeout: Duration,
    pub frag_loading_max_retry: u32,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            max_buffer_length: Duration::from_secs(60),
            max_max_buffer_length: Duration::from_secs(120),
            start_level: 1,
            cap_level_to_player_size: true,
            back_buffer_length: Duration::from_secs(90),
            low_latency: false,
            manifest_loading_timeout: Duration::from_secs(30),
            manifest_loading_max_retry: 3,
            level_loading_timeout: Duration::from_secs(30),
            level_loading_max_retry: 2,
            frag_loading_timeout: Duration::from_secs(30),
            frag_loading_max_retry: 3,
        }
    }
}

/// One live decode session bound to a source URL.
pub trait DecodeEngine: Send {
    fn attach_media(&mut self, element: Arc<dyn MediaElement>);

    /// Start loading `url`. Progress and failures arrive as events.
    fn load_source(&mut self, url: &str) -> Result<(), EngineError>;

    fn recover_media_error(&mut self) -> Result<(), EngineError>;

    /// Release connections and timers. Called once when the engine is discarded.
    fn destroy(&mut self);
}

/// Creates engines for the player, one per candidate attempt.
pub trait EngineFactory: Send + Sync {
    /// Whether this platform can play HLS at all.
    fn is_supported(&self) -> bool;

    fn create(
        &self,
        tuning: &EngineTuning,
        events: EngineEvents,
    ) -> Result<Box<dyn DecodeEngine>, EngineError>;
}
