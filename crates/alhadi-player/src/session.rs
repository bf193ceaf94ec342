//! Live stream session state machine.
//!
//! `StreamSession::handle` consumes one input and returns the effects the
//! driver must perform. It never touches engines or timers itself, so every
//! transition can be exercised synchronously.

use crate::engine::{EngineEvent, ErrorKind};
use crate::messages;

/// Progress reported once the engine has loaded a variant playlist.
pub const LEVEL_LOADED_PROGRESS: u8 = 75;
/// Progress reported once the first fragment arrived.
pub const FRAG_LOADED_PROGRESS: u8 = 85;
pub const DEFAULT_PROGRESS_CAP: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamStatus {
    #[default]
    Checking,
    Available,
    Unavailable,
}

impl std::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamStatus::Checking => write!(f, "checking"),
            StreamStatus::Available => write!(f, "available"),
            StreamStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Observable view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamSnapshot {
    pub status: StreamStatus,
    pub active_index: usize,
    pub active_url: Option<String>,
    pub last_error: Option<String>,
    /// 0-100
    pub loading_progress: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    /// View mounted.
    Start,
    /// User asked to try again from the first candidate.
    Retry,
    Engine(EngineEvent),
    LoadTimeout,
    /// Simulated progress step.
    ProgressTick(u8),
    /// Grace delay after settling elapsed.
    ProgressReset,
    EngineUnsupported,
    EngineLoadFailed(String),
    /// The engine refused the active candidate's URL.
    SourceRejected(String),
    /// The engine could not recover from a media error in place.
    RecoveryUnsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Destroy the current engine and stop every timer.
    Teardown,
    /// Create an engine for `url` and start the load timeout and progress ticker.
    Load { index: usize, url: String },
    RecoverMedia,
    /// Stop the timeout and ticker, then reset progress after the grace delay.
    Settle,
}

#[derive(Debug, Clone, Copy)]
enum FailureCause {
    Network,
    Timeout,
}

#[derive(Debug, Clone)]
pub struct StreamSession {
    candidates: Vec<String>,
    active_index: usize,
    status: StreamStatus,
    last_error: Option<String>,
    loading_progress: u8,
    progress_cap: u8,
    recovery_attempted: bool,
}

impl StreamSession {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            active_index: 0,
            status: StreamStatus::Checking,
            last_error: None,
            loading_progress: 0,
            progress_cap: DEFAULT_PROGRESS_CAP,
            recovery_attempted: false,
        }
    }

    pub fn with_progress_cap(mut self, cap: u8) -> Self {
        self.progress_cap = cap.min(100);
        self
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_url(&self) -> Option<&str> {
        self.candidates.get(self.active_index).map(String::as_str)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn loading_progress(&self) -> u8 {
        self.loading_progress
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        StreamSnapshot {
            status: self.status,
            active_index: self.active_index,
            active_url: self.active_url().map(String::from),
            last_error: self.last_error.clone(),
            loading_progress: self.loading_progress,
        }
    }

    pub fn handle(&mut self, input: SessionInput) -> Vec<Effect> {
        match input {
            SessionInput::Start | SessionInput::Retry => self.restart(),
            SessionInput::Engine(event) => self.on_engine_event(event),
            SessionInput::LoadTimeout => {
                if self.status != StreamStatus::Checking {
                    return Vec::new();
                }
                tracing::warn!(
                    active_index = self.active_index,
                    url = self.active_url().unwrap_or_default(),
                    "Stream loading timed out"
                );
                self.fail_over(FailureCause::Timeout)
            }
            SessionInput::ProgressTick(step) => {
                if self.status == StreamStatus::Checking && self.loading_progress < self.progress_cap {
                    self.loading_progress = self
                        .loading_progress
                        .saturating_add(step)
                        .min(self.progress_cap);
                }
                Vec::new()
            }
            SessionInput::ProgressReset => {
                if self.status != StreamStatus::Checking {
                    self.loading_progress = 0;
                }
                Vec::new()
            }
            SessionInput::EngineUnsupported => {
                tracing::error!("Live playback is not supported by the engine");
                self.give_up(messages::ENGINE_UNSUPPORTED)
            }
            SessionInput::EngineLoadFailed(reason) => {
                tracing::error!(error = %reason, "Failed to load stream engine");
                self.give_up(messages::ENGINE_LOAD_FAILED)
            }
            SessionInput::SourceRejected(reason) => {
                if self.status != StreamStatus::Checking {
                    return Vec::new();
                }
                tracing::warn!(
                    active_index = self.active_index,
                    url = self.active_url().unwrap_or_default(),
                    error = %reason,
                    "Stream URL rejected by engine"
                );
                self.fail_over(FailureCause::Network)
            }
            SessionInput::RecoveryUnsupported => {
                if self.status == StreamStatus::Unavailable {
                    return Vec::new();
                }
                tracing::warn!(
                    active_index = self.active_index,
                    "Media error recovery unavailable, treating as network failure"
                );
                self.fail_over(FailureCause::Network)
            }
        }
    }

    fn restart(&mut self) -> Vec<Effect> {
        self.active_index = 0;
        self.recovery_attempted = false;
        self.last_error = None;
        self.loading_progress = 0;

        match self.candidates.first() {
            Some(url) => {
                self.status = StreamStatus::Checking;
                tracing::info!(active_index = 0, url = %url, "Loading stream");
                vec![
                    Effect::Teardown,
                    Effect::Load {
                        index: 0,
                        url: url.clone(),
                    },
                ]
            }
            None => {
                tracing::error!("No stream candidates configured");
                self.give_up(messages::STREAM_UNAVAILABLE)
            }
        }
    }

    fn on_engine_event(&mut self, event: EngineEvent) -> Vec<Effect> {
        if self.status == StreamStatus::Unavailable {
            return Vec::new();
        }

        match event {
            EngineEvent::ManifestParsed => {
                if self.status != StreamStatus::Checking {
                    return Vec::new();
                }
                tracing::info!(
                    active_index = self.active_index,
                    url = self.active_url().unwrap_or_default(),
                    "Stream manifest parsed"
                );
                self.status = StreamStatus::Available;
                self.last_error = None;
                self.loading_progress = 100;
                vec![Effect::Settle]
            }
            EngineEvent::LevelLoaded => {
                self.raise_milestone(LEVEL_LOADED_PROGRESS);
                Vec::new()
            }
            EngineEvent::FragLoaded => {
                self.raise_milestone(FRAG_LOADED_PROGRESS);
                Vec::new()
            }
            EngineEvent::Error {
                kind,
                fatal: false,
                details,
            } => {
                tracing::warn!(kind = %kind, details = %details, "Non-fatal stream error");
                Vec::new()
            }
            EngineEvent::Error {
                kind,
                fatal: true,
                details,
            } => {
                tracing::warn!(
                    kind = %kind,
                    details = %details,
                    active_index = self.active_index,
                    "Fatal stream error"
                );
                match kind {
                    ErrorKind::Network => self.fail_over(FailureCause::Network),
                    ErrorKind::Media if !self.recovery_attempted => {
                        self.recovery_attempted = true;
                        vec![Effect::RecoverMedia]
                    }
                    ErrorKind::Media => self.fail_over(FailureCause::Network),
                    ErrorKind::Other => self.give_up(messages::PLAYBACK_FAILED),
                }
            }
        }
    }

    fn raise_milestone(&mut self, value: u8) {
        if self.status == StreamStatus::Checking && value > self.loading_progress {
            self.loading_progress = value;
        }
    }

    /// Advance to the next candidate, or give up after the last one.
    fn fail_over(&mut self, cause: FailureCause) -> Vec<Effect> {
        let next = self.active_index + 1;
        if let Some(url) = self.candidates.get(next) {
            self.active_index = next;
            self.recovery_attempted = false;
            self.status = StreamStatus::Checking;
            self.loading_progress = 0;
            tracing::warn!(active_index = next, url = %url, "Trying next stream URL");
            return vec![
                Effect::Teardown,
                Effect::Load {
                    index: next,
                    url: url.clone(),
                },
            ];
        }

        let message = match cause {
            FailureCause::Timeout => messages::STREAM_UNAVAILABLE,
            FailureCause::Network => messages::PLAYBACK_FAILED,
        };
        self.give_up(message)
    }

    fn give_up(&mut self, message: &str) -> Vec<Effect> {
        self.status = StreamStatus::Unavailable;
        self.last_error = Some(message.to_string());
        self.loading_progress = 0;
        tracing::error!(
            active_index = self.active_index,
            error = %message,
            "Live stream unavailable"
        );
        vec![Effect::Teardown]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(urls: &[&str]) -> StreamSession {
        StreamSession::new(urls.iter().map(|u| u.to_string()).collect())
    }

    fn network_error() -> SessionInput {
        SessionInput::Engine(EngineEvent::fatal(ErrorKind::Network, "manifestLoadError"))
    }

    #[test]
    fn start_loads_first_candidate() {
        let mut s = session(&["a", "b"]);
        let effects = s.handle(SessionInput::Start);
        assert_eq!(
            effects,
            vec![
                Effect::Teardown,
                Effect::Load {
                    index: 0,
                    url: "a".into()
                }
            ]
        );
        assert_eq!(s.status(), StreamStatus::Checking);
    }

    #[test]
    fn network_error_falls_back_then_gives_up() {
        let mut s = session(&["a", "b"]);
        s.handle(SessionInput::Start);

        let effects = s.handle(network_error());
        assert_eq!(s.status(), StreamStatus::Checking);
        assert_eq!(s.active_index(), 1);
        assert!(effects.contains(&Effect::Load {
            index: 1,
            url: "b".into()
        }));

        let effects = s.handle(network_error());
        assert_eq!(effects, vec![Effect::Teardown]);
        assert_eq!(s.status(), StreamStatus::Unavailable);
        assert_eq!(s.active_index(), 1);
        assert_eq!(s.last_error(), Some(messages::PLAYBACK_FAILED));
    }

    #[test]
    fn timeout_on_last_candidate_reports_unavailable() {
        let mut s = session(&["a"]);
        s.handle(SessionInput::Start);
        s.handle(SessionInput::LoadTimeout);
        assert_eq!(s.status(), StreamStatus::Unavailable);
        assert_eq!(s.last_error(), Some(messages::STREAM_UNAVAILABLE));
    }

    #[test]
    fn timeout_after_available_is_ignored() {
        let mut s = session(&["a", "b"]);
        s.handle(SessionInput::Start);
        s.handle(SessionInput::Engine(EngineEvent::ManifestParsed));
        assert!(s.handle(SessionInput::LoadTimeout).is_empty());
        assert_eq!(s.status(), StreamStatus::Available);
        assert_eq!(s.active_index(), 0);
    }

    #[test]
    fn media_error_recovers_once_per_candidate() {
        let mut s = session(&["a", "b"]);
        s.handle(SessionInput::Start);
        let media = || SessionInput::Engine(EngineEvent::fatal(ErrorKind::Media, "bufferStalled"));

        assert_eq!(s.handle(media()), vec![Effect::RecoverMedia]);
        assert_eq!(s.status(), StreamStatus::Checking);
        assert_eq!(s.active_index(), 0);

        s.handle(media());
        assert_eq!(s.active_index(), 1);
        assert_eq!(s.handle(media()), vec![Effect::RecoverMedia]);
    }

    #[test]
    fn unsupported_recovery_is_a_network_failure() {
        let mut s = session(&["a", "b"]);
        s.handle(SessionInput::Start);
        s.handle(SessionInput::Engine(EngineEvent::fatal(ErrorKind::Media, "x")));
        s.handle(SessionInput::RecoveryUnsupported);
        assert_eq!(s.active_index(), 1);
        assert_eq!(s.status(), StreamStatus::Checking);
    }

    #[test]
    fn rejected_url_falls_over_like_network_error() {
        let mut s = session(&["not a url", "b"]);
        s.handle(SessionInput::Start);
        let effects = s.handle(SessionInput::SourceRejected("invalid URL".into()));
        assert_eq!(s.status(), StreamStatus::Checking);
        assert_eq!(s.active_index(), 1);
        assert_eq!(effects.last(), Some(&Effect::Load { index: 1, url: "b".into() }));

        s.handle(SessionInput::SourceRejected("invalid URL".into()));
        assert_eq!(s.status(), StreamStatus::Unavailable);
        assert_eq!(s.last_error(), Some(messages::PLAYBACK_FAILED));
    }

    #[test]
    fn other_fatal_error_is_terminal() {
        let mut s = session(&["a", "b"]);
        s.handle(SessionInput::Start);
        s.handle(SessionInput::Engine(EngineEvent::fatal(ErrorKind::Other, "x")));
        assert_eq!(s.status(), StreamStatus::Unavailable);
        assert_eq!(s.active_index(), 0);
    }

    #[test]
    fn non_fatal_error_changes_nothing() {
        let mut s = session(&["a"]);
        s.handle(SessionInput::Start);
        let before = s.snapshot();
        let effects = s.handle(SessionInput::Engine(EngineEvent::non_fatal(
            ErrorKind::Network,
            "fragLoadTimeOut",
        )));
        assert!(effects.is_empty());
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn progress_is_capped_until_milestones() {
        let mut s = session(&["a"]);
        s.handle(SessionInput::Start);
        for _ in 0..20 {
            s.handle(SessionInput::ProgressTick(15));
        }
        assert_eq!(s.loading_progress(), 90);

        let mut s = session(&["a"]);
        s.handle(SessionInput::Start);
        s.handle(SessionInput::ProgressTick(10));
        s.handle(SessionInput::Engine(EngineEvent::LevelLoaded));
        assert_eq!(s.loading_progress(), 75);
        s.handle(SessionInput::Engine(EngineEvent::FragLoaded));
        assert_eq!(s.loading_progress(), 85);
        s.handle(SessionInput::Engine(EngineEvent::LevelLoaded));
        assert_eq!(s.loading_progress(), 85);
    }

    #[test]
    fn manifest_parsed_settles_and_reset_clears_progress() {
        let mut s = session(&["a"]);
        s.handle(SessionInput::Start);
        assert_eq!(
            s.handle(SessionInput::Engine(EngineEvent::ManifestParsed)),
            vec![Effect::Settle]
        );
        assert_eq!(s.loading_progress(), 100);
        s.handle(SessionInput::ProgressReset);
        assert_eq!(s.loading_progress(), 0);
    }

    #[test]
    fn retry_is_idempotent() {
        let mut s = session(&["a", "b", "c"]);
        s.handle(SessionInput::Start);
        s.handle(network_error());
        s.handle(network_error());
        s.handle(network_error());
        assert_eq!(s.status(), StreamStatus::Unavailable);

        for _ in 0..3 {
            let effects = s.handle(SessionInput::Retry);
            assert_eq!(s.status(), StreamStatus::Checking);
            assert_eq!(s.active_index(), 0);
            assert!(s.last_error().is_none());
            assert_eq!(
                effects.last(),
                Some(&Effect::Load {
                    index: 0,
                    url: "a".into()
                })
            );
        }
    }

    #[test]
    fn events_after_unavailable_are_ignored() {
        let mut s = session(&["a"]);
        s.handle(SessionInput::Start);
        s.handle(network_error());
        assert!(s.handle(SessionInput::Engine(EngineEvent::ManifestParsed)).is_empty());
        assert_eq!(s.status(), StreamStatus::Unavailable);
    }

    #[test]
    fn empty_candidate_list_is_unavailable() {
        let mut s = session(&[]);
        assert_eq!(s.handle(SessionInput::Start), vec![Effect::Teardown]);
        assert_eq!(s.status(), StreamStatus::Unavailable);
        assert!(s.active_url().is_none());
    }

    #[test]
    fn engine_setup_failures_use_specific_messages() {
        let mut s = session(&["a"]);
        s.handle(SessionInput::Start);
        s.handle(SessionInput::EngineUnsupported);
        assert_eq!(s.last_error(), Some(messages::ENGINE_UNSUPPORTED));

        s.handle(SessionInput::Retry);
        s.handle(SessionInput::EngineLoadFailed("boom".into()));
        assert_eq!(s.last_error(), Some(messages::ENGINE_LOAD_FAILED));
    }

    #[test]
    fn active_index_never_decreases_without_retry() {
        let mut s = session(&["a", "b", "c"]);
        s.handle(SessionInput::Start);
        let inputs = [
            SessionInput::ProgressTick(5),
            network_error(),
            SessionInput::Engine(EngineEvent::fatal(ErrorKind::Media, "m")),
            SessionInput::LoadTimeout,
            SessionInput::Engine(EngineEvent::LevelLoaded),
            network_error(),
            network_error(),
            SessionInput::LoadTimeout,
        ];
        let mut last = 0;
        for input in inputs {
            s.handle(input);
            assert!(s.active_index() >= last);
            assert!(s.active_index() < s.candidates().len());
            last = s.active_index();
        }
        assert_eq!(s.status(), StreamStatus::Unavailable);
    }
}
