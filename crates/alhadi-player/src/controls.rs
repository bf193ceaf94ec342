//! Play, mute and fullscreen toggles over a media element.

use crate::element::{FullscreenVendor, MediaElement, PlaybackError};
use crate::messages;
use crate::session::{StreamSnapshot, StreamStatus};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlState {
    pub playing: bool,
    pub muted: bool,
    pub fullscreen: bool,
    /// Set while a play request is pending.
    pub busy: bool,
    /// Last control failure; does not affect the stream status.
    pub error: Option<String>,
}

/// UI controls, usable only while the stream is available.
pub struct PlaybackControls {
    element: Arc<dyn MediaElement>,
    stream: watch::Receiver<StreamSnapshot>,
    state: watch::Sender<ControlState>,
}

impl PlaybackControls {
    pub fn new(element: Arc<dyn MediaElement>, stream: watch::Receiver<StreamSnapshot>) -> Self {
        let (state, _rx) = watch::channel(ControlState {
            muted: element.is_muted(),
            ..ControlState::default()
        });
        Self {
            element,
            stream,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ControlState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ControlState {
        self.state.borrow().clone()
    }

    fn ensure_available(&self) -> Result<(), PlaybackError> {
        if self.stream.borrow().status == StreamStatus::Available {
            Ok(())
        } else {
            Err(PlaybackError::NotAvailable)
        }
    }

    /// Pause when playing, otherwise request playback.
    ///
    /// A rejected play request is recorded as a transient error and returned.
    pub async fn toggle_play(&self) -> Result<(), PlaybackError> {
        self.ensure_available()?;

        if self.state.borrow().playing {
            self.element.pause();
            self.state.send_modify(|s| s.playing = false);
            return Ok(());
        }

        self.state.send_modify(|s| s.busy = true);
        match self.element.play().await {
            Ok(()) => {
                self.state.send_modify(|s| {
                    s.playing = true;
                    s.busy = false;
                    s.error = None;
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Error playing video");
                self.state.send_modify(|s| {
                    s.playing = false;
                    s.busy = false;
                    s.error = Some(messages::PLAYBACK_FAILED.to_string());
                });
                Err(e)
            }
        }
    }

    pub fn toggle_mute(&self) {
        let muted = !self.state.borrow().muted;
        self.element.set_muted(muted);
        self.state.send_modify(|s| s.muted = muted);
    }

    /// Enter or leave fullscreen through the first vendor API that works.
    ///
    /// The fullscreen flag itself only changes through `on_fullscreen_change`.
    pub fn toggle_fullscreen(&self) -> Result<FullscreenVendor, PlaybackError> {
        let entering = !self.state.borrow().fullscreen;
        for vendor in FullscreenVendor::FALLBACK_ORDER {
            let attempt = if entering {
                self.element.request_fullscreen(vendor)
            } else {
                self.element.exit_fullscreen(vendor)
            };
            match attempt {
                Ok(()) => return Ok(vendor),
                Err(PlaybackError::FullscreenUnavailable { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(PlaybackError::NoFullscreen)
    }

    /// Fullscreen-change listener for any vendor event.
    pub fn on_fullscreen_change(&self, active: bool) {
        self.state.send_if_modified(|s| {
            let changed = s.fullscreen != active;
            s.fullscreen = active;
            changed
        });
    }
}
