//! Live stream player
//!
//! Plays the first reachable stream out of an ordered list of candidate URLs.
//! Network failures and load timeouts fall back to the next candidate, media
//! errors get one in-place recovery, and anything else marks the stream
//! unavailable until the user retries.
//!
//! The decoder and the media element are injected through [`EngineFactory`]
//! and [`MediaElement`]; [`HttpProbeFactory`] provides a headless engine that
//! only verifies reachability.

pub mod controls;
pub mod element;
pub mod engine;
pub mod messages;
pub mod player;
pub mod probe_engine;
pub mod session;
pub mod settings;

pub use controls::{ControlState, PlaybackControls};
pub use element::{FullscreenVendor, MediaElement, PlaybackError};
pub use engine::{
    DecodeEngine, EngineError, EngineEvent, EngineEvents, EngineFactory, EngineTuning, ErrorKind,
};
pub use player::StreamPlayer;
pub use probe_engine::{HttpProbeEngine, HttpProbeFactory};
pub use session::{Effect, SessionInput, StreamSession, StreamSnapshot, StreamStatus};
pub use settings::PlayerSettings;
