//! Media element seam: the surface the stream is rendered into.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// Controls are only usable once the stream is available.
    #[error("Stream is not available")]
    NotAvailable,

    /// `play()` was rejected, e.g. by an autoplay policy.
    #[error("Play request rejected: {0}")]
    PlayRejected(String),

    #[error("{vendor} fullscreen API is not available")]
    FullscreenUnavailable { vendor: FullscreenVendor },

    #[error("No fullscreen API available")]
    NoFullscreen,
}

/// Fullscreen API flavours, tried in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenVendor {
    Standard,
    Webkit,
    Moz,
    Ms,
}

impl FullscreenVendor {
    pub const FALLBACK_ORDER: [FullscreenVendor; 4] = [
        FullscreenVendor::Standard,
        FullscreenVendor::Webkit,
        FullscreenVendor::Moz,
        FullscreenVendor::Ms,
    ];

    /// Name of the fullscreen-change event for this API.
    pub fn change_event(&self) -> &'static str {
        match self {
            FullscreenVendor::Standard => "fullscreenchange",
            FullscreenVendor::Webkit => "webkitfullscreenchange",
            FullscreenVendor::Moz => "mozfullscreenchange",
            FullscreenVendor::Ms => "MSFullscreenChange",
        }
    }
}

impl std::fmt::Display for FullscreenVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FullscreenVendor::Standard => write!(f, "standard"),
            FullscreenVendor::Webkit => write!(f, "webkit"),
            FullscreenVendor::Moz => write!(f, "moz"),
            FullscreenVendor::Ms => write!(f, "ms"),
        }
    }
}

#[async_trait]
pub trait MediaElement: Send + Sync {
    async fn play(&self) -> Result<(), PlaybackError>;

    fn pause(&self);

    fn set_muted(&self, muted: bool);

    fn is_muted(&self) -> bool;

    /// Enter fullscreen through one vendor API; `FullscreenUnavailable` when
    /// this API is missing.
    fn request_fullscreen(&self, vendor: FullscreenVendor) -> Result<(), PlaybackError>;

    fn exit_fullscreen(&self, vendor: FullscreenVendor) -> Result<(), PlaybackError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_api_is_tried_first() {
        assert_eq!(FullscreenVendor::FALLBACK_ORDER[0], FullscreenVendor::Standard);
        assert_eq!(FullscreenVendor::Ms.change_event(), "MSFullscreenChange");
    }
}
