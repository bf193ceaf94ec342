//! Resilient media uploads
//!
//! Files are validated locally against their media kind, given a
//! collision-resistant name and stored through one of three strategies:
//! directly to storage, relayed through the server, or in chunks reassembled
//! server-side. Progress is observable per task; videos get a display duration.

pub mod chunks;
pub mod error;
pub mod naming;
pub mod probe;
pub mod progress;
pub mod strategy;
pub mod uploader;
pub mod validator;

pub use chunks::{AssembledFile, ChunkPart, ChunkProgress, ChunkStore};
pub use error::{ChunkError, ProbeError, UploadError, ValidationError};
pub use naming::{generate_name, object_path};
pub use probe::{
    display_duration, format_duration, DurationProbe, FfprobeDurationProbe, PLACEHOLDER_DURATION,
};
pub use progress::{ProgressSettings, UploadState, UploadStatus};
pub use strategy::{
    ChunkedStrategy, DirectStrategy, RelayStrategy, RelayUploadResponse, StoredObject,
    StrategyRequest, UploadStrategy,
};
pub use uploader::{ResilientUploader, UploadOutcome, UploadTask, UploaderSettings};
pub use validator::MediaValidator;
