use alhadi_core::MediaKind;
use alhadi_storage::StorageError;
use thiserror::Error;

/// Local checks on a selected file. Never reaches the network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid content type: {content_type} (expected {kind} file)")]
    InvalidContentType {
        content_type: String,
        kind: MediaKind,
    },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64, kind: MediaKind },

    #[error("Empty file")]
    EmptyFile,
}

impl ValidationError {
    pub fn localized_message(&self) -> String {
        match self {
            ValidationError::InvalidContentType {
                kind: MediaKind::Video,
                ..
            } => "لطفاً یک فایل ویدیویی معتبر انتخاب کنید".to_string(),
            ValidationError::InvalidContentType {
                kind: MediaKind::Image,
                ..
            } => "لطفاً یک فایل تصویری معتبر انتخاب کنید".to_string(),
            ValidationError::FileTooLarge { kind, .. } => format!(
                "حجم فایل نباید بیشتر از {} مگابایت باشد",
                kind.max_size_mb()
            ),
            ValidationError::EmptyFile => "فایلی انتخاب نشده است".to_string(),
        }
    }
}

/// Failure of one upload attempt.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The storage service or relay could not be reached.
    #[error("Upload transport failed: {message}")]
    Transport { kind: MediaKind, message: String },

    /// The storage service or relay answered with an error.
    #[error("Upload failed: {message}")]
    Storage {
        kind: MediaKind,
        status: Option<u16>,
        message: String,
    },
}

impl UploadError {
    pub fn from_storage(kind: MediaKind, err: StorageError) -> Self {
        match err {
            StorageError::Transport(message) => UploadError::Transport { kind, message },
            StorageError::Service { status, message } => UploadError::Storage {
                kind,
                status: Some(status),
                message,
            },
            other => UploadError::Storage {
                kind,
                status: None,
                message: other.to_string(),
            },
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, UploadError::Validation(_))
    }

    /// Persian message shown to the user; collaborator messages are kept verbatim.
    pub fn localized_message(&self) -> String {
        match self {
            UploadError::Validation(err) => err.localized_message(),
            UploadError::Transport { kind, message } | UploadError::Storage { kind, message, .. } => {
                let title = match kind {
                    MediaKind::Video => "خطا در آپلود ویدیو",
                    MediaKind::Image => "خطا در آپلود تصویر",
                };
                format!("{}: {}", title, message)
            }
        }
    }
}

/// Rejected chunk of a chunked upload. The session it belonged to is discarded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Chunk index {index} out of range for {total} chunks")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("Chunk count changed from {expected} to {got}")]
    TotalMismatch { expected: usize, got: usize },

    #[error("Invalid chunk count: {0}")]
    InvalidTotal(usize),

    #[error("Chunked upload exceeds {max} bytes")]
    TooLarge { max: u64 },

    #[error("Missing upload id")]
    MissingUploadId,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to run ffprobe: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ffprobe failed: {0}")]
    Failed(String),

    #[error("Failed to parse ffprobe output: {0}")]
    Parse(String),

    #[error("Media has no duration")]
    MissingDuration,

    #[error("Duration probe timed out")]
    Timeout,
}
