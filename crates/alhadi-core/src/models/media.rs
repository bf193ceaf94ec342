use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

const MB: u64 = 1024 * 1024;

/// Kind of media accepted by the uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Hard ceiling for video uploads.
    pub const VIDEO_MAX_BYTES: u64 = 50 * MB;
    /// Hard ceiling for image uploads.
    pub const IMAGE_MAX_BYTES: u64 = 5 * MB;

    pub fn max_size_bytes(self) -> u64 {
        match self {
            MediaKind::Video => Self::VIDEO_MAX_BYTES,
            MediaKind::Image => Self::IMAGE_MAX_BYTES,
        }
    }

    pub fn max_size_mb(self) -> u64 {
        self.max_size_bytes() / MB
    }

    /// MIME prefix a file of this kind must carry (`video/` or `image/`).
    pub fn mime_prefix(self) -> &'static str {
        match self {
            MediaKind::Video => "video/",
            MediaKind::Image => "image/",
        }
    }

    /// Storage folder used by the folder-prefixed naming variant.
    pub fn folder(self) -> &'static str {
        match self {
            MediaKind::Video => "videos",
            MediaKind::Image => "thumbnails",
        }
    }

    /// Extension used when the original filename has none.
    pub fn default_extension(self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Image => "jpg",
        }
    }

    /// Infer the kind from a MIME type, if it is a video or an image.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let normalized = mime_type.trim().to_lowercase();
        if normalized.starts_with("video/") {
            Some(MediaKind::Video)
        } else if normalized.starts_with("image/") {
            Some(MediaKind::Image)
        } else {
            None
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Image => write!(f, "image"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "video" => Ok(MediaKind::Video),
            "image" | "thumbnail" => Ok(MediaKind::Image),
            _ => Err(anyhow::anyhow!("Invalid media kind: {}", s)),
        }
    }
}

/// A file selected for upload: original name, declared MIME type and payload.
#[derive(Clone, Debug)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lowercased extension of the original filename, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| e.to_lowercase())
    }
}
