use crate::error::ValidationError;
use alhadi_core::{FileUpload, MediaKind};

/// Local validation of a selected file against its media kind.
///
/// Runs before any storage call; a rejected file never reaches the network.
pub struct MediaValidator {
    kind: MediaKind,
    max_file_size: u64,
}

impl MediaValidator {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            max_file_size: kind.max_size_bytes(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
                kind: self.kind,
            });
        }

        Ok(())
    }

    /// Validate that the MIME type belongs to the expected kind
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.trim().to_lowercase();

        if !normalized.starts_with(self.kind.mime_prefix()) {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                kind: self.kind,
            });
        }

        Ok(())
    }

    pub fn validate(&self, file: &FileUpload) -> Result<(), ValidationError> {
        self.validate_content_type(&file.mime_type)?;
        self.validate_file_size(file.size_bytes())
    }
}
