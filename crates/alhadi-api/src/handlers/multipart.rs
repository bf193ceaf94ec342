//! Multipart form reading shared by the upload routes

use alhadi_core::{AppError, MediaKind};
use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug)]
pub struct FormFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Text fields and file fields of one multipart request.
#[derive(Debug, Default)]
pub struct UploadForm {
    files: HashMap<String, FormFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every field. Fields named in `file_fields` are kept as files; each
    /// may appear once.
    pub async fn read(mut multipart: Multipart, file_fields: &[&str]) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
        {
            let name = field.name().map(|s| s.to_string()).unwrap_or_default();

            if file_fields.contains(&name.as_str()) {
                if form.files.contains_key(&name) {
                    return Err(AppError::InvalidInput(format!(
                        "Multiple '{}' fields are not allowed",
                        name
                    )));
                }
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

                form.files.insert(
                    name,
                    FormFile {
                        file_name,
                        content_type,
                        data,
                    },
                );
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read field {}: {}", name, e)))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn take_file(&mut self, name: &str) -> Option<FormFile> {
        self.files.remove(name)
    }

    /// Trimmed value of a text field; blank values count as missing.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &str) -> Result<&str, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::InvalidInput(format!("Missing field: {}", name)))
    }

    pub fn parse<T: FromStr>(&self, name: &str) -> Result<T, AppError> {
        self.required(name)?
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("Invalid value for {}", name)))
    }

    /// Media kind from the `kind` field, else from the MIME type, else video.
    pub fn media_kind(&self, content_type: &str) -> Result<MediaKind, AppError> {
        match self.text("kind") {
            Some(kind) => kind
                .parse()
                .map_err(|e: anyhow::Error| AppError::InvalidInput(e.to_string())),
            None => Ok(MediaKind::from_mime(content_type).unwrap_or(MediaKind::Video)),
        }
    }
}
