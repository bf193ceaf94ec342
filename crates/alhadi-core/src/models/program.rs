use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Published,
    #[default]
    Draft,
    Archived,
}

/// A program row in the `programs` collection.
///
/// Only `video_url`, `thumbnail_url` and `duration` are written by the upload
/// flow; the other columns are owned by the admin forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub status: PublishStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
