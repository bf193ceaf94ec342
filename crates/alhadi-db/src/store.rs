//! Record store abstraction

use crate::records::Collection;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Record not found in {collection}: {id}")]
    NotFound { collection: Collection, id: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Record service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Record transport error: {0}")]
    Transport(String),

    #[error("Failed to decode record: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type RecordResult<T> = Result<T, RecordError>;

/// Equality filters plus ordering and limit for `select`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub eq: Vec<(String, String)>,
    /// Column and ascending flag.
    pub order: Option<(String, bool)>,
    pub limit: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.eq.push((column.into(), value.to_string()));
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some((column.into(), ascending));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a JSON row satisfies every equality filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.eq.iter().all(|(column, expected)| match row.get(column) {
            Some(Value::String(s)) => s == expected,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == *expected,
        })
    }
}

/// Generic access to the relational collaborator.
///
/// Rows are plain JSON objects; typed views such as `Program` are decoded by callers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(&self, collection: Collection, filter: &Filter) -> RecordResult<Vec<Value>>;

    /// Insert one row and return it as stored.
    async fn insert(&self, collection: Collection, record: Value) -> RecordResult<Value>;

    /// Apply `patch` to the row with `id`, stamping `updated_at`, and return the updated row.
    async fn update(&self, collection: Collection, id: &str, patch: Value) -> RecordResult<Value>;

    async fn delete(&self, collection: Collection, id: &str) -> RecordResult<()>;
}

/// Add an `updated_at` timestamp to a patch object.
pub fn stamp_updated_at(patch: Value) -> RecordResult<Value> {
    match patch {
        Value::Object(mut map) => {
            map.insert(
                "updated_at".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
            Ok(Value::Object(map))
        }
        other => Err(RecordError::InvalidRecord(format!(
            "patch must be a JSON object, got {}",
            other
        ))),
    }
}
