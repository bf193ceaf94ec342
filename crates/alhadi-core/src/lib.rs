//! Al-Hadi Media core library
//!
//! This crate provides the domain types, error types and configuration that are
//! shared by the storage, upload, player, relay server and CLI crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{FileUpload, MediaKind, Program, PublishStatus};
pub use storage_types::StorageBackend;
