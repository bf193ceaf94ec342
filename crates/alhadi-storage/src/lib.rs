//! Al-Hadi Media storage library
//!
//! Blob storage abstraction for uploaded videos and thumbnails, with a
//! Supabase Storage REST backend and a local filesystem backend.
//!
//! # Object paths
//!
//! Objects are addressed by a relative path inside the configured bucket, e.g.
//! `videos/1718000000000_k3j9x0a7b2cd.mp4`. Paths must not be empty, contain
//! `..` or a backslash, or start with `/`. Validation lives in the `keys`
//! module so all backends agree.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-supabase")]
pub mod supabase;
pub mod traits;

// Re-export commonly used types
pub use alhadi_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-supabase")]
pub use supabase::SupabaseStorage;
pub use traits::{Storage, StorageError, StorageResult, UploadOptions};
