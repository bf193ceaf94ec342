//! Al-Hadi Media record access
//!
//! A generic select/insert/update/delete interface over the site's named
//! collections, a PostgREST client implementing it, and the helper that links
//! uploaded media to program records.

pub mod media_links;
pub mod postgrest;
pub mod records;
pub mod store;

pub use media_links::{attach_upload, MediaLink};
pub use postgrest::PostgrestStore;
pub use records::Collection;
pub use store::{stamp_updated_at, Filter, RecordError, RecordResult, RecordStore};
