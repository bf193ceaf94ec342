pub mod chunked_upload;
pub mod files;
pub mod health;
mod multipart;
pub mod upload;
