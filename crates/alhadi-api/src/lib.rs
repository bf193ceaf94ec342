//! Al-Hadi Media relay server
//!
//! HTTP routes that store uploads on a client's behalf: whole files, chunked
//! uploads reassembled server-side, and file deletion.

pub mod error;
mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
