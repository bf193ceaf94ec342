//! Collision-resistant object names: `<timestamp_ms>_<token>.<ext>`.

use alhadi_core::MediaKind;
use rand::Rng;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const TOKEN_LEN: usize = 12;
const TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn random_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_CHARSET[rng.random_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Extension of `original_name`, lowercased and limited to ASCII alphanumerics.
/// Falls back to the kind's default when missing or unusable.
pub fn extension_for(original_name: &str, kind: MediaKind) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| kind.default_extension().to_string())
}

/// Generate a unique name for an upload of `original_name`.
pub fn generate_name(original_name: &str, kind: MediaKind) -> String {
    format!(
        "{}_{}.{}",
        timestamp_millis(),
        random_token(),
        extension_for(original_name, kind)
    )
}

/// Storage path for a generated name, optionally under the kind's folder
/// (`videos/` or `thumbnails/`).
pub fn object_path(generated_name: &str, kind: MediaKind, folder_prefixed: bool) -> String {
    if folder_prefixed {
        format!("{}/{}", kind.folder(), generated_name)
    } else {
        generated_name.to_string()
    }
}
