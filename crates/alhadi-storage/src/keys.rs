//! Shared object path handling for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Reject paths that could escape the bucket or the storage directory.
pub fn validate_path(path: &str) -> StorageResult<&str> {
    if path.trim().is_empty() {
        return Err(StorageError::InvalidKey("Storage path is empty".to_string()));
    }
    if path.contains("..") || path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage path contains invalid characters".to_string(),
        ));
    }
    Ok(path)
}

/// Percent-encode each segment of a path, keeping the `/` separators.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Strip `prefix` from `url` and decode the remaining path.
///
/// Query strings and fragments are dropped. Returns `None` if `url` does not
/// start with `prefix` or nothing is left after it.
pub fn path_after_prefix(url: &str, prefix: &str) -> Option<String> {
    let rest = url.strip_prefix(prefix)?;
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    if rest.is_empty() {
        return None;
    }
    urlencoding::decode(rest).ok().map(|p| p.into_owned())
}
