use alhadi_player::{StreamPlayer, StreamSnapshot, StreamStatus};
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// MIME type for a local file, from its extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// One line describing how the stream changed, or `None` when only the
/// loading progress moved.
pub fn describe_transition(previous: &StreamSnapshot, current: &StreamSnapshot) -> Option<String> {
    if previous.status == current.status
        && previous.active_index == current.active_index
        && previous.last_error == current.last_error
    {
        return None;
    }

    let url = current.active_url.as_deref().unwrap_or("-");
    let line = match current.status {
        StreamStatus::Checking => format!("checking [{}] {}", current.active_index, url),
        StreamStatus::Available => format!("available [{}] {}", current.active_index, url),
        StreamStatus::Unavailable => format!(
            "unavailable: {}",
            current.last_error.as_deref().unwrap_or("unknown error")
        ),
    };
    Some(line)
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Follow the player's state, passing each transition line to `report`.
///
/// With `once`, returns the first settled status. Otherwise retries every
/// `retry_after` for as long as the stream stays unavailable, and only
/// returns if the player task ends.
pub async fn watch_player(
    player: &StreamPlayer,
    once: bool,
    retry_after: Duration,
    mut report: impl FnMut(String),
) -> Option<StreamStatus> {
    let mut rx = player.subscribe();
    let mut current = rx.borrow_and_update().clone();
    report(format!(
        "checking [{}] {}",
        current.active_index,
        current.active_url.as_deref().unwrap_or("-")
    ));
    if current.status == StreamStatus::Unavailable {
        if let Some(line) = describe_transition(&StreamSnapshot::default(), &current) {
            report(line);
        }
    }

    let mut retry_at: Option<Instant> = None;
    loop {
        if current.status != StreamStatus::Checking && once {
            return Some(current.status);
        }
        match current.status {
            StreamStatus::Unavailable => {
                retry_at.get_or_insert_with(|| Instant::now() + retry_after);
            }
            _ => retry_at = None,
        }

        tokio::select! {
            _ = sleep_until_opt(retry_at) => {
                retry_at = None;
                player.retry();
                // The retry may fail before a Checking snapshot is ever observed.
                current.status = StreamStatus::Checking;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    return None;
                }
                let next = rx.borrow_and_update().clone();
                if let Some(line) = describe_transition(&current, &next) {
                    report(line);
                }
                current = next;
            }
        }
    }
}
