use crate::records::Collection;
use crate::store::{RecordResult, RecordStore};
use alhadi_core::{MediaKind, Program};
use serde_json::json;

/// Uploaded media to be written into a program record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLink {
    pub kind: MediaKind,
    pub public_url: String,
    /// Display duration (`m:ss`), only meaningful for videos.
    pub duration: Option<String>,
}

/// Write an upload's public URL into the program with `program_id`.
///
/// Videos set `video_url` and `duration`; images set `thumbnail_url`.
pub async fn attach_upload(
    store: &dyn RecordStore,
    program_id: &str,
    link: &MediaLink,
) -> RecordResult<Program> {
    let patch = match link.kind {
        MediaKind::Video => json!({
            "video_url": link.public_url,
            "duration": link.duration,
        }),
        MediaKind::Image => json!({
            "thumbnail_url": link.public_url,
        }),
    };

    let row = store.update(Collection::Programs, program_id, patch).await?;
    let program: Program = serde_json::from_value(row)?;

    tracing::info!(
        program_id = %program_id,
        kind = %link.kind,
        url = %link.public_url,
        "Linked uploaded media to program"
    );

    Ok(program)
}
