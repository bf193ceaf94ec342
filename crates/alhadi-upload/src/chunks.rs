//! Server-side buffer for chunked uploads.
//!
//! Chunks are keyed by the client's upload id and reassembled in index order
//! once every index has arrived. A session is removed from the store when it
//! completes, when one of its chunks is rejected, or when it goes stale.

use crate::error::ChunkError;
use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// One piece of a chunked upload as received from the client.
#[derive(Debug, Clone)]
pub struct ChunkPart {
    pub upload_id: String,
    pub index: usize,
    pub total: usize,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A fully reassembled file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkProgress {
    Pending { received: usize, total: usize },
    Complete(AssembledFile),
}

struct ChunkSession {
    file_name: String,
    content_type: Option<String>,
    chunks: Vec<Option<Bytes>>,
    received: usize,
    bytes: u64,
    last_touched: Instant,
}

impl ChunkSession {
    fn new(part: &ChunkPart) -> Self {
        Self {
            file_name: part.file_name.clone(),
            content_type: part.content_type.clone(),
            chunks: vec![None; part.total],
            received: 0,
            bytes: 0,
            last_touched: Instant::now(),
        }
    }

    fn assemble(self) -> AssembledFile {
        let mut data = BytesMut::with_capacity(self.bytes as usize);
        for chunk in self.chunks.into_iter().flatten() {
            data.extend_from_slice(&chunk);
        }
        AssembledFile {
            file_name: self.file_name,
            content_type: self.content_type,
            data: data.freeze(),
        }
    }
}

pub struct ChunkStore {
    sessions: Mutex<HashMap<String, ChunkSession>>,
    max_total_bytes: u64,
}

impl ChunkStore {
    pub fn new(max_total_bytes: u64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_total_bytes,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ChunkSession>> {
        // A poisoned map only holds buffers; keep serving.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Buffer one chunk. Returns the assembled file once every index is present.
    pub fn accept(&self, part: ChunkPart) -> Result<ChunkProgress, ChunkError> {
        if part.upload_id.trim().is_empty() {
            return Err(ChunkError::MissingUploadId);
        }

        let mut sessions = self.lock();

        if part.total == 0 {
            sessions.remove(&part.upload_id);
            return Err(ChunkError::InvalidTotal(part.total));
        }

        let session = sessions
            .entry(part.upload_id.clone())
            .or_insert_with(|| ChunkSession::new(&part));

        let rejection = if session.chunks.len() != part.total {
            Some(ChunkError::TotalMismatch {
                expected: session.chunks.len(),
                got: part.total,
            })
        } else if part.index >= part.total {
            Some(ChunkError::IndexOutOfRange {
                index: part.index,
                total: part.total,
            })
        } else {
            let replaced = session.chunks[part.index]
                .as_ref()
                .map(|c| c.len() as u64)
                .unwrap_or(0);
            let new_total = session.bytes - replaced + part.data.len() as u64;
            if new_total > self.max_total_bytes {
                Some(ChunkError::TooLarge {
                    max: self.max_total_bytes,
                })
            } else {
                None
            }
        };

        if let Some(err) = rejection {
            sessions.remove(&part.upload_id);
            tracing::warn!(
                upload_id = %part.upload_id,
                error = %err,
                "Chunked upload aborted"
            );
            return Err(err);
        }

        let slot = &mut session.chunks[part.index];
        if let Some(previous) = slot.take() {
            session.bytes -= previous.len() as u64;
        } else {
            session.received += 1;
        }
        session.bytes += part.data.len() as u64;
        *slot = Some(part.data);
        session.last_touched = Instant::now();

        if session.received < part.total {
            tracing::debug!(
                upload_id = %part.upload_id,
                received = session.received,
                total = part.total,
                "Chunk buffered"
            );
            return Ok(ChunkProgress::Pending {
                received: session.received,
                total: part.total,
            });
        }

        let complete = sessions
            .remove(&part.upload_id)
            .map(ChunkSession::assemble);

        match complete {
            Some(file) => {
                tracing::info!(
                    upload_id = %part.upload_id,
                    size_bytes = file.data.len(),
                    chunks = part.total,
                    "Chunked upload reassembled"
                );
                Ok(ChunkProgress::Complete(file))
            }
            None => Ok(ChunkProgress::Pending {
                received: 0,
                total: part.total,
            }),
        }
    }

    /// Drop the buffers of one upload, e.g. when storing the assembled file failed upstream.
    pub fn discard(&self, upload_id: &str) -> bool {
        self.lock().remove(upload_id).is_some()
    }

    /// Remove sessions untouched for longer than `ttl`. Returns how many were evicted.
    pub fn evict_stale(&self, ttl: Duration) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.last_touched.elapsed() <= ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::warn!(evicted, "Evicted stale chunked uploads");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
