use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rangedrop_protocol::{ByteRangeSpec, ChunkReceipt, ContentRange, UploadSession, UploadStatus};

use crate::chunked::ChunkWriter;
use crate::download::Download;
use crate::locks::LockRegistry;
use crate::store::{MetadataStore, StoreError};
use crate::types::{Chunk, ChunkAck};
use crate::{TransferError, validate_upload_id};

/// Orchestrates the upload lifecycle: init, chunk placement, status and
/// download.
///
/// Every mutation of a session record happens while holding that
/// identifier's lock from the [`LockRegistry`].
pub struct SessionManager {
    store: Arc<dyn MetadataStore>,
    writer: ChunkWriter,
    locks: LockRegistry,
}

impl SessionManager {
    /// Creates a manager storing byte images under `files_dir`.
    pub fn new(store: Arc<dyn MetadataStore>, files_dir: &Path) -> Self {
        Self {
            store,
            writer: ChunkWriter::new(files_dir),
            locks: LockRegistry::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn writer(&self) -> &ChunkWriter {
        &self.writer
    }

    #[cfg(test)]
    pub(crate) fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    /// Creates a pending session for `id`.
    pub async fn init(&self, id: &str, total_bytes: u64) -> Result<UploadSession, TransferError> {
        validate_upload_id(id)?;
        if total_bytes == 0 {
            return Err(TransferError::InvalidArgument(
                "total_size must be a positive integer".into(),
            ));
        }

        let guard = self.locks.acquire(id).await;
        let store = Arc::clone(&self.store);
        let writer = self.writer.clone();
        let owned_id = id.to_string();

        let session = run_blocking(move || {
            let _guard = guard;
            writer.ensure_dir()?;
            Ok(store.create(&owned_id, total_bytes)?)
        })
        .await?;

        tracing::info!(file_id = %id, total_bytes, "upload initialized");
        Ok(session)
    }

    /// Places one chunk and advances the session.
    ///
    /// A chunk that ends behind the confirmed frontier is acknowledged
    /// without touching disk.
    pub async fn upload_chunk(
        &self,
        id: &str,
        range: ContentRange,
        payload: Bytes,
    ) -> Result<ChunkAck, TransferError> {
        validate_upload_id(id)?;
        if range.end < range.start {
            return Err(TransferError::InvalidArgument(format!(
                "end byte {} before start byte {}",
                range.end, range.start
            )));
        }
        if payload.len() as u64 != range.byte_count() {
            return Err(TransferError::InvalidArgument(format!(
                "chunk holds {} bytes but range {}-{} spans {}",
                payload.len(),
                range.start,
                range.end,
                range.byte_count()
            )));
        }

        // The guard moves into the blocking task so the lock is held until
        // the write and the metadata save both finish, even if the caller
        // goes away.
        let guard = self.locks.acquire(id).await;
        let store = Arc::clone(&self.store);
        let writer = self.writer.clone();
        let owned_id = id.to_string();

        let ack = run_blocking(move || {
            let _guard = guard;
            let mut session = match store.load(&owned_id) {
                Ok(session) => session,
                Err(StoreError::NotFound(id)) => return Err(TransferError::NotInitialized(id)),
                Err(e) => return Err(e.into()),
            };

            if range.total != session.total_bytes {
                return Err(TransferError::SizeMismatch {
                    expected: session.total_bytes,
                    declared: range.total,
                });
            }
            if range.end >= session.total_bytes {
                return Err(TransferError::InvalidArgument(format!(
                    "end byte {} beyond total size {}",
                    range.end, session.total_bytes
                )));
            }

            if session.covers(range.end) {
                return Ok(ChunkAck {
                    receipt: ChunkReceipt::from(&session),
                    replayed: true,
                });
            }

            writer.write_chunk(&Chunk {
                file_id: owned_id,
                offset: range.start,
                data: payload,
            })?;

            session.received_bytes = session.received_bytes.max(range.end + 1);
            session.next_expected_byte = session.received_bytes;
            session.status = if session.received_bytes == session.total_bytes {
                UploadStatus::Complete
            } else {
                UploadStatus::Partial
            };
            session.last_updated = Utc::now();
            store.save(&session)?;

            Ok(ChunkAck {
                receipt: ChunkReceipt::from(&session),
                replayed: false,
            })
        })
        .await
        .inspect_err(|e| {
            if matches!(e, TransferError::Io(_)) {
                tracing::error!(file_id = %id, error = %e, "chunk write failed");
            }
        })?;

        if ack.replayed {
            tracing::debug!(
                file_id = %id,
                start = range.start,
                end = range.end,
                "chunk already processed"
            );
        } else {
            tracing::debug!(
                file_id = %id,
                start = range.start,
                end = range.end,
                received = ack.receipt.received_bytes,
                "chunk accepted"
            );
        }

        Ok(ack)
    }

    /// Returns the current session record. Does not take the lock.
    pub async fn status(&self, id: &str) -> Result<UploadSession, TransferError> {
        validate_upload_id(id)?;
        let store = Arc::clone(&self.store);
        let owned_id = id.to_string();
        run_blocking(move || Ok(store.load(&owned_id)?)).await
    }

    /// Opens the byte image for reading. Does not take the lock.
    pub async fn download(
        &self,
        id: &str,
        range: Option<ByteRangeSpec>,
    ) -> Result<Download, TransferError> {
        validate_upload_id(id)?;
        Download::open(id, &self.writer.image_path(id), range).await
    }

    /// Lists every identifier with a session record.
    pub async fn ids(&self) -> Result<Vec<String>, TransferError> {
        let store = Arc::clone(&self.store);
        run_blocking(move || Ok(store.list()?)).await
    }

    /// Deletes the session for `id` if it was last touched before `cutoff`.
    ///
    /// Returns `true` if the session was reclaimed. The byte image goes
    /// first so a record never outlives its bytes' removal attempt.
    pub async fn reclaim_if_idle(
        &self,
        id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, TransferError> {
        validate_upload_id(id)?;

        let guard = self.locks.acquire(id).await;
        let store = Arc::clone(&self.store);
        let writer = self.writer.clone();
        let owned_id = id.to_string();

        let reclaimed = run_blocking(move || {
            let _guard = guard;
            let session = match store.load(&owned_id) {
                Ok(session) => session,
                Err(StoreError::NotFound(_)) => return Ok(false),
                Err(e) => return Err(e.into()),
            };
            if session.last_updated >= cutoff {
                return Ok(false);
            }
            writer.remove(&owned_id)?;
            store.delete(&owned_id)?;
            Ok(true)
        })
        .await?;

        if reclaimed {
            tracing::info!(file_id = %id, "reclaimed idle upload");
        }
        Ok(reclaimed)
    }
}

/// Runs filesystem work on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, TransferError>
where
    F: FnOnce() -> Result<T, TransferError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TransferError::Io(std::io::Error::other(e)))?
}
