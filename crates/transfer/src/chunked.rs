use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::TransferError;
use crate::types::Chunk;

// ---------------------------------------------------------------------------
// ChunkWriter
// ---------------------------------------------------------------------------

/// Writes chunks into byte images at exact offsets.
///
/// Each upload identifier owns one file under `base_path`. Writes never
/// truncate, so ranges may arrive in any order; regions not yet written read
/// back as zeros. No file handle outlives a single call.
#[derive(Debug, Clone)]
pub struct ChunkWriter {
    base_path: PathBuf,
}

impl ChunkWriter {
    /// Creates a writer rooted at `base_path`.
    pub fn new(base_path: &Path) -> Self {
        Self {
            base_path: base_path.to_path_buf(),
        }
    }

    /// Returns the byte image path for `file_id`.
    pub fn image_path(&self, file_id: &str) -> PathBuf {
        self.base_path.join(file_id)
    }

    /// Creates the byte image directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), TransferError> {
        std::fs::create_dir_all(&self.base_path)?;
        Ok(())
    }

    /// Writes a chunk to disk.
    ///
    /// Returns the offset one past the last written byte.
    pub fn write_chunk(&self, chunk: &Chunk) -> Result<u64, TransferError> {
        crate::validate_upload_id(&chunk.file_id)?;
        self.ensure_dir()?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.image_path(&chunk.file_id))?;
        file.seek(SeekFrom::Start(chunk.offset))?;
        file.write_all(&chunk.data)?;
        file.flush()?;

        Ok(chunk.end_offset())
    }

    /// Deletes the byte image for `file_id`.
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn remove(&self, file_id: &str) -> Result<bool, TransferError> {
        crate::validate_upload_id(file_id)?;
        match std::fs::remove_file(self.image_path(file_id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the base output path.
    #[cfg(test)]
    pub(crate) fn base_path(&self) -> &Path {
        &self.base_path
    }
}
