use std::io::SeekFrom;
use std::path::Path;

use rangedrop_protocol::{ByteRangeSpec, constants::RANGE_UNIT};
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};

use crate::TransferError;

/// An open, range-limited read of a byte image.
///
/// The reader yields exactly [`content_length`](Self::content_length) bytes
/// unless the file shrinks underneath it.
#[derive(Debug)]
pub struct Download {
    /// Size of the byte image when it was opened.
    pub file_size: u64,
    /// Inclusive range being served, `None` for the whole file.
    pub range: Option<(u64, u64)>,
    reader: Take<tokio::fs::File>,
}

impl Download {
    /// Opens `path` and positions it at the requested range.
    pub async fn open(
        id: &str,
        path: &Path,
        spec: Option<ByteRangeSpec>,
    ) -> Result<Self, TransferError> {
        let mut file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransferError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let file_size = file.metadata().await?.len();

        let (range, len) = match spec {
            None => (None, file_size),
            Some(spec) => {
                let (start, end) = spec.resolve(file_size)?;
                file.seek(SeekFrom::Start(start)).await?;
                (Some((start, end)), end - start + 1)
            }
        };

        Ok(Self {
            file_size,
            range,
            reader: file.take(len),
        })
    }

    /// Number of bytes the reader will yield.
    pub fn content_length(&self) -> u64 {
        match self.range {
            Some((start, end)) => end - start + 1,
            None => self.file_size,
        }
    }

    /// `Content-Range` header value for a partial response.
    pub fn content_range(&self) -> Option<String> {
        self.range
            .map(|(start, end)| format!("{RANGE_UNIT} {start}-{end}/{}", self.file_size))
    }

    pub fn into_reader(self) -> Take<tokio::fs::File> {
        self.reader
    }
}
