//! Resumable upload engine.
//!
//! Tracks one [`UploadSession`] per client-chosen identifier, places
//! byte-range chunks into an on-disk byte image, serves range reads of that
//! image and reclaims sessions that went idle.
//!
//! [`UploadSession`]: rangedrop_protocol::UploadSession

mod chunked;
mod download;
mod janitor;
mod locks;
mod manager;
mod store;
mod types;
mod validation;

pub use chunked::ChunkWriter;
pub use download::Download;
pub use janitor::{Janitor, SweepReport};
pub use locks::LockRegistry;
pub use manager::SessionManager;
pub use store::{JsonFileStore, MetadataStore, StoreError};
pub use types::{Chunk, ChunkAck};
pub use validation::validate_upload_id;

use rangedrop_protocol::RangeError;

/// Subdirectory of the upload directory holding session records.
pub const SESSIONS_DIR: &str = "sessions";

/// Subdirectory of the upload directory holding byte images.
pub const FILES_DIR: &str = "files";

/// Errors produced by the upload engine.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("upload not found: {0}")]
    NotFound(String),

    #[error("upload already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("total size mismatch: expected {expected}, received {declared}")]
    SizeMismatch { expected: u64, declared: u64 },

    #[error("upload not initialized: {0}")]
    NotInitialized(String),

    #[error("range not satisfiable for {size} bytes")]
    RangeNotSatisfiable { size: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for TransferError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::AlreadyExists(id) => Self::AlreadyInitialized(id),
            StoreError::Io(e) => Self::Io(e),
            malformed @ StoreError::Malformed { .. } => Self::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                malformed.to_string(),
            )),
        }
    }
}

impl From<RangeError> for TransferError {
    fn from(err: RangeError) -> Self {
        match err {
            RangeError::Malformed(msg) => Self::InvalidArgument(msg),
            RangeError::Unsatisfiable { size } => Self::RangeNotSatisfiable { size },
        }
    }
}
