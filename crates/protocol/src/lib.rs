//! Wire protocol for the Rangedrop upload service.
//!
//! Shared by the server and by clients: the persisted [`UploadSession`]
//! record, HTTP response bodies, and the `Content-Range` / `Range` header
//! grammar used by chunk uploads and downloads.

pub mod constants;
pub mod messages;
pub mod range;
pub mod types;

pub use messages::{ChunkReceipt, ChunkResponse, ErrorBody, InitUploadResponse, TokenResponse};
pub use range::{ByteRangeSpec, ContentRange, RangeError};
pub use types::{UploadSession, UploadStatus};
