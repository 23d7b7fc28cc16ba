use serde::{Deserialize, Serialize};

use crate::types::UploadSession;

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Reply to `POST /init_upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitUploadResponse {
    pub message: String,
    pub file_id: String,
    /// Suggested chunk size for the client.
    pub chunk_size: u64,
    pub metadata: UploadSession,
}

/// Progress numbers returned after every chunk upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkReceipt {
    pub next_expected_byte: u64,
    pub received_bytes: u64,
    pub total_bytes: u64,
}

impl From<&UploadSession> for ChunkReceipt {
    fn from(s: &UploadSession) -> Self {
        Self {
            next_expected_byte: s.next_expected_byte,
            received_bytes: s.received_bytes,
            total_bytes: s.total_bytes,
        }
    }
}

/// Reply to `POST /upload_chunk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkResponse {
    pub message: String,
    #[serde(flatten)]
    pub receipt: ChunkReceipt,
}

/// Reply to `POST /login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Structured error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<u64>,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
            expected: None,
            received: None,
        }
    }
}
