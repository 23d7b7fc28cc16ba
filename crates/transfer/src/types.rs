use bytes::Bytes;

use rangedrop_protocol::ChunkReceipt;

/// A byte range destined for one upload's byte image.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Upload identifier the bytes belong to.
    pub file_id: String,
    /// Absolute byte offset of the first byte.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Bytes,
}

impl Chunk {
    /// Offset one past the last byte of the chunk.
    pub fn end_offset(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

/// Result of a chunk upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkAck {
    pub receipt: ChunkReceipt,
    /// `true` when the range was already behind the confirmed frontier and
    /// nothing was written.
    pub replayed: bool,
}
