/// Multipart form field carrying the chunk payload.
pub const CHUNK_FIELD: &str = "chunk";

/// Only byte ranges are understood, in both directions.
pub const RANGE_UNIT: &str = "bytes";

/// Default advertised chunk size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Content type used for byte image downloads.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Token type reported by `/login`.
pub const BEARER: &str = "bearer";
