use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "partial")]
    Partial,
    #[serde(rename = "complete")]
    Complete,
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Durable progress record for one upload identifier.
///
/// This is both the on-disk metadata format and the `/status` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSession {
    #[serde(rename = "file_id")]
    pub id: String,
    pub status: UploadStatus,
    /// Highest offset confirmed written, counted from zero.
    pub received_bytes: u64,
    /// Declared final size, fixed at init.
    pub total_bytes: u64,
    /// Resume hint; always equal to `received_bytes`.
    pub next_expected_byte: u64,
    /// Reserved. Never computed.
    #[serde(default)]
    pub checksum: u64,
    pub last_updated: DateTime<Utc>,
}

impl UploadSession {
    /// Creates a fresh pending record.
    pub fn new(id: impl Into<String>, total_bytes: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status: UploadStatus::Pending,
            received_bytes: 0,
            total_bytes,
            next_expected_byte: 0,
            checksum: 0,
            last_updated: now,
        }
    }

    /// Returns `true` if the inclusive range ending at `end` is already
    /// behind the confirmed frontier.
    pub fn covers(&self, end: u64) -> bool {
        self.received_bytes > end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn upload_status_serialization() {
        assert_eq!(
            serde_json::to_string(&UploadStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&UploadStatus::Complete).unwrap(),
            "\"complete\""
        );
        assert_eq!(UploadStatus::Partial.to_string(), "partial");
    }

    #[test]
    fn new_session_is_pending() {
        let s = UploadSession::new("video.mp4", 10, at("2024-01-01T00:00:00Z"));
        assert_eq!(s.status, UploadStatus::Pending);
        assert_eq!(s.received_bytes, 0);
        assert_eq!(s.next_expected_byte, 0);
        assert_eq!(s.checksum, 0);
    }

    #[test]
    fn session_field_names() {
        let s = UploadSession::new("abc", 42, at("2024-01-01T00:00:00Z"));
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["file_id"], "abc");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["total_bytes"], 42);
        assert_eq!(json["next_expected_byte"], 0);
        assert_eq!(json["last_updated"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn session_checksum_defaults_when_absent() {
        let json = r#"{"file_id":"a","status":"partial","received_bytes":5,"total_bytes":10,"next_expected_byte":5,"last_updated":"2024-01-01T00:00:00Z"}"#;
        let s: UploadSession = serde_json::from_str(json).unwrap();
        assert_eq!(s.checksum, 0);
        assert_eq!(s.status, UploadStatus::Partial);
    }

    #[test]
    fn covers_is_exclusive_of_frontier() {
        let mut s = UploadSession::new("a", 10, at("2024-01-01T00:00:00Z"));
        s.received_bytes = 5;
        assert!(s.covers(4));
        assert!(!s.covers(5));
    }
}
