use crate::TransferError;

/// Longest identifier accepted.
///
/// The store derives `<id>.json` and `.<id>.<uuid>.tmp` from it, and the
/// longer of the two must still fit a 255-byte file name.
pub(crate) const MAX_ID_LEN: usize = 200;

/// Validates a client-supplied upload identifier.
///
/// Identifiers become file names inside the upload directory, so they must
/// name exactly one plain file there.
///
/// Rejects:
/// - Empty identifiers or ones longer than `MAX_ID_LEN` bytes
/// - Anything outside `[A-Za-z0-9._-]` (separators, spaces, control bytes)
/// - A leading `.` (hidden files, `.` and `..`)
pub fn validate_upload_id(id: &str) -> Result<(), TransferError> {
    if id.is_empty() {
        return Err(TransferError::InvalidArgument("file_id is required".into()));
    }

    if id.len() > MAX_ID_LEN {
        return Err(TransferError::InvalidArgument(format!(
            "file_id longer than {MAX_ID_LEN} bytes"
        )));
    }

    if id.starts_with('.') {
        return Err(TransferError::InvalidArgument(format!(
            "file_id must not start with '.': {id}"
        )));
    }

    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(TransferError::InvalidArgument(format!(
            "file_id contains invalid character {bad:?}"
        )));
    }

    Ok(())
}
