//! Durable upload session records.

use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use rangedrop_protocol::UploadSession;

/// Record file extension.
const RECORD_EXT: &str = "json";

/// Errors from metadata store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no session record for {0}")]
    NotFound(String),

    #[error("session record already exists for {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed session record for {id}: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Storage for one [`UploadSession`] per identifier.
///
/// Implementations do no locking of their own: read-modify-write sequences
/// are serialized by the caller.
pub trait MetadataStore: Send + Sync + 'static {
    /// Creates a pending record. Fails with [`StoreError::AlreadyExists`] if
    /// one is present.
    fn create(&self, id: &str, total_bytes: u64) -> Result<UploadSession, StoreError>;

    /// Loads the record for `id`.
    fn load(&self, id: &str) -> Result<UploadSession, StoreError>;

    /// Replaces the record for `session.id`. Readers never observe a
    /// partially written record.
    fn save(&self, session: &UploadSession) -> Result<(), StoreError>;

    /// Removes the record for `id`. Returns `false` if there was none.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Lists every identifier that has a record.
    fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// [`MetadataStore`] keeping one JSON file per identifier.
///
/// Saves go through a dot-prefixed temporary file in the same directory
/// followed by a rename, so a record is always either the old or the new
/// version.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{RECORD_EXT}"))
    }

    fn write_atomic(&self, session: &UploadSession) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_vec_pretty(session).map_err(|source| StoreError::Malformed {
            id: session.id.clone(),
            source,
        })?;

        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", session.id, uuid::Uuid::new_v4().simple()));
        let result = (|| -> std::io::Result<()> {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
            std::fs::rename(&tmp, self.record_path(&session.id))
        })();

        if let Err(e) = result {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl MetadataStore for JsonFileStore {
    fn create(&self, id: &str, total_bytes: u64) -> Result<UploadSession, StoreError> {
        if self.record_path(id).exists() {
            return Err(StoreError::AlreadyExists(id.to_string()));
        }
        let session = UploadSession::new(id, total_bytes, Utc::now());
        self.write_atomic(&session)?;
        Ok(session)
    }

    fn load(&self, id: &str) -> Result<UploadSession, StoreError> {
        let raw = match std::fs::read(self.record_path(id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw).map_err(|source| StoreError::Malformed {
            id: id.to_string(),
            source,
        })
    }

    fn save(&self, session: &UploadSession) -> Result<(), StoreError> {
        self.write_atomic(session)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        match std::fs::remove_file(self.record_path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids: Vec<String> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                if name.starts_with('.') {
                    return None;
                }
                name.strip_suffix(&format!(".{RECORD_EXT}"))
                    .map(str::to_string)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}
