use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-identifier mutual exclusion.
///
/// Locks are created on first use and kept for the life of the registry, so
/// the map grows with the number of distinct identifiers seen.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `id`, inserting it if absent.
    fn handle(&self, id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id.to_string()).or_default())
    }

    /// Waits for exclusive access to `id`.
    ///
    /// The guard is owned so it can travel into blocking tasks.
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        self.handle(id).lock_owned().await
    }

    /// Number of identifiers that have a lock.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
