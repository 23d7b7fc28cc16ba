use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::manager::SessionManager;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Identifiers examined.
    pub scanned: usize,
    /// Sessions deleted.
    pub reclaimed: usize,
    /// Identifiers skipped because of an error.
    pub failed: usize,
}

/// Periodically reclaims uploads idle past the retention window.
pub struct Janitor {
    manager: Arc<SessionManager>,
    retention: Duration,
    interval: Duration,
}

impl Janitor {
    pub fn new(manager: Arc<SessionManager>, retention: Duration, interval: Duration) -> Self {
        Self {
            manager,
            retention,
            interval,
        }
    }

    /// Runs one sweep against the current time.
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Runs one sweep, reclaiming sessions last updated before
    /// `now - retention`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let cutoff = TimeDelta::from_std(self.retention)
            .ok()
            .and_then(|retention| now.checked_sub_signed(retention))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut report = SweepReport::default();

        let ids = match self.manager.ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "failed to list upload sessions");
                report.failed += 1;
                return report;
            }
        };

        for id in ids {
            report.scanned += 1;
            match self.manager.reclaim_if_idle(&id, cutoff).await {
                Ok(true) => report.reclaimed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(file_id = %id, error = %e, "cleanup skipped upload");
                    report.failed += 1;
                }
            }
        }

        if report.reclaimed > 0 || report.failed > 0 {
            tracing::info!(
                scanned = report.scanned,
                reclaimed = report.reclaimed,
                failed = report.failed,
                "cleanup sweep finished"
            );
        }

        report
    }

    /// Starts sweeping on a background task until `cancel` fires.
    ///
    /// The first sweep runs immediately.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sweep().await;
                    }
                    _ = cancel.cancelled() => {
                        tracing::debug!("janitor stopped");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use bytes::Bytes;
    use rangedrop_protocol::ContentRange;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn manager() -> (TempDir, Arc<SessionManager>) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join(crate::SESSIONS_DIR)));
        let manager = SessionManager::new(store, &dir.path().join(crate::FILES_DIR));
        (dir, Arc::new(manager))
    }

    async fn seed(m: &SessionManager, id: &str) {
        m.init(id, 4).await.unwrap();
        m.upload_chunk(
            id,
            ContentRange {
                start: 0,
                end: 1,
                total: 4,
            },
            Bytes::from_static(b"ab"),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn stale_session_is_reclaimed() {
        let (_dir, m) = manager();
        seed(&m, "old").await;
        let janitor = Janitor::new(Arc::clone(&m), DAY, DAY);

        let report = janitor.sweep_at(Utc::now() + TimeDelta::days(2)).await;
        assert_eq!(
            report,
            SweepReport {
                scanned: 1,
                reclaimed: 1,
                failed: 0
            }
        );
        assert!(m.status("old").await.is_err());
        assert!(!m.writer().image_path("old").exists());
    }

    #[tokio::test]
    async fn fresh_session_survives() {
        let (_dir, m) = manager();
        seed(&m, "new").await;
        let janitor = Janitor::new(Arc::clone(&m), DAY, DAY);

        let report = janitor.sweep().await;
        assert_eq!(report.reclaimed, 0);
        assert_eq!(m.status("new").await.unwrap().received_bytes, 2);
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        let (_dir, m) = manager();
        seed(&m, "old").await;
        let janitor = Janitor::new(Arc::clone(&m), DAY, DAY);
        let later = Utc::now() + TimeDelta::days(2);

        assert_eq!(janitor.sweep_at(later).await.reclaimed, 1);
        let second = janitor.sweep_at(later).await;
        assert_eq!(second, SweepReport::default());
    }

    #[tokio::test]
    async fn sweep_waits_for_in_flight_writer() {
        let (_dir, m) = manager();
        seed(&m, "old").await;
        let janitor = Arc::new(Janitor::new(Arc::clone(&m), DAY, DAY));

        let guard = m.locks().acquire("old").await;
        let task = {
            let janitor = Arc::clone(&janitor);
            tokio::spawn(async move { janitor.sweep_at(Utc::now() + TimeDelta::days(2)).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());
        assert!(m.writer().image_path("old").exists());

        drop(guard);
        assert_eq!(task.await.unwrap().reclaimed, 1);
        assert!(!m.writer().image_path("old").exists());
    }

    #[tokio::test]
    async fn spawned_task_stops_on_cancel() {
        let (_dir, m) = manager();
        let janitor = Arc::new(Janitor::new(m, DAY, Duration::from_millis(10)));
        let cancel = CancellationToken::new();

        let handle = Arc::clone(&janitor).spawn(cancel.clone());
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
