//! Periodic refresh and cleanup loops
//!
//! Both loops run until the shared cancellation token fires. Missed ticks are
//! skipped rather than bunched up after a slow refresh.

use crate::cache::AttendanceCache;
use crate::error::TrackerError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub refresh_interval: Duration,
    pub cleanup_interval: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

/// Handles for the running loops
pub struct Scheduler {
    cancel: CancellationToken,
    refresh_task: JoinHandle<()>,
    cleanup_task: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn both loops. The first refresh runs immediately; the first
    /// cleanup waits one interval.
    pub fn start(cache: Arc<AttendanceCache>, schedule: Schedule) -> Self {
        let cancel = CancellationToken::new();
        info!(
            "Starting scheduler (refresh every {}s, cleanup every {}s)",
            schedule.refresh_interval.as_secs(),
            schedule.cleanup_interval.as_secs()
        );

        let refresh_task = tokio::spawn(refresh_loop(
            Arc::clone(&cache),
            schedule.refresh_interval,
            cancel.clone(),
        ));
        let cleanup_task = tokio::spawn(cleanup_loop(cache, schedule.cleanup_interval, cancel.clone()));

        Self {
            cancel,
            refresh_task,
            cleanup_task,
        }
    }

    /// Stop both loops and wait for them to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for (name, task) in [("refresh", self.refresh_task), ("cleanup", self.cleanup_task)] {
            if let Err(e) = task.await {
                warn!("Scheduler {} loop ended abnormally: {}", name, e);
            }
        }
        info!("Scheduler stopped");
    }
}

async fn refresh_loop(cache: Arc<AttendanceCache>, period: Duration, cancel: CancellationToken) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = timer.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = cache.refresh() => result,
        };
        match result {
            Ok(outcome) => debug!(
                "Scheduled refresh loaded {} students at {}",
                outcome.student_count, outcome.last_updated
            ),
            Err(TrackerError::AlreadyLoading) => debug!("Scheduled refresh skipped: already loading"),
            // Already logged by the cache
            Err(_) => {}
        }
    }
    debug!("Refresh loop exiting");
}

async fn cleanup_loop(cache: Arc<AttendanceCache>, period: Duration, cancel: CancellationToken) {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = timer.tick() => {}
        }

        let cleaner = cache.cleaner();
        match tokio::task::spawn_blocking(move || cleaner.run()).await {
            Ok(report) => debug!(
                "Scheduled cleanup removed {} file(s), {} bytes",
                report.files_deleted, report.bytes_freed
            ),
            Err(e) => warn!("Cleanup task failed: {}", e),
        }
    }
    debug!("Cleanup loop exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheSettings;
    use crate::services::cleanup::ArtifactCleaner;
    use crate::services::fetch::UnconfiguredFetcher;

    #[tokio::test]
    async fn test_first_refresh_runs_immediately_and_shutdown_stops_loops() {
        let dir = tempfile::tempdir().unwrap();
        let cleaner = Arc::new(ArtifactCleaner::new(dir.path(), Vec::new(), Duration::from_secs(3600)));
        let cache = Arc::new(AttendanceCache::new(
            Arc::new(UnconfiguredFetcher),
            cleaner,
            CacheSettings {
                work_dir: dir.path().to_path_buf(),
                ..CacheSettings::default()
            },
        ));

        let scheduler = Scheduler::start(
            Arc::clone(&cache),
            Schedule {
                refresh_interval: Duration::from_secs(3600),
                cleanup_interval: Duration::from_secs(3600),
            },
        );

        let deadline = Instant::now() + Duration::from_secs(5);
        while cache.status().await.error.is_none() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let status = cache.status().await;
        assert!(status.is_demo_data);
        assert!(status.error.unwrap().contains("No spreadsheet source configured"));
        assert_eq!(status.cleanup.total_cleanups, 0);

        tokio::time::timeout(Duration::from_secs(5), scheduler.shutdown())
            .await
            .unwrap();
    }
}
