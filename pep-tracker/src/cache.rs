//! Attendance cache: the single owner of the current snapshot
//!
//! One instance is built at startup and shared (`Arc`) with the scheduler and
//! any front end. Refreshes swap the whole snapshot at once; a failed refresh
//! keeps serving the previous one.

use crate::error::{Result, TrackerError};
use crate::ingest::{ingest_workbook, IngestOptions};
use crate::models::{CacheSnapshot, StatusCode, Student};
use crate::rules::AttendanceRules;
use crate::services::cleanup::{ArtifactCleaner, CleanupReport, CleanupStats, ARTIFACT_DIR_PREFIX};
use crate::services::fetch::SpreadsheetFetcher;
use crate::services::history::{attendance_history, AttendanceHistory};
use crate::services::report::{self, PendingStudent, StudentReport};
use crate::services::search::StudentQuery;
use crate::services::weekly::{self, WeeklyWindow};
use chrono::{DateTime, Utc};
use pep_common::time::{self, ReferenceClock};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(120);

/// Name of the workbook written inside each attempt directory
pub const ARTIFACT_FILE_NAME: &str = "attendance.xlsx";

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Watchdog for one fetch+ingest attempt
    pub refresh_timeout: Duration,
    /// Parent of the per-attempt working directories
    pub work_dir: PathBuf,
    pub rules: AttendanceRules,
    pub clock: ReferenceClock,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            work_dir: std::env::temp_dir().join("attendance"),
            rules: AttendanceRules::default(),
            clock: ReferenceClock::default(),
        }
    }
}

/// Returned by a successful refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub student_count: usize,
    pub last_updated: DateTime<Utc>,
}

/// Point-in-time view of the cache for status displays
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub last_updated: Option<DateTime<Utc>>,
    pub student_count: usize,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Set after a failed refresh; cleared by the next success
    pub is_demo_data: bool,
    pub cleanup: CleanupStats,
}

impl CacheStatus {
    /// False until the first successful refresh
    pub fn has_data(&self) -> bool {
        self.last_updated.is_some()
    }
}

#[derive(Debug, Default)]
struct CacheState {
    error: Option<String>,
    is_demo_data: bool,
}

/// Clears the busy flag however the refresh ends
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct AttendanceCache {
    snapshot: RwLock<Option<Arc<CacheSnapshot>>>,
    state: RwLock<CacheState>,
    loading: AtomicBool,
    fetcher: Arc<dyn SpreadsheetFetcher>,
    cleaner: Arc<ArtifactCleaner>,
    settings: CacheSettings,
}

impl AttendanceCache {
    pub fn new(fetcher: Arc<dyn SpreadsheetFetcher>, cleaner: Arc<ArtifactCleaner>, settings: CacheSettings) -> Self {
        Self {
            snapshot: RwLock::new(None),
            state: RwLock::new(CacheState::default()),
            loading: AtomicBool::new(false),
            fetcher,
            cleaner,
            settings,
        }
    }

    pub fn rules(&self) -> &AttendanceRules {
        &self.settings.rules
    }

    pub fn clock(&self) -> &ReferenceClock {
        &self.settings.clock
    }

    pub fn cleaner(&self) -> Arc<ArtifactCleaner> {
        Arc::clone(&self.cleaner)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Fetch, ingest and swap in a new snapshot.
    ///
    /// Rejected with [`TrackerError::AlreadyLoading`] while another refresh is
    /// in flight. The attempt runs as its own task under the refresh timeout;
    /// when the timeout fires the task is abandoned and its result discarded.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Refresh rejected: already loading");
            return Err(TrackerError::AlreadyLoading);
        }
        let _guard = LoadingGuard(&self.loading);

        self.state.write().await.error = None;
        info!("Refreshing attendance from {}", self.fetcher.describe());

        let attempt = tokio::spawn(fetch_and_ingest(
            Arc::clone(&self.fetcher),
            self.settings.work_dir.clone(),
            self.settings.clock,
            self.settings.rules.clone(),
        ));

        let result = match tokio::time::timeout(self.settings.refresh_timeout, attempt).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(TrackerError::Internal(format!("Refresh task failed: {}", join_error))),
            Err(_) => {
                warn!("Refresh timed out; abandoning the attempt");
                Err(TrackerError::Timeout(self.settings.refresh_timeout))
            }
        };

        match result {
            Ok(snapshot) => {
                let outcome = RefreshOutcome {
                    student_count: snapshot.student_count(),
                    last_updated: snapshot.last_updated,
                };
                *self.snapshot.write().await = Some(Arc::new(snapshot));
                {
                    let mut state = self.state.write().await;
                    state.error = None;
                    state.is_demo_data = false;
                }
                info!("Cache updated with {} students", outcome.student_count);
                Ok(outcome)
            }
            Err(e) => {
                error!("Refresh failed: {}", e);
                let mut state = self.state.write().await;
                state.error = Some(e.to_string());
                state.is_demo_data = true;
                Err(e)
            }
        }
    }

    pub async fn status(&self) -> CacheStatus {
        let snapshot = self.snapshot().await;
        let state = self.state.read().await;
        CacheStatus {
            last_updated: snapshot.as_ref().map(|s| s.last_updated),
            student_count: snapshot.as_ref().map_or(0, |s| s.student_count()),
            is_loading: self.is_loading(),
            error: state.error.clone(),
            is_demo_data: state.is_demo_data,
            cleanup: self.cleaner.stats(),
        }
    }

    /// Current snapshot; readers keep it alive across a swap
    pub async fn snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        self.snapshot.read().await.clone()
    }

    pub async fn find_by_roll(&self, partial: &str) -> Option<Student> {
        self.snapshot().await?.find_by_roll(partial).cloned()
    }

    pub async fn search_by_name(&self, query: &str) -> Vec<Student> {
        match self.snapshot().await {
            Some(snapshot) => snapshot.search_by_name(query).into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub async fn student(&self, query: &StudentQuery) -> Option<Student> {
        self.snapshot().await?.student(query).cloned()
    }

    pub async fn search(&self, query: &StudentQuery) -> Vec<Student> {
        match self.snapshot().await {
            Some(snapshot) => snapshot.search(query).into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Students short of the weekly minimum in the week containing `now`
    pub async fn pending_students(&self, now: DateTime<Utc>) -> Vec<Student> {
        let today = self.settings.clock.day_of(now);
        match self.snapshot().await {
            Some(snapshot) => snapshot
                .pending_students(today, &self.settings.rules)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    pub async fn pending_summaries(&self, now: DateTime<Utc>) -> Vec<PendingStudent> {
        let today = self.settings.clock.day_of(now);
        match self.snapshot().await {
            Some(snapshot) => report::pending_summaries(&snapshot.students, today, &self.settings.rules),
            None => Vec::new(),
        }
    }

    pub async fn student_report(&self, query: &StudentQuery, now: DateTime<Utc>) -> Option<StudentReport> {
        let today = self.settings.clock.day_of(now);
        let snapshot = self.snapshot().await?;
        let student = snapshot.student(query)?;
        Some(report::student_report(student, today, &self.settings.rules))
    }

    pub fn weekly_window(&self, student: &Student, now: DateTime<Utc>) -> WeeklyWindow {
        weekly::weekly_window(
            &student.attendance,
            self.settings.clock.day_of(now),
            self.settings.rules.weekly_required_days,
        )
    }

    pub fn today_status(&self, student: &Student, now: DateTime<Utc>) -> StatusCode {
        report::today_status(student, self.settings.clock.day_of(now))
    }

    pub fn history(&self, student: &Student) -> AttendanceHistory {
        attendance_history(&student.attendance)
    }

    /// One cleanup sweep; blocking filesystem work
    pub fn run_cleanup(&self) -> CleanupReport {
        self.cleaner.run()
    }
}

/// One refresh attempt, detached from the caller
async fn fetch_and_ingest(
    fetcher: Arc<dyn SpreadsheetFetcher>,
    work_dir: PathBuf,
    clock: ReferenceClock,
    rules: AttendanceRules,
) -> Result<CacheSnapshot> {
    let bytes = fetcher.fetch().await?;
    debug!("Fetched {} bytes", bytes.len());

    let attempt_dir = work_dir.join(format!("{}{}", ARTIFACT_DIR_PREFIX, Uuid::new_v4()));
    tokio::fs::create_dir_all(&attempt_dir).await?;

    let options = IngestOptions::new(&clock, time::now(), rules);
    let result = parse_artifact(&attempt_dir, bytes, options).await;

    if let Err(e) = tokio::fs::remove_dir_all(&attempt_dir).await {
        warn!("Failed to remove {}: {}", attempt_dir.display(), e);
    }
    result
}

async fn parse_artifact(attempt_dir: &Path, bytes: Vec<u8>, options: IngestOptions) -> Result<CacheSnapshot> {
    let artifact = attempt_dir.join(ARTIFACT_FILE_NAME);
    tokio::fs::write(&artifact, &bytes).await?;
    drop(bytes);

    tokio::task::spawn_blocking(move || -> Result<CacheSnapshot> {
        let bytes = std::fs::read(&artifact)?;
        Ok(ingest_workbook(&bytes, &options)?)
    })
    .await
    .map_err(|e| TrackerError::Internal(format!("Ingest task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;

    struct Failing;

    #[async_trait]
    impl SpreadsheetFetcher for Failing {
        async fn fetch(&self) -> std::result::Result<Vec<u8>, FetchError> {
            Err(FetchError::HttpStatus(503))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    fn cache(work_dir: &Path) -> AttendanceCache {
        let settings = CacheSettings {
            work_dir: work_dir.to_path_buf(),
            ..CacheSettings::default()
        };
        let cleaner = Arc::new(ArtifactCleaner::new(work_dir, Vec::new(), Duration::from_secs(3600)));
        AttendanceCache::new(Arc::new(Failing), cleaner, settings)
    }

    #[tokio::test]
    async fn test_initial_status_has_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let status = cache(dir.path()).status().await;
        assert!(!status.has_data());
        assert_eq!(status.student_count, 0);
        assert!(!status.is_demo_data);
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_records_error_and_unlocks() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());

        let err = cache.refresh().await.unwrap_err();
        assert!(matches!(err, TrackerError::Fetch(FetchError::HttpStatus(503))));

        let status = cache.status().await;
        assert!(!status.is_loading);
        assert!(status.is_demo_data);
        assert_eq!(status.error.as_deref(), Some("Download failed with HTTP status 503"));
        assert!(cache.student(&StudentQuery::Roll("R001".into())).await.is_none());
    }
}
