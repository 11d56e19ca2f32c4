//! Scheduled removal of stale download artifacts
//!
//! Sweeps the download directory for files and per-attempt working
//! directories older than the configured age, plus leftover directories
//! matching configured name prefixes (e.g. browser profiles in `/tmp`).
//! Failures on individual entries are logged and skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Prefix of the per-attempt working directories the cache creates
pub const ARTIFACT_DIR_PREFIX: &str = "fetch-";

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Cannot inspect {}: {}", .0.display(), .1)]
    Inspect(PathBuf, String),

    #[error("Cannot remove {}: {}", .0.display(), .1)]
    Remove(PathBuf, io::Error),
}

/// Result of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub files_deleted: u64,
    pub bytes_freed: u64,
}

/// Totals since startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStats {
    pub files_deleted: u64,
    pub bytes_freed: u64,
    pub total_cleanups: u64,
    pub last_cleanup: Option<DateTime<Utc>>,
}

/// Directories under `root` whose name starts with `prefix` are leftovers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleDirRule {
    pub root: PathBuf,
    pub prefix: String,
}

pub struct ArtifactCleaner {
    download_dir: PathBuf,
    stale_dirs: Vec<StaleDirRule>,
    max_age: Duration,
    stats: Mutex<CleanupStats>,
}

impl ArtifactCleaner {
    pub fn new(download_dir: impl Into<PathBuf>, stale_dirs: Vec<StaleDirRule>, max_age: Duration) -> Self {
        Self {
            download_dir: download_dir.into(),
            stale_dirs,
            max_age,
            stats: Mutex::new(CleanupStats::default()),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn stats(&self) -> CleanupStats {
        self.stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Sweep now
    pub fn run(&self) -> CleanupReport {
        self.run_at(SystemTime::now())
    }

    /// Sweep treating `now` as the current time
    pub fn run_at(&self, now: SystemTime) -> CleanupReport {
        let mut report = CleanupReport::default();

        self.sweep(&self.download_dir, now, &mut report, |entry| {
            entry.file_type().is_file() || has_prefix(entry, ARTIFACT_DIR_PREFIX)
        });
        for rule in &self.stale_dirs {
            self.sweep(&rule.root, now, &mut report, |entry| {
                entry.file_type().is_dir() && has_prefix(entry, &rule.prefix)
            });
        }

        self.record(&report, now);
        report
    }

    fn record(&self, report: &CleanupReport, now: SystemTime) {
        {
            let mut stats = self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            stats.files_deleted += report.files_deleted;
            stats.bytes_freed += report.bytes_freed;
            stats.total_cleanups += 1;
            stats.last_cleanup = Some(DateTime::<Utc>::from(now));
        }

        if report.files_deleted > 0 {
            info!(
                "Cleanup removed {} file(s), freed {} bytes",
                report.files_deleted, report.bytes_freed
            );
        } else {
            debug!("Cleanup found nothing to remove");
        }
    }

    /// Remove direct children of `root` that pass `select` and are too old
    fn sweep<F>(&self, root: &Path, now: SystemTime, report: &mut CleanupReport, select: F)
    where
        F: Fn(&walkdir::DirEntry) -> bool,
    {
        if !root.is_dir() {
            debug!("Cleanup skipping missing directory {}", root.display());
            return;
        }

        let walker = WalkDir::new(root).min_depth(1).max_depth(1).follow_links(false);
        let candidates: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Cleanup: error accessing entry: {}", e);
                    None
                }
            })
            .filter(|entry| select(entry))
            .map(|entry| entry.into_path())
            .collect();

        self.remove_stale(&candidates, now, report);
    }

    /// Remove each listed path that is too old; a failing path is logged and skipped
    fn remove_stale(&self, paths: &[PathBuf], now: SystemTime, report: &mut CleanupReport) {
        for path in paths {
            match self.remove_if_stale(path, now) {
                Ok(Some(freed)) => {
                    report.files_deleted += freed.files_deleted;
                    report.bytes_freed += freed.bytes_freed;
                }
                Ok(None) => {}
                Err(e) => warn!("Cleanup: {}", e),
            }
        }
    }

    fn remove_if_stale(&self, path: &Path, now: SystemTime) -> Result<Option<CleanupReport>, CleanupError> {
        // Entries can disappear between listing and removal
        let metadata =
            fs::symlink_metadata(path).map_err(|e| CleanupError::Inspect(path.to_path_buf(), e.to_string()))?;
        let modified = metadata
            .modified()
            .map_err(|e| CleanupError::Inspect(path.to_path_buf(), e.to_string()))?;

        // Clock skew (modified in the future) counts as fresh
        let age = now.duration_since(modified).unwrap_or_default();
        if age <= self.max_age {
            return Ok(None);
        }

        if metadata.is_dir() {
            let freed = dir_usage(path);
            fs::remove_dir_all(path).map_err(|e| CleanupError::Remove(path.to_path_buf(), e))?;
            debug!("Removed stale directory {}", path.display());
            Ok(Some(freed))
        } else {
            fs::remove_file(path).map_err(|e| CleanupError::Remove(path.to_path_buf(), e))?;
            debug!("Removed stale file {}", path.display());
            Ok(Some(CleanupReport {
                files_deleted: 1,
                bytes_freed: metadata.len(),
            }))
        }
    }
}

fn has_prefix(entry: &walkdir::DirEntry, prefix: &str) -> bool {
    entry.file_name().to_string_lossy().starts_with(prefix)
}

/// Files and bytes beneath a directory, skipping unreadable entries
fn dir_usage(dir: &Path) -> CleanupReport {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .fold(CleanupReport::default(), |mut usage, entry| {
            usage.files_deleted += 1;
            usage.bytes_freed += entry.metadata().map(|m| m.len()).unwrap_or(0);
            usage
        })
}
