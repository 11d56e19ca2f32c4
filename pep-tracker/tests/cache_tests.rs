//! Refresh lifecycle and queries of the attendance cache

mod helpers;

use helpers::workbook::attendance_rows;
use helpers::{attendance_workbook, friday_now, workbook_bytes, GatedFetcher, NeverFetcher, ScriptedFetcher, StaticFetcher};
use pep_tracker::models::StatusCode;
use pep_tracker::services::cleanup::ArtifactCleaner;
use pep_tracker::services::fetch::SpreadsheetFetcher;
use pep_tracker::services::weekly::WeeklyStatus;
use pep_tracker::{AttendanceCache, CacheSettings, FetchError, StudentQuery, TrackerError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn build_cache(fetcher: Arc<dyn SpreadsheetFetcher>, work_dir: &Path, timeout: Duration) -> Arc<AttendanceCache> {
    let cleaner = Arc::new(ArtifactCleaner::new(work_dir, Vec::new(), Duration::from_secs(3600)));
    let settings = CacheSettings {
        refresh_timeout: timeout,
        work_dir: work_dir.to_path_buf(),
        ..CacheSettings::default()
    };
    Arc::new(AttendanceCache::new(fetcher, cleaner, settings))
}

fn leftover_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_successful_refresh_serves_queries() {
    let temp_dir = TempDir::new().unwrap();
    let cache = build_cache(
        Arc::new(StaticFetcher(attendance_workbook())),
        temp_dir.path(),
        Duration::from_secs(30),
    );

    let outcome = cache.refresh().await.unwrap();
    assert_eq!(outcome.student_count, 3);

    let status = cache.status().await;
    assert!(status.has_data());
    assert_eq!(status.student_count, 3);
    assert_eq!(status.last_updated, Some(outcome.last_updated));
    assert!(!status.is_loading);
    assert!(!status.is_demo_data);
    assert!(status.error.is_none());

    // Per-attempt directory removed after parsing
    assert_eq!(leftover_entries(temp_dir.path()), 0);

    let ravi = cache.student(&StudentQuery::Roll("bba002".into())).await.unwrap();
    assert_eq!(ravi.student_name, "Ravi Shah");
    assert_eq!(cache.find_by_roll("24BBA003").await.unwrap().student_name, "Anand Kumar");

    let found = cache.search(&StudentQuery::Name("a".into())).await;
    assert_eq!(found.len(), 3);
    assert_eq!(cache.search_by_name("rao asha").await.len(), 1);
    assert!(cache.search_by_name("zz").await.is_empty());

    let now = friday_now();
    let pending: Vec<String> = cache.pending_students(now).await.into_iter().map(|s| s.roll_no).collect();
    assert_eq!(pending, vec!["24BBA002", "24BBA003"]);

    let summaries = cache.pending_summaries(now).await;
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].days_present, 1);
    assert_eq!(summaries[0].days_remaining, 2);

    let asha = cache.student(&StudentQuery::Name("asha".into())).await.unwrap();
    assert_eq!(cache.weekly_window(&asha, now).status, WeeklyStatus::Completed);
    assert_eq!(cache.today_status(&asha, now), StatusCode::Unmarked);

    let anand = cache.find_by_roll("BBA003").await.unwrap();
    let thursday = now - chrono::Duration::days(1);
    assert_eq!(cache.today_status(&anand, thursday), StatusCode::Warning);

    let report = cache
        .student_report(&StudentQuery::Roll("BBA001".into()), now)
        .await
        .unwrap();
    assert_eq!(report.today_status, "Not marked");
    assert_eq!(report.weekly.days_present, 3);

    let history = cache.history(&asha);
    assert_eq!(history.months[0].month, "January 2026");
    assert_eq!(history.stats.total_present, 5);
    assert_eq!(history.stats.attendance_rate, 83);
}

#[tokio::test]
async fn test_second_refresh_rejected_while_loading() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(GatedFetcher::new(attendance_workbook()));
    let cache = build_cache(fetcher.clone(), temp_dir.path(), Duration::from_secs(30));

    let first = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.refresh().await }
    });
    while !cache.is_loading() {
        tokio::task::yield_now().await;
    }

    let second = cache.refresh().await;
    assert!(matches!(second, Err(TrackerError::AlreadyLoading)));
    assert_eq!(second.unwrap_err().to_string(), "Already loading");
    assert!(cache.snapshot().await.is_none());
    assert!(cache.status().await.error.is_none());

    fetcher.release();
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome.student_count, 3);
    assert!(!cache.is_loading());
}

#[tokio::test]
async fn test_queries_serve_previous_snapshot_during_refresh() {
    let temp_dir = TempDir::new().unwrap();
    // Second sheet drops Ravi Shah
    let mut rows = attendance_rows();
    rows.remove(4);
    let fetcher = Arc::new(GatedFetcher::sequence(vec![
        attendance_workbook(),
        workbook_bytes(&[("PEP Attendance", rows)]),
    ]));
    let cache = build_cache(fetcher.clone(), temp_dir.path(), Duration::from_secs(30));

    fetcher.release();
    let first = cache.refresh().await.unwrap();
    let before = cache.snapshot().await.unwrap();

    let pending = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.refresh().await }
    });
    while !cache.is_loading() {
        tokio::task::yield_now().await;
    }

    let during = cache.snapshot().await.unwrap();
    assert!(Arc::ptr_eq(&before, &during));
    assert_eq!(cache.find_by_roll("BBA002").await.unwrap().student_name, "Ravi Shah");
    let status = cache.status().await;
    assert!(status.is_loading);
    assert_eq!(status.student_count, 3);
    assert_eq!(status.last_updated, Some(first.last_updated));
    assert!(status.error.is_none());

    fetcher.release();
    let second = pending.await.unwrap().unwrap();
    assert_eq!(second.student_count, 2);
    assert!(!cache.is_loading());

    let after = cache.snapshot().await.unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.students.len(), 2);
    assert_eq!(after.last_updated, second.last_updated);
    assert!(cache.find_by_roll("BBA002").await.is_none());
    assert_eq!(cache.status().await.student_count, 2);

    // Readers holding the old snapshot still see it whole
    assert_eq!(before.students.len(), 3);
    assert!(before.find_by_roll("BBA002").is_some());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        Ok(attendance_workbook()),
        Err(FetchError::HtmlPayload),
        Ok(vec![0u8; 4096]),
        Ok(attendance_workbook()),
    ]));
    let cache = build_cache(fetcher, temp_dir.path(), Duration::from_secs(30));

    let loaded = cache.refresh().await.unwrap();

    let err = cache.refresh().await.unwrap_err();
    assert!(matches!(err, TrackerError::Fetch(FetchError::HtmlPayload)));
    let status = cache.status().await;
    assert!(status.is_demo_data);
    assert_eq!(status.error.as_deref(), Some("Received HTML instead of a spreadsheet"));
    assert_eq!(status.student_count, 3);
    assert_eq!(status.last_updated, Some(loaded.last_updated));

    let err = cache.refresh().await.unwrap_err();
    assert!(matches!(err, TrackerError::Parse(_)));
    assert_eq!(cache.status().await.student_count, 3);
    assert_eq!(leftover_entries(temp_dir.path()), 0);

    cache.refresh().await.unwrap();
    let status = cache.status().await;
    assert!(!status.is_demo_data);
    assert!(status.error.is_none());
}

#[tokio::test]
async fn test_refresh_timeout_releases_loading_flag() {
    let temp_dir = TempDir::new().unwrap();
    let cache = build_cache(Arc::new(NeverFetcher), temp_dir.path(), Duration::from_millis(50));

    let err = cache.refresh().await.unwrap_err();
    assert!(matches!(err, TrackerError::Timeout(_)));

    let status = cache.status().await;
    assert!(!status.is_loading);
    assert!(status.is_demo_data);
    assert!(status.error.unwrap().starts_with("Refresh timeout after"));

    // Not locked out: the next attempt runs (and times out again)
    assert!(matches!(cache.refresh().await, Err(TrackerError::Timeout(_))));
}

#[tokio::test]
async fn test_cleanup_stats_reported_in_status() {
    let temp_dir = TempDir::new().unwrap();
    let cache = build_cache(Arc::new(NeverFetcher), temp_dir.path(), Duration::from_millis(50));

    let report = cache.run_cleanup();
    assert_eq!(report.files_deleted, 0);

    let status = cache.status().await;
    assert_eq!(status.cleanup.total_cleanups, 1);
    assert!(status.cleanup.last_cleanup.is_some());
}
