//! Derivations, queries and collaborators used by the cache

pub mod cleanup;
pub mod fetch;
pub mod history;
pub mod report;
pub mod search;
pub mod terms;
pub mod weekly;

pub use cleanup::{ArtifactCleaner, CleanupError, CleanupReport, CleanupStats, StaleDirRule};
pub use fetch::{FileFetcher, HttpFetcher, SpreadsheetFetcher, UnconfiguredFetcher};
pub use history::{attendance_history, AttendanceHistory};
pub use report::{pending_summaries, student_report, today_status, PendingStudent, StudentReport};
pub use search::StudentQuery;
pub use weekly::{weekly_window, WeeklyStatus, WeeklyWindow};
