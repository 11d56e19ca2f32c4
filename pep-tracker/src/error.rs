//! Error types for pep-tracker
//!
//! Fetch and parse failures fail a refresh but never the process: the cache
//! keeps serving its previous snapshot and the next scheduled refresh retries.

use std::time::Duration;
use thiserror::Error;

/// Failure of the external spreadsheet fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Download failed with HTTP status {0}")]
    HttpStatus(u16),

    #[error("File too small: {0} bytes")]
    PayloadTooSmall(usize),

    #[error("Received HTML instead of a spreadsheet")]
    HtmlPayload,

    #[error("No spreadsheet source configured (set source.url or source.file)")]
    NotConfigured,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Malformed or unusable spreadsheet
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unreadable workbook: {0}")]
    Workbook(String),

    #[error("Workbook has no sheets")]
    NoSheets,

    #[error("Sheet '{0}' has no data rows")]
    EmptySheet(String),

    /// Structure parsed but no row passed validation
    #[error("No students found in spreadsheet")]
    EmptyResult,
}

/// Why a sheet row was skipped during ingest
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("row {row}: student name shorter than 2 characters")]
    NameTooShort { row: usize },

    #[error("row {row}: roll number shorter than 3 characters")]
    RollTooShort { row: usize },

    #[error("row {row}: roll number {roll} already seen")]
    DuplicateRoll { row: usize, roll: String },
}

/// Main error type for pep-tracker
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A refresh is already in flight
    #[error("Already loading")]
    AlreadyLoading,

    #[error("Refresh timeout after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Common error: {0}")]
    Common(#[from] pep_common::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using pep-tracker TrackerError
pub type Result<T> = std::result::Result<T, TrackerError>;
