//! pep-tracker library interface
//!
//! Turns the PEP attendance workbook into per-student records (full grid,
//! per-term clearance, weekly compliance) and keeps them fresh:
//!
//! - [`ingest`]: workbook bytes → [`models::CacheSnapshot`]
//! - [`services`]: term derivation, weekly window, history, lookups, fetch, cleanup
//! - [`cache`]: the refresh lifecycle and query surface
//! - [`scheduler`]: periodic refresh and cleanup

pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod rules;
pub mod scheduler;
pub mod services;

pub use crate::cache::{AttendanceCache, CacheSettings, CacheStatus, RefreshOutcome};
pub use crate::config::TrackerConfig;
pub use crate::error::{FetchError, ParseError, Result, TrackerError};
pub use crate::rules::AttendanceRules;
pub use crate::scheduler::{Schedule, Scheduler};
pub use crate::services::StudentQuery;
