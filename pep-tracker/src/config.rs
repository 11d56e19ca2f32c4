//! pep-tracker configuration
//!
//! Loaded from the TOML bootstrap file found by
//! [`pep_common::config::ConfigResolver`]. Every field has a default, so an
//! empty or missing file yields a working (if sourceless) setup.
//!
//! ```toml
//! timezone = "Asia/Kolkata"
//!
//! [source]
//! url = "https://example.sharepoint.com/:x:/s/pep/attendance?e=abc"
//!
//! [refresh]
//! interval_secs = 600
//! timeout_secs = 120
//!
//! [cleanup]
//! interval_secs = 1800
//! max_age_secs = 3600
//!
//! [rules]
//! required_classes = 24
//! ```

use crate::cache::{AttendanceCache, CacheSettings};
use crate::error::FetchError;
use crate::rules::AttendanceRules;
use crate::scheduler::Schedule;
use crate::services::cleanup::{ArtifactCleaner, StaleDirRule};
use crate::services::fetch::{FileFetcher, HttpFetcher, SpreadsheetFetcher, UnconfiguredFetcher};
use pep_common::config::ConfigResolver;
use pep_common::time::{parse_timezone, ReferenceClock, DEFAULT_TIMEZONE};
use pep_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// IANA timezone that decides "today"
    pub timezone: String,
    pub source: SourceConfig,
    pub refresh: RefreshConfig,
    pub cleanup: CleanupConfig,
    pub rules: AttendanceRules,
    pub logging: LoggingConfig,
}

/// Where the workbook comes from; `url` wins when both are set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    /// Watchdog for one whole fetch+ingest attempt
    pub timeout_secs: u64,
    /// HTTP request timeout
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub interval_secs: u64,
    pub max_age_secs: u64,
    /// Holds downloaded workbooks and per-attempt directories
    pub download_dir: PathBuf,
    pub stale_dirs: Vec<StaleDirRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            source: SourceConfig::default(),
            refresh: RefreshConfig::default(),
            cleanup: CleanupConfig::default(),
            rules: AttendanceRules::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            timeout_secs: 120,
            fetch_timeout_secs: 60,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        let tmp = std::env::temp_dir();
        Self {
            interval_secs: 1800,
            max_age_secs: 3600,
            download_dir: tmp.join("attendance"),
            stale_dirs: vec![StaleDirRule {
                root: tmp,
                prefix: "puppeteer_".to_string(),
            }],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Resolve, read and validate the config file
    pub fn load(cli_path: Option<PathBuf>) -> Result<Self> {
        let config: Self = ConfigResolver::new(cli_path).load()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        parse_timezone(&self.timezone)?;
        let periods = [
            ("refresh.interval_secs", self.refresh.interval_secs),
            ("refresh.timeout_secs", self.refresh.timeout_secs),
            ("refresh.fetch_timeout_secs", self.refresh.fetch_timeout_secs),
            ("cleanup.interval_secs", self.cleanup.interval_secs),
        ];
        for (key, value) in periods {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", key)));
            }
        }
        if self.rules.weekly_required_days > crate::services::weekly::SCHOOL_DAYS {
            return Err(Error::Config(format!(
                "rules.weekly_required_days cannot exceed {}",
                crate::services::weekly::SCHOOL_DAYS
            )));
        }
        Ok(())
    }

    pub fn clock(&self) -> Result<ReferenceClock> {
        Ok(ReferenceClock::new(parse_timezone(&self.timezone)?))
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            refresh_interval: Duration::from_secs(self.refresh.interval_secs),
            cleanup_interval: Duration::from_secs(self.cleanup.interval_secs),
        }
    }

    pub fn cache_settings(&self) -> Result<CacheSettings> {
        Ok(CacheSettings {
            refresh_timeout: Duration::from_secs(self.refresh.timeout_secs),
            work_dir: self.cleanup.download_dir.clone(),
            rules: self.rules.clone(),
            clock: self.clock()?,
        })
    }

    pub fn cleaner(&self) -> ArtifactCleaner {
        ArtifactCleaner::new(
            self.cleanup.download_dir.clone(),
            self.cleanup.stale_dirs.clone(),
            Duration::from_secs(self.cleanup.max_age_secs),
        )
    }

    /// Fetcher for the configured source
    pub fn fetcher(&self) -> std::result::Result<Arc<dyn SpreadsheetFetcher>, FetchError> {
        let url = self.source.url.as_deref().map(str::trim).filter(|u| !u.is_empty());
        if let Some(url) = url {
            let timeout = Duration::from_secs(self.refresh.fetch_timeout_secs);
            return Ok(Arc::new(HttpFetcher::new(url, timeout)?));
        }
        if let Some(file) = &self.source.file {
            return Ok(Arc::new(FileFetcher::new(file.clone())));
        }
        warn!("No spreadsheet source configured; refreshes will fail until source.url or source.file is set");
        Ok(Arc::new(UnconfiguredFetcher))
    }

    /// Assemble the cache and its collaborators
    pub fn build_cache(&self) -> crate::error::Result<AttendanceCache> {
        let fetcher = self.fetcher()?;
        info!("Spreadsheet source: {}", fetcher.describe());
        Ok(AttendanceCache::new(
            fetcher,
            Arc::new(self.cleaner()),
            self.cache_settings()?,
        ))
    }
}
