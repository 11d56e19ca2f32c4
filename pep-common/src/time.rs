//! Timestamp and timezone utilities
//!
//! Attendance is recorded against school calendar days, so every "what day is
//! it" question goes through a [`ReferenceClock`] carrying an explicit
//! timezone instead of the host's local time.

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

/// Timezone the program's attendance sheet is kept in
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse an IANA timezone name such as `Asia/Kolkata`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| Error::Config(format!("Unknown timezone '{}': {}", name, e)))
}

/// Converts instants to calendar days in a fixed timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceClock {
    tz: Tz,
}

impl ReferenceClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Calendar day of `instant` in this clock's timezone
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Calendar day right now
    pub fn today(&self) -> NaiveDate {
        self.day_of(now())
    }
}

impl Default for ReferenceClock {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Kolkata)
    }
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}
