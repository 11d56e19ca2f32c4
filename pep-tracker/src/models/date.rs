//! Calendar dates in the sheet's `M/D/YYYY` form
//!
//! Dates are compared on their numeric components. Comparing the strings would
//! put "11/1/2025" before "2/1/2025".

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Spreadsheet serial for 1970-01-01 (UTC)
pub const SERIAL_UNIX_EPOCH: f64 = 25569.0;

/// Header serials outside this open interval are not treated as dates
pub const SERIAL_DATE_RANGE: (f64, f64) = (40000.0, 50000.0);

/// A calendar day rendered as `M/D/YYYY` without zero padding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_mdy(month: u32, day: u32, year: i32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse `M/D/YYYY` (one or two digit month and day, four digit year)
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split('/');
        let (month, day, year) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let digits = |s: &str, min: usize, max: usize| {
            (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
        };
        if !digits(month, 1, 2) || !digits(day, 1, 2) || !digits(year, 4, 4) {
            return None;
        }

        Self::from_mdy(month.parse().ok()?, day.parse().ok()?, year.parse().ok()?)
    }

    /// Convert a spreadsheet serial day number (UTC epoch) to a date.
    ///
    /// Only serials inside [`SERIAL_DATE_RANGE`] are accepted, which keeps small
    /// numbers such as percentages or class counts from reading as dates.
    pub fn from_serial(serial: f64) -> Option<Self> {
        if !serial.is_finite() || serial <= SERIAL_DATE_RANGE.0 || serial >= SERIAL_DATE_RANGE.1 {
            return None;
        }
        let days = (serial - SERIAL_UNIX_EPOCH).floor() as i64;
        NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(Duration::days(days)))
            .map(Self)
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.month(), self.day(), self.year())
    }
}

/// Error returned when a string is not `M/D/YYYY`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not an M/D/YYYY date: {0}")]
pub struct InvalidDate(pub String);

impl FromStr for CalendarDate {
    type Err = InvalidDate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidDate(s.to_string()))
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
