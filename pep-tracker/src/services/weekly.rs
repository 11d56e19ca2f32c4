//! Weekly compliance window (Monday to Friday)
//!
//! Each week stands alone. Attendance above the weekly minimum is not carried
//! into the next week; term totals on the sheet are already capped upstream.

use crate::models::{AttendanceGrid, CalendarDate, StatusCode};
use chrono::{Duration, NaiveDate};
use pep_common::time::week_start;
use serde::{Deserialize, Serialize};

/// PEP runs on weekdays only
pub const SCHOOL_DAYS: u32 = 5;

const DAY_NAMES: [&str; SCHOOL_DAYS as usize] = ["Mon", "Tue", "Wed", "Thu", "Fri"];

/// Display status of one weekday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayStatus {
    Present,
    Leave,
    Absent,
    Warning,
    #[serde(rename = "Not marked")]
    NotMarked,
    Future,
}

impl DayStatus {
    fn from_grid(status: StatusCode) -> Self {
        match status {
            StatusCode::Present => DayStatus::Present,
            StatusCode::Leave => DayStatus::Leave,
            StatusCode::Warning => DayStatus::Warning,
            StatusCode::Absent => DayStatus::Absent,
            StatusCode::Unmarked => DayStatus::NotMarked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBreakdown {
    pub day: String,
    pub date: CalendarDate,
    pub status: DayStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeeklyStatus {
    Completed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyWindow {
    pub days_present: u32,
    pub days_required: u32,
    pub total_days: u32,
    pub status: WeeklyStatus,
    pub remaining: u32,
    pub breakdown: Vec<DayBreakdown>,
}

/// Monday..Friday of the week containing `today`
pub fn week_dates(today: NaiveDate) -> [CalendarDate; SCHOOL_DAYS as usize] {
    let monday = week_start(today);
    std::array::from_fn(|i| CalendarDate::new(monday + Duration::days(i as i64)))
}

/// PRESENT marks among this week's weekdays
pub fn present_this_week(grid: &AttendanceGrid, today: NaiveDate) -> u32 {
    week_dates(today)
        .iter()
        .filter(|date| grid.status_on(date) == StatusCode::Present)
        .count() as u32
}

/// Compute the window for the week containing `today`.
///
/// `today` is the reference calendar day in the program's timezone. Days after
/// it show as Future and are never counted.
pub fn weekly_window(grid: &AttendanceGrid, today: NaiveDate, days_required: u32) -> WeeklyWindow {
    let mut days_present = 0;
    let breakdown = week_dates(today)
        .iter()
        .zip(DAY_NAMES)
        .map(|(date, day)| {
            let status = if date.naive() > today {
                DayStatus::Future
            } else {
                DayStatus::from_grid(grid.status_on(date))
            };
            if status == DayStatus::Present {
                days_present += 1;
            }
            DayBreakdown {
                day: day.to_string(),
                date: *date,
                status,
            }
        })
        .collect();

    WeeklyWindow {
        days_present,
        days_required,
        total_days: SCHOOL_DAYS,
        status: if days_present >= days_required {
            WeeklyStatus::Completed
        } else {
            WeeklyStatus::Pending
        },
        remaining: days_required.saturating_sub(days_present),
        breakdown,
    }
}
