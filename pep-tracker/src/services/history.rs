//! Full attendance history grouped by month, newest first

use crate::models::{AttendanceGrid, CalendarDate, StatusCode};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub date: CalendarDate,
    pub status: StatusCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGroup {
    /// e.g. "October 2025"
    pub month: String,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_present: u32,
    pub total_leave: u32,
    pub total_warning: u32,
    pub total_absent: u32,
    /// Whole-number percentage of marked days that were PRESENT
    pub attendance_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceHistory {
    pub months: Vec<MonthGroup>,
    pub stats: HistoryStats,
}

pub fn attendance_history(grid: &AttendanceGrid) -> AttendanceHistory {
    let mut months: Vec<MonthGroup> = Vec::new();
    let mut stats = HistoryStats::default();

    for (date, status) in grid.iter().rev() {
        match status {
            StatusCode::Present => stats.total_present += 1,
            StatusCode::Leave => stats.total_leave += 1,
            StatusCode::Warning => stats.total_warning += 1,
            StatusCode::Absent => stats.total_absent += 1,
            StatusCode::Unmarked => continue,
        }

        let label = date.naive().format("%B %Y").to_string();
        let entry = HistoryEntry {
            date: *date,
            status: *status,
        };
        match months.last_mut() {
            Some(group) if group.month == label => group.entries.push(entry),
            _ => months.push(MonthGroup {
                month: label,
                entries: vec![entry],
            }),
        }
    }

    let total = stats.total_present + stats.total_leave + stats.total_warning + stats.total_absent;
    if total > 0 {
        stats.attendance_rate = ((f64::from(stats.total_present) / f64::from(total)) * 100.0).round() as u32;
    }

    AttendanceHistory { months, stats }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_newest_month_first() {
        let grid: AttendanceGrid = [
            ("9/30/2025", StatusCode::Present),
            ("10/1/2025", StatusCode::Absent),
            ("10/2/2025", StatusCode::Present),
            ("1/5/2026", StatusCode::Warning),
        ]
        .iter()
        .map(|(d, s)| (CalendarDate::parse(d).unwrap(), *s))
        .collect();

        let history = attendance_history(&grid);
        let labels: Vec<&str> = history.months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(labels, vec!["January 2026", "October 2025", "September 2025"]);
        assert_eq!(history.months[1].entries[0].date.to_string(), "10/2/2025");

        assert_eq!(history.stats.total_present, 2);
        assert_eq!(history.stats.total_absent, 1);
        assert_eq!(history.stats.total_warning, 1);
        assert_eq!(history.stats.attendance_rate, 50);
    }

    #[test]
    fn test_empty_grid_has_zero_rate() {
        let history = attendance_history(&AttendanceGrid::new());
        assert!(history.months.is_empty());
        assert_eq!(history.stats, HistoryStats::default());
    }
}
