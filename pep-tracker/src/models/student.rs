//! Students, their attendance grids and term records

use super::date::CalendarDate;
use super::status::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date → mark for one student, iterated chronologically
///
/// Dates without an entry are unmarked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceGrid(BTreeMap<CalendarDate, StatusCode>);

impl AttendanceGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mark, replacing any earlier mark for the same date
    pub fn insert(&mut self, date: CalendarDate, status: StatusCode) {
        self.0.insert(date, status);
    }

    pub fn status_on(&self, date: &CalendarDate) -> StatusCode {
        self.0.get(date).copied().unwrap_or(StatusCode::Unmarked)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&CalendarDate, &StatusCode)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(CalendarDate, StatusCode)> for AttendanceGrid {
    fn from_iter<I: IntoIterator<Item = (CalendarDate, StatusCode)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Clearance state of one term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermStatus {
    #[serde(rename = "Cleared")]
    Cleared,
    #[serde(rename = "Not Cleared")]
    NotCleared,
    #[serde(rename = "In Progress")]
    InProgress,
}

/// One academic attendance period for one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub term_name: String,
    /// Source-reported, already capped at three per week upstream
    pub attended_classes: u32,
    pub total_classes: u32,
    pub percentage: Option<f64>,
    /// Free-text clearance column ("Cleared", "Not Cleared", ...)
    pub criteria: Option<String>,
    /// Date columns of this term where any student has a mark
    pub classes_conducted: u32,
    pub required_classes: u32,
    pub status: TermStatus,
    pub remaining: u32,
    pub classes_left: u32,
    pub open_ended: bool,
    pub attendance: AttendanceGrid,
}

/// One row of the attendance sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub roll_no: String,
    pub student_name: String,
    pub gender: String,
    pub school: String,
    pub attendance: AttendanceGrid,
    pub terms: Vec<Term>,
}

impl Student {
    pub fn first_name_lower(&self) -> String {
        self.student_name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    pub fn term(&self, name: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.term_name.eq_ignore_ascii_case(name))
    }
}
