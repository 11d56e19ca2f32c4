//! One complete ingest result
//!
//! A snapshot is immutable once built; the cache replaces it wholesale so
//! readers never see a half-updated dataset.

use super::date::CalendarDate;
use super::student::Student;
use crate::rules::AttendanceRules;
use crate::services::report::pending_students;
use crate::services::search::{find_by_roll, find_student, search_by_name, search_students, StudentQuery};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    /// Sheet order, one entry per unique roll number
    pub students: Vec<Student>,
    /// Every date column seen, in column order
    pub date_headers: Vec<CalendarDate>,
    pub term_names: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

impl CacheSnapshot {
    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    pub fn find_by_roll(&self, partial: &str) -> Option<&Student> {
        find_by_roll(&self.students, partial)
    }

    pub fn search_by_name(&self, query: &str) -> Vec<&Student> {
        search_by_name(&self.students, query)
    }

    pub fn student(&self, query: &StudentQuery) -> Option<&Student> {
        find_student(&self.students, query)
    }

    pub fn search(&self, query: &StudentQuery) -> Vec<&Student> {
        search_students(&self.students, query)
    }

    pub fn pending_students(&self, today: NaiveDate, rules: &AttendanceRules) -> Vec<&Student> {
        pending_students(&self.students, today, rules)
    }
}
