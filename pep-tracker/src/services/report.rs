//! Per-student views assembled for dashboard collaborators

use super::weekly::{present_this_week, weekly_window, DayBreakdown, WeeklyWindow};
use crate::models::{CalendarDate, StatusCode, Student};
use crate::rules::AttendanceRules;
use chrono::NaiveDate;
use serde::Serialize;

/// A student with today's mark and this week's window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub student: Student,
    pub today_date: NaiveDate,
    pub today_status: String,
    pub is_today_marked: bool,
    pub weekly: WeeklyWindow,
}

/// Today's mark for a student; dates without an entry are unmarked
pub fn today_status(student: &Student, today: NaiveDate) -> StatusCode {
    student.attendance.status_on(&CalendarDate::new(today))
}

pub fn student_report(student: &Student, today: NaiveDate, rules: &AttendanceRules) -> StudentReport {
    let status = today_status(student, today);
    StudentReport {
        student: student.clone(),
        today_date: today,
        today_status: status.label().to_string(),
        is_today_marked: status.is_marked(),
        weekly: weekly_window(&student.attendance, today, rules.weekly_required_days),
    }
}

/// Students short of the weekly minimum, in sheet order
pub fn pending_students<'a>(
    students: &'a [Student],
    today: NaiveDate,
    rules: &AttendanceRules,
) -> Vec<&'a Student> {
    students
        .iter()
        .filter(|s| present_this_week(&s.attendance, today) < rules.weekly_required_days)
        .collect()
}

/// Row of the admin "pending this week" list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingStudent {
    pub student_name: String,
    pub roll_no: String,
    pub gender: String,
    pub school: String,
    pub days_present: u32,
    pub days_required: u32,
    pub days_remaining: u32,
    pub weekly_breakdown: Vec<DayBreakdown>,
}

/// Pending students with their breakdown, fewest days present first
pub fn pending_summaries(students: &[Student], today: NaiveDate, rules: &AttendanceRules) -> Vec<PendingStudent> {
    let mut pending: Vec<PendingStudent> = pending_students(students, today, rules)
        .into_iter()
        .map(|student| {
            let window = weekly_window(&student.attendance, today, rules.weekly_required_days);
            PendingStudent {
                student_name: student.student_name.clone(),
                roll_no: student.roll_no.clone(),
                gender: student.gender.clone(),
                school: student.school.clone(),
                days_present: window.days_present,
                days_required: window.days_required,
                days_remaining: window.remaining,
                weekly_breakdown: window.breakdown,
            }
        })
        .collect();
    // Stable: ties keep sheet order
    pending.sort_by_key(|p| p.days_present);
    pending
}
