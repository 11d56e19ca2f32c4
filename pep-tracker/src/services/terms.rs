//! Term derivation: clearance status and class projections
//!
//! Status is decided once per ingest against the refresh day. Precedence:
//! 1. attended ≥ required → Cleared
//! 2. open-ended term → In Progress (never times out)
//! 3. criteria text says cleared → Cleared
//! 4. criteria text says not cleared → Not Cleared
//! 5. fixed term has ended → Not Cleared
//! 6. otherwise In Progress

use crate::models::{AttendanceGrid, CalendarDate, Term, TermStatus};
use crate::rules::AttendanceRules;
use chrono::NaiveDate;

/// Source figures for one student's term, before derivation
#[derive(Debug, Clone, Default)]
pub struct TermFacts<'a> {
    pub name: &'a str,
    pub attended: u32,
    pub total: u32,
    pub percentage: Option<f64>,
    pub criteria: Option<&'a str>,
    pub classes_conducted: u32,
    /// Latest date column of the term, marked or not
    pub last_class_date: Option<CalendarDate>,
}

/// What the sheet's criteria column says, if anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaVerdict {
    Cleared,
    NotCleared,
    Unknown,
}

pub fn read_criteria(text: Option<&str>) -> CriteriaVerdict {
    let lower = text.unwrap_or_default().to_lowercase();
    let cleared = lower.contains("cleared");
    let negated = lower.contains("not");
    match (cleared, negated) {
        (true, false) => CriteriaVerdict::Cleared,
        (true, true) => CriteriaVerdict::NotCleared,
        _ => CriteriaVerdict::Unknown,
    }
}

/// Whether a fixed-length term is over as of `today`
pub fn term_has_ended(
    last_class_date: Option<CalendarDate>,
    total_classes: u32,
    today: NaiveDate,
    rules: &AttendanceRules,
) -> bool {
    let Some(last) = last_class_date else {
        return false;
    };
    let days_since = (today - last.naive()).num_days();
    (days_since > rules.ended_grace_days && total_classes >= rules.planned_classes)
        || days_since > rules.ended_hard_days
}

pub fn derive_status(facts: &TermFacts<'_>, today: NaiveDate, rules: &AttendanceRules) -> TermStatus {
    if facts.attended >= rules.required_classes {
        return TermStatus::Cleared;
    }
    if rules.is_open_ended(facts.name) {
        return TermStatus::InProgress;
    }
    match read_criteria(facts.criteria) {
        CriteriaVerdict::Cleared => return TermStatus::Cleared,
        CriteriaVerdict::NotCleared => return TermStatus::NotCleared,
        CriteriaVerdict::Unknown => {}
    }
    if term_has_ended(facts.last_class_date, facts.total, today, rules) {
        TermStatus::NotCleared
    } else {
        TermStatus::InProgress
    }
}

/// Classes still needed to clear
pub fn remaining(attended: u32, rules: &AttendanceRules) -> u32 {
    rules.required_classes.saturating_sub(attended)
}

/// Classes left to be held in the term.
///
/// Open-ended terms have no conducted-class ceiling, so they project from
/// attendance achieved; fixed terms project from classes actually held.
pub fn classes_left(facts: &TermFacts<'_>, open_ended: bool, rules: &AttendanceRules) -> u32 {
    if open_ended {
        rules.planned_classes.saturating_sub(facts.attended)
    } else {
        rules.planned_classes.saturating_sub(facts.classes_conducted)
    }
}

/// Build the derived term record
pub fn build_term(
    facts: &TermFacts<'_>,
    attendance: AttendanceGrid,
    today: NaiveDate,
    rules: &AttendanceRules,
) -> Term {
    let open_ended = rules.is_open_ended(facts.name);
    Term {
        term_name: facts.name.to_string(),
        attended_classes: facts.attended,
        total_classes: facts.total,
        percentage: facts.percentage,
        criteria: facts.criteria.map(str::to_string),
        classes_conducted: facts.classes_conducted,
        required_classes: rules.required_classes,
        status: derive_status(facts, today, rules),
        remaining: remaining(facts.attended, rules),
        classes_left: classes_left(facts, open_ended, rules),
        open_ended,
        attendance,
    }
}
