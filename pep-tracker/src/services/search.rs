//! Student lookup by roll number or name

use crate::models::Student;
use std::cmp::Ordering;

/// How a caller identifies a student
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentQuery {
    Roll(String),
    Name(String),
}

/// First student (in sheet order) whose roll number contains `partial`,
/// ignoring case. A blank query matches nobody.
pub fn find_by_roll<'a>(students: &'a [Student], partial: &str) -> Option<&'a Student> {
    let needle = partial.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    students.iter().find(|s| s.roll_no.to_lowercase().contains(&needle))
}

/// Students whose name contains every whitespace-separated query term.
///
/// Ranked: exact first-name match on the first term, then first-name prefix,
/// then alphabetical by name.
pub fn search_by_name<'a>(students: &'a [Student], query: &str) -> Vec<&'a Student> {
    let lowered = query.to_lowercase();
    let terms: Vec<&str> = lowered.split_whitespace().collect();
    let Some(first_term) = terms.first().copied() else {
        return Vec::new();
    };

    let mut ranked: Vec<(u8, String, &Student)> = students
        .iter()
        .filter_map(|student| {
            let name = student.student_name.to_lowercase();
            if !terms.iter().all(|term| name.contains(term)) {
                return None;
            }
            let first_name = student.first_name_lower();
            let rank = if first_name == first_term {
                0
            } else if first_name.starts_with(first_term) {
                1
            } else {
                2
            };
            Some((rank, name, student))
        })
        .collect();

    ranked.sort_by(|a, b| match a.0.cmp(&b.0) {
        Ordering::Equal => a
            .1
            .cmp(&b.1)
            .then_with(|| a.2.student_name.cmp(&b.2.student_name)),
        other => other,
    });

    ranked.into_iter().map(|(_, _, student)| student).collect()
}

/// Single best match for a query
pub fn find_student<'a>(students: &'a [Student], query: &StudentQuery) -> Option<&'a Student> {
    match query {
        StudentQuery::Roll(roll) => find_by_roll(students, roll),
        StudentQuery::Name(name) => search_by_name(students, name).into_iter().next(),
    }
}

/// All matches for a query; a roll lookup yields at most one
pub fn search_students<'a>(students: &'a [Student], query: &StudentQuery) -> Vec<&'a Student> {
    match query {
        StudentQuery::Roll(roll) => find_by_roll(students, roll).into_iter().collect(),
        StudentQuery::Name(name) => search_by_name(students, name),
    }
}
