//! Spreadsheet ingest: workbook bytes → [`CacheSnapshot`]
//!
//! Decoding ([`workbook`]), column detection ([`layout`]) and row building
//! (here) are separate steps so the last two can run on in-memory rows.

pub mod cell;
pub mod layout;
pub mod workbook;

use self::cell::{cell_at, CellValue};
use self::layout::{IdentityColumns, SheetLayout, TermColumns};
use crate::error::{ParseError, RowRejection};
use crate::models::{AttendanceGrid, CacheSnapshot, CalendarDate, Student};
use crate::rules::AttendanceRules;
use crate::services::terms::{build_term, TermFacts};
use chrono::{DateTime, NaiveDate, Utc};
use pep_common::time::ReferenceClock;
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_ROLL_CHARS: usize = 3;

/// Inputs that make an ingest reproducible
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Stamped on the snapshot as `last_updated`
    pub fetched_at: DateTime<Utc>,
    /// Calendar day used for term-ended detection
    pub today: NaiveDate,
    pub rules: AttendanceRules,
}

impl IngestOptions {
    pub fn new(clock: &ReferenceClock, fetched_at: DateTime<Utc>, rules: AttendanceRules) -> Self {
        Self {
            fetched_at,
            today: clock.day_of(fetched_at),
            rules,
        }
    }
}

/// Decode and ingest a workbook
pub fn ingest_workbook(bytes: &[u8], options: &IngestOptions) -> Result<CacheSnapshot, ParseError> {
    let sheet = workbook::read_attendance_sheet(bytes)?;
    info!("Found {} rows in sheet '{}'", sheet.rows.len(), sheet.name);
    if sheet.rows.len() < 2 {
        return Err(ParseError::EmptySheet(sheet.name));
    }
    ingest_rows(&sheet.rows, options)
}

/// Identity cells of a row that passed validation
struct ValidRow<'a> {
    cells: &'a [CellValue],
    name: String,
    roll: String,
}

fn validate_row<'a>(
    index: usize,
    cells: &'a [CellValue],
    identity: &IdentityColumns,
) -> Result<ValidRow<'a>, RowRejection> {
    let name = cell_at(cells, identity.name).as_text();
    let roll = cell_at(cells, identity.roll).as_text();
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(RowRejection::NameTooShort { row: index });
    }
    if roll.chars().count() < MIN_ROLL_CHARS {
        return Err(RowRejection::RollTooShort { row: index });
    }
    Ok(ValidRow { cells, name, roll })
}

/// Build a snapshot from rows already addressed from A1
pub fn ingest_rows(rows: &[Vec<CellValue>], options: &IngestOptions) -> Result<CacheSnapshot, ParseError> {
    let layout = SheetLayout::detect(rows);
    info!(
        "Header row {}; columns name={} roll={} gender={:?} school={:?}; {} term(s), {} date column(s)",
        layout.header_row,
        layout.identity.name,
        layout.identity.roll,
        layout.identity.gender,
        layout.identity.school,
        layout.terms.len(),
        layout.dates.len()
    );

    let mut seen_rolls = HashSet::new();
    let mut valid = Vec::new();
    let mut rejected = 0usize;
    for (index, cells) in rows.iter().enumerate().skip(layout.header_row + 1) {
        let checked = validate_row(index, cells, &layout.identity).and_then(|row| {
            if seen_rolls.insert(row.roll.to_lowercase()) {
                Ok(row)
            } else {
                Err(RowRejection::DuplicateRoll {
                    row: index,
                    roll: row.roll,
                })
            }
        });
        match checked {
            Ok(row) => valid.push(row),
            Err(rejection @ RowRejection::DuplicateRoll { .. }) => {
                warn!("Skipping {}", rejection);
                rejected += 1;
            }
            Err(rejection) => {
                debug!("Skipping {}", rejection);
                rejected += 1;
            }
        }
    }

    if valid.is_empty() {
        warn!("No valid student rows ({} rejected)", rejected);
        return Err(ParseError::EmptyResult);
    }

    let conducted: Vec<u32> = layout
        .terms
        .iter()
        .map(|term| classes_conducted(term, &valid))
        .collect();

    let students: Vec<Student> = valid
        .iter()
        .map(|row| build_student(row, &layout, &conducted, options))
        .collect();

    info!("Parsed {} students ({} rows skipped)", students.len(), rejected);
    if let Some(first) = students.first() {
        debug!("First student: {}, Roll: {}", first.student_name, first.roll_no);
    }

    let mut date_headers: Vec<CalendarDate> = Vec::new();
    for column in &layout.dates {
        if !date_headers.contains(&column.date) {
            date_headers.push(column.date);
        }
    }

    Ok(CacheSnapshot {
        students,
        date_headers,
        term_names: layout.terms.iter().map(|t| t.name.clone()).collect(),
        last_updated: options.fetched_at,
    })
}

/// Date columns of the term where at least one valid student has a mark
fn classes_conducted(term: &TermColumns, rows: &[ValidRow<'_>]) -> u32 {
    term.dates
        .iter()
        .filter(|column| rows.iter().any(|row| !cell_at(row.cells, column.col).is_blank()))
        .count() as u32
}

fn build_student(row: &ValidRow<'_>, layout: &SheetLayout, conducted: &[u32], options: &IngestOptions) -> Student {
    let optional_text = |col: Option<usize>| {
        col.map(|c| cell_at(row.cells, c).as_text())
            .unwrap_or_default()
    };

    let mut attendance = AttendanceGrid::new();
    for column in &layout.dates {
        if let Some(status) = cell_at(row.cells, column.col).as_status() {
            attendance.insert(column.date, status);
        }
    }

    let terms = layout
        .terms
        .iter()
        .zip(conducted)
        .map(|(term, &classes_conducted)| {
            let grid: AttendanceGrid = term
                .dates
                .iter()
                .filter_map(|column| {
                    cell_at(row.cells, column.col)
                        .as_status()
                        .map(|status| (column.date, status))
                })
                .collect();

            let criteria = term
                .criteria
                .map(|c| cell_at(row.cells, c).as_text())
                .filter(|text| !text.is_empty());

            let facts = TermFacts {
                name: &term.name,
                attended: term
                    .attended
                    .and_then(|c| cell_at(row.cells, c).as_count())
                    .unwrap_or(0),
                total: term
                    .total
                    .and_then(|c| cell_at(row.cells, c).as_count())
                    .unwrap_or(options.rules.planned_classes),
                percentage: term.percentage.and_then(|c| cell_at(row.cells, c).as_number()),
                criteria: criteria.as_deref(),
                classes_conducted,
                last_class_date: term.last_date(),
            };
            build_term(&facts, grid, options.today, &options.rules)
        })
        .collect();

    Student {
        roll_no: row.roll.clone(),
        student_name: row.name.clone(),
        gender: optional_text(layout.identity.gender),
        school: optional_text(layout.identity.school),
        attendance,
        terms,
    }
}
