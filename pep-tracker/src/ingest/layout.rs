//! Column-role detection for the attendance sheet
//!
//! Everything here is a pure function of the sheet's cells so header
//! heuristics can be tested against fixed header rows.
//!
//! Term-aware sheets look like this (markers two rows above the headers):
//!
//! ```text
//! row 0:  |      |      | FESTIVAL TERM |     |          |       |          | 10/1/2025 | ...
//! row 2:  | Name | Roll | %             | ... | Attended | Total | Criteria | 10/1/2025 | ...
//! ```

use super::cell::{cell_at, CellValue};
use crate::models::CalendarDate;
use std::ops::Range;

/// Rows searched for the header row
pub const HEADER_SCAN_ROWS: usize = 10;

/// Term markers sit this many rows above the header row
pub const MARKER_ROW_OFFSET: usize = 2;

/// Used when no header names the student-name column
pub const DEFAULT_NAME_COL: usize = 2;

/// Used when no header names the roll-number column
pub const DEFAULT_ROLL_COL: usize = 3;

const LEGEND_LITERAL: &str = "(L-";

/// First row in the first [`HEADER_SCAN_ROWS`] that mentions a name, roll or
/// student column; row 0 when none does.
pub fn find_header_row(rows: &[Vec<CellValue>]) -> usize {
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| {
            row.iter().any(|cell| {
                let text = cell.as_lower();
                text.contains("name") || text.contains("roll") || text.contains("student")
            })
        })
        .unwrap_or(0)
}

/// Row holding term markers for a given header row
pub fn marker_row_index(header_row: usize) -> usize {
    header_row.saturating_sub(MARKER_ROW_OFFSET)
}

/// Student identity columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityColumns {
    pub name: usize,
    pub roll: usize,
    pub gender: Option<usize>,
    pub school: Option<usize>,
}

impl IdentityColumns {
    /// Detect identity columns by header text, falling back to the positions
    /// the program's sheets have always used for name and roll.
    pub fn detect(header: &[CellValue]) -> Self {
        let mut name = None;
        let mut roll = None;
        let mut gender = None;
        let mut school = None;

        for (col, cell) in header.iter().enumerate() {
            let text = cell.as_lower();
            if gender.is_none() && text.contains("gender") {
                gender = Some(col);
            }
            if name.is_none() && ((text.contains("student") && text.contains("name")) || text == "name") {
                name = Some(col);
            }
            if roll.is_none() && text.contains("roll") {
                roll = Some(col);
            }
            if school.is_none() && text.contains("school") {
                school = Some(col);
            }
        }

        Self {
            name: name.unwrap_or(DEFAULT_NAME_COL),
            roll: roll.unwrap_or(DEFAULT_ROLL_COL),
            gender,
            school,
        }
    }

    fn contains(&self, col: usize) -> bool {
        col == self.name || col == self.roll || self.gender == Some(col) || self.school == Some(col)
    }
}

/// A header column holding one class date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateColumn {
    pub col: usize,
    pub date: CalendarDate,
}

/// Columns belonging to one term group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermColumns {
    pub name: String,
    pub span: Range<usize>,
    pub percentage: Option<usize>,
    pub attended: Option<usize>,
    pub total: Option<usize>,
    pub criteria: Option<usize>,
    pub dates: Vec<DateColumn>,
}

impl TermColumns {
    /// Latest class date in this term, by calendar order
    pub fn last_date(&self) -> Option<CalendarDate> {
        self.dates.iter().map(|d| d.date).max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaRole {
    Percentage,
    Attended,
    TotalClasses,
    Criteria,
}

fn meta_role(header_lower: &str) -> Option<MetaRole> {
    if header_lower.contains('%') || header_lower.contains("percent") {
        Some(MetaRole::Percentage)
    } else if header_lower.contains("attend") {
        Some(MetaRole::Attended)
    } else if header_lower.contains("criteria") || header_lower.contains("clear") || header_lower.contains("status") {
        Some(MetaRole::Criteria)
    } else if header_lower.contains("class") || header_lower.contains("total") {
        Some(MetaRole::TotalClasses)
    } else {
        None
    }
}

/// Term name for a marker cell, or `None` when the cell is not a marker.
///
/// "TERM FESTIVAL" and "Festival Term" both become "FESTIVAL TERM"-style
/// labels: the word TERM is stripped and re-appended.
pub fn term_label(marker: &str) -> Option<String> {
    let text = marker.trim();
    let upper = text.to_ascii_uppercase();
    if !upper.contains("TERM") || upper.contains(LEGEND_LITERAL) {
        return None;
    }

    // to_ascii_uppercase preserves byte offsets, so indices carry over
    let mut stripped = String::with_capacity(text.len());
    let mut rest = 0;
    while let Some(pos) = upper[rest..].find("TERM") {
        stripped.push_str(&text[rest..rest + pos]);
        stripped.push(' ');
        rest += pos + "TERM".len();
    }
    stripped.push_str(&text[rest..]);

    let label = stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ':' || c.is_whitespace())
        .to_string();

    if label.is_empty() {
        Some("TERM".to_string())
    } else {
        Some(format!("{} TERM", label))
    }
}

/// Date columns of `header` within `span`
pub fn date_columns(header: &[CellValue], span: Range<usize>) -> Vec<DateColumn> {
    span.filter_map(|col| cell_at(header, col).as_date().map(|date| DateColumn { col, date }))
        .collect()
}

/// Split the sheet into term groups using the marker row.
///
/// Each marker's span runs to the next marker or to `width`.
pub fn detect_terms(
    marker_row: &[CellValue],
    header: &[CellValue],
    identity: &IdentityColumns,
    width: usize,
) -> Vec<TermColumns> {
    let markers: Vec<(usize, String)> = marker_row
        .iter()
        .enumerate()
        .filter_map(|(col, cell)| term_label(&cell.as_text()).map(|name| (col, name)))
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, (start, name))| {
            let end = markers.get(i + 1).map(|(col, _)| *col).unwrap_or(width).max(*start);
            let mut term = TermColumns {
                name: disambiguate(name, i, &markers),
                span: *start..end,
                percentage: None,
                attended: None,
                total: None,
                criteria: None,
                dates: Vec::new(),
            };

            for col in term.span.clone() {
                if identity.contains(col) {
                    continue;
                }
                let cell = cell_at(header, col);
                if let Some(date) = cell.as_date() {
                    term.dates.push(DateColumn { col, date });
                    continue;
                }
                let slot = match meta_role(&cell.as_lower()) {
                    Some(MetaRole::Percentage) => &mut term.percentage,
                    Some(MetaRole::Attended) => &mut term.attended,
                    Some(MetaRole::TotalClasses) => &mut term.total,
                    Some(MetaRole::Criteria) => &mut term.criteria,
                    None => continue,
                };
                slot.get_or_insert(col);
            }
            term
        })
        .collect()
}

/// Repeated labels get a numeric suffix so term names stay unique
fn disambiguate(name: &str, index: usize, markers: &[(usize, String)]) -> String {
    let earlier = markers[..index].iter().filter(|(_, n)| n == name).count();
    if earlier == 0 {
        name.to_string()
    } else {
        format!("{} {}", name, earlier + 1)
    }
}

/// Detected structure of one attendance sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub header_row: usize,
    pub identity: IdentityColumns,
    /// Empty for flat sheets without term markers
    pub terms: Vec<TermColumns>,
    /// Every date column contributing to the full-history grid, in column order
    pub dates: Vec<DateColumn>,
}

impl SheetLayout {
    pub fn detect(rows: &[Vec<CellValue>]) -> Self {
        let header_row = find_header_row(rows);
        let empty = Vec::new();
        let header = rows.get(header_row).unwrap_or(&empty);
        let marker_row = rows.get(marker_row_index(header_row)).unwrap_or(&empty);
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);

        let identity = IdentityColumns::detect(header);
        let terms = detect_terms(marker_row, header, &identity, width);
        let dates = if terms.is_empty() {
            date_columns(header, 0..width)
                .into_iter()
                .filter(|d| !identity.contains(d.col))
                .collect()
        } else {
            terms.iter().flat_map(|t| t.dates.iter().copied()).collect()
        };

        Self {
            header_row,
            identity,
            terms,
            dates,
        }
    }

    pub fn is_term_aware(&self) -> bool {
        !self.terms.is_empty()
    }
}
