//! Spreadsheet cell values
//!
//! Every conversion is total: each variant has a defined result for text,
//! number, date and status lookups.

use crate::models::{CalendarDate, StatusCode};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text<S: Into<String>>(value: S) -> Self {
        CellValue::Text(value.into())
    }

    /// Trimmed display text; whole numbers render without a fraction
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.trim().to_string(),
        }
    }

    pub fn as_lower(&self) -> String {
        self.as_text().to_lowercase()
    }

    /// Numeric value; text such as `"27"` or `"90%"` is parsed
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Number(_) => None,
            CellValue::Text(s) => s
                .trim()
                .trim_end_matches('%')
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
        }
    }

    /// Non-negative whole count, truncating fractions
    pub fn as_count(&self) -> Option<u32> {
        self.as_number().map(|n| n.max(0.0).min(f64::from(u32::MAX)) as u32)
    }

    /// Header date: a plausible serial or `M/D/YYYY` text
    pub fn as_date(&self) -> Option<CalendarDate> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => CalendarDate::from_serial(*n),
            CellValue::Text(s) => CalendarDate::parse(s),
        }
    }

    /// Attendance mark; blank cells have none
    pub fn as_status(&self) -> Option<StatusCode> {
        StatusCode::from_mark(&self.as_text())
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Cell at `col`, treating cells past the end of a short row as empty
pub fn cell_at(row: &[CellValue], col: usize) -> &CellValue {
    static EMPTY: CellValue = CellValue::Empty;
    row.get(col).unwrap_or(&EMPTY)
}
