//! Attendance status codes

use serde::{Deserialize, Serialize};
use std::fmt;

/// One day's mark for one student
///
/// The sheet stores a single uppercase letter. Anything that is not blank and
/// not one of P, L or W is recorded as `Absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    #[serde(rename = "P")]
    Present,
    #[serde(rename = "L")]
    Leave,
    #[serde(rename = "A")]
    Absent,
    /// Rule violation on the day (wrong kit, not following instructions)
    #[serde(rename = "W")]
    Warning,
    #[serde(rename = "-")]
    Unmarked,
}

impl StatusCode {
    /// Decode a cell's text. Blank text is `None` (no entry in the grid).
    pub fn from_mark(text: &str) -> Option<Self> {
        let mark = text.trim();
        if mark.is_empty() {
            return None;
        }
        Some(match mark.to_ascii_uppercase().as_str() {
            "P" => StatusCode::Present,
            "L" => StatusCode::Leave,
            "W" => StatusCode::Warning,
            _ => StatusCode::Absent,
        })
    }

    /// Label shown for "today's status"
    pub fn label(&self) -> &'static str {
        match self {
            StatusCode::Present => "Present",
            StatusCode::Leave => "Leave",
            StatusCode::Absent => "Absent",
            StatusCode::Warning => "Warning",
            StatusCode::Unmarked => "Not marked",
        }
    }

    pub fn is_marked(&self) -> bool {
        *self != StatusCode::Unmarked
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
