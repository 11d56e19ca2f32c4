//! Workbook decoding (xlsx, xls, ods) into rows of [`CellValue`]

use super::cell::CellValue;
use crate::error::ParseError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::{debug, info};

/// One sheet's cells addressed from A1
#[derive(Debug, Clone)]
pub struct SheetRows {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

/// Prefer a sheet whose name mentions attendance, else the first sheet
pub fn select_sheet(names: &[String]) -> Option<&String> {
    names
        .iter()
        .find(|name| name.to_lowercase().contains("attendance"))
        .or_else(|| names.first())
}

/// Decode the attendance sheet from raw workbook bytes
pub fn read_attendance_sheet(bytes: &[u8]) -> Result<SheetRows, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    let names = workbook.sheet_names();
    info!("Available sheets: {}", names.join(", "));
    let name = select_sheet(&names).cloned().ok_or(ParseError::NoSheets)?;
    info!("Using sheet: {}", name);

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| ParseError::Workbook(format!("sheet '{}': {}", name, e)))?;

    // calamine ranges start at the first used cell; pad back to A1 so row and
    // column indices match what a person sees in the sheet
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset];
    for source in range.rows() {
        let mut row = vec![CellValue::Empty; col_offset];
        row.extend(source.iter().map(to_cell));
        rows.push(row);
    }
    debug!("Sheet '{}': {} rows (offset {}, {})", name, rows.len(), row_offset, col_offset);

    Ok(SheetRows { name, rows })
}

fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Float(n) => CellValue::Number(*n),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
    }
}
