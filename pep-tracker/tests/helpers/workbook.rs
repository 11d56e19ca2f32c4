//! Real xlsx bytes for ingest and cache tests

use chrono::{DateTime, TimeZone, Utc};
use rust_xlsxwriter::Workbook;

#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

pub fn t(text: &str) -> Cell {
    if text.is_empty() {
        Cell::Blank
    } else {
        Cell::Text(text.to_string())
    }
}

pub fn n(value: f64) -> Cell {
    Cell::Number(value)
}

/// Build a workbook with one worksheet per `(name, rows)` entry
pub fn workbook_bytes(sheets: &[(&str, Vec<Vec<Cell>>)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(r as u32, c as u16, text).unwrap();
                    }
                    Cell::Number(value) => {
                        worksheet.write_number(r as u32, c as u16, *value).unwrap();
                    }
                    Cell::Blank => {}
                }
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// Friday 10 Oct 2025, 11:30 in Kolkata
pub fn friday_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 10, 6, 0, 0).unwrap()
}

/// Rows of a term-aware sheet covering the week of 6..10 Oct 2025
///
/// FESTIVAL TERM spans columns 4..13 (date headers are Excel serials
/// 45936..45940); REPUBLIC TERM starts at column 13 with text dates.
pub fn attendance_rows() -> Vec<Vec<Cell>> {
    let mut header = vec![
        t("Gender"),
        t("Student Name"),
        t("Roll No"),
        t("School"),
        t("%"),
        t("Total Attended"),
        t("Total Classes"),
        t("Criteria"),
    ];
    header.extend((45936..=45940).map(|serial| n(f64::from(serial))));
    header.extend([t("Attended"), t("1/5/2026"), t("1/6/2026")]);

    let mut markers = vec![t(""); 13];
    markers[4] = t("TERM FESTIVAL");
    markers.push(t("REPUBLIC TERM"));

    vec![
        markers,
        vec![t("P = Present, W = Warning (L- Leave)")],
        header,
        vec![
            t("F"), t("Asha Rao"), t("24BBA001"), t("SoM"), n(90.0), n(27.0), n(30.0), t("Cleared"),
            t("P"), t("P"), t("P"), t("L"), t(""),
            n(2.0), t("P"), t("P"),
        ],
        vec![
            t("M"), t("Ravi Shah"), t("24BBA002"), t("SoE"), n(40.0), n(12.0), n(30.0), t("Not Cleared"),
            t("P"), t("A"), t(""), t(""), t(""),
            n(0.0), t(""), t(""),
        ],
        vec![
            t("M"), t("Anand Kumar"), t("24BBA003"), t("SoM"), n(80.0), n(24.0), n(30.0), t("Not Cleared"),
            t("L"), t("P"), t(""), t("W"), t(""),
            n(1.0), t("P"), t(""),
        ],
        // Skipped: blank identity
        vec![t(""), t(""), t(""), t("")],
        // Skipped: roll already seen (case-insensitive)
        vec![t("F"), t("Asha Copy"), t("24bba001"), t("SoM"), n(10.0), n(3.0)],
    ]
}

pub fn attendance_workbook() -> Vec<u8> {
    workbook_bytes(&[("PEP Attendance", attendance_rows())])
}
