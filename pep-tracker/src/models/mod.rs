//! Data model for the attendance tracker

pub mod date;
pub mod snapshot;
pub mod status;
pub mod student;

pub use date::CalendarDate;
pub use snapshot::CacheSnapshot;
pub use status::StatusCode;
pub use student::{AttendanceGrid, Student, Term, TermStatus};
