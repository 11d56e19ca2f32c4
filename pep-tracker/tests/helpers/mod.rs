//! Test Helper Utilities
//!
//! Shared fixtures for pep-tracker integration tests

#![allow(dead_code)]

pub mod fetchers;
pub mod workbook;

pub use fetchers::{GatedFetcher, NeverFetcher, ScriptedFetcher, StaticFetcher};
pub use workbook::{attendance_workbook, friday_now, workbook_bytes, Cell};
