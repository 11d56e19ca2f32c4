//! # PEP Common Library
//!
//! Shared code for the PEP attendance workspace:
//! - Error and result types
//! - Configuration file resolution and TOML loading
//! - Timestamp and timezone helpers

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
