//! Program attendance rules
//!
//! The numbers here are the PEP's published policy: 24 of 30 classes per term
//! and at least 3 of the 5 weekday sessions each week. They are grouped in one
//! value so a deployment can override them from the `[rules]` config section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceRules {
    /// Classes a student must attend to clear a term
    pub required_classes: u32,
    /// Planned classes per term; also the default when the sheet has no total
    pub planned_classes: u32,
    /// Substring (case-insensitive) marking a term with no fixed end date
    pub ongoing_marker: String,
    /// A fixed term whose full schedule was held is over this many days after its last class
    pub ended_grace_days: i64,
    /// A fixed term is over this many days after its last class regardless of schedule
    pub ended_hard_days: i64,
    /// PRESENT days needed in a Monday–Friday week
    pub weekly_required_days: u32,
}

impl Default for AttendanceRules {
    fn default() -> Self {
        Self {
            required_classes: 24,
            planned_classes: 30,
            ongoing_marker: "REPUBLIC".to_string(),
            ended_grace_days: 7,
            ended_hard_days: 30,
            weekly_required_days: 3,
        }
    }
}

impl AttendanceRules {
    /// Whether a term name denotes an open-ended term
    pub fn is_open_ended(&self, term_name: &str) -> bool {
        let marker = self.ongoing_marker.trim();
        !marker.is_empty() && term_name.to_uppercase().contains(&marker.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pep_common::config::read_toml;
    use std::io::Write;

    #[test]
    fn test_open_ended_marker_is_case_insensitive() {
        let rules = AttendanceRules::default();
        assert!(rules.is_open_ended("REPUBLIC TERM"));
        assert!(rules.is_open_ended("Republic Term"));
        assert!(!rules.is_open_ended("FESTIVAL TERM"));
    }

    #[test]
    fn test_partial_toml_override_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "required_classes = 20").unwrap();
        let rules: AttendanceRules = read_toml(file.path()).unwrap();
        assert_eq!(rules.required_classes, 20);
        assert_eq!(rules.planned_classes, 30);
        assert_eq!(rules.weekly_required_days, 3);
    }
}
