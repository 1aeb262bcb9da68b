//! Student mark record model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identity and cohort column names. Every other column is a subject.
pub const NAME_COLUMN: &str = "Name";
pub const ROLL_NO_COLUMN: &str = "Roll_No";
pub const BATCH_COLUMN: &str = "Batch";
pub const SEMESTER_COLUMN: &str = "Semester";

/// Whether a table header names an identity/cohort field.
pub fn is_identity_column(column: &str) -> bool {
    matches!(
        column,
        NAME_COLUMN | ROLL_NO_COLUMN | BATCH_COLUMN | SEMESTER_COLUMN
    )
}

/// One student's marks within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Student name
    pub name: String,

    /// Roll number, unique within the batch
    pub roll_no: String,

    /// Batch label (e.g., "2021-25")
    pub batch: String,

    /// Highest semester the student has reached, when recorded
    pub semester_reached: Option<u8>,

    /// Subject id -> mark (0.0 to 100.0)
    pub marks: BTreeMap<String, f64>,
}

impl StudentRecord {
    /// Create a record with no marks.
    pub fn new(
        name: impl Into<String>,
        roll_no: impl Into<String>,
        batch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            roll_no: roll_no.into(),
            batch: batch.into(),
            semester_reached: None,
            marks: BTreeMap::new(),
        }
    }

    /// Builder method to add a mark.
    pub fn with_mark(mut self, subject: impl Into<String>, mark: f64) -> Self {
        self.marks.insert(subject.into(), mark);
        self
    }

    /// Builder method to set the semester reached.
    pub fn with_semester_reached(mut self, semester: u8) -> Self {
        self.semester_reached = Some(semester);
        self
    }

    pub fn mark(&self, subject: &str) -> Option<f64> {
        self.marks.get(subject).copied()
    }

    /// Name, unless blank.
    pub fn known_name(&self) -> Option<&str> {
        non_blank(&self.name)
    }

    /// Roll number, unless blank.
    pub fn known_roll_no(&self) -> Option<&str> {
        non_blank(&self.roll_no)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = StudentRecord::new("Rohan Sharma", "2021001", "2021-25")
            .with_mark("MATH101", 78.5)
            .with_semester_reached(8);

        assert_eq!(record.mark("MATH101"), Some(78.5));
        assert_eq!(record.mark("PHY101"), None);
        assert_eq!(record.semester_reached, Some(8));
    }

    #[test]
    fn test_blank_identity_is_unknown() {
        let record = StudentRecord::new("  ", "", "2021-25");
        assert_eq!(record.known_name(), None);
        assert_eq!(record.known_roll_no(), None);

        let record = StudentRecord::new(" Diya Nair ", "2021002", "2021-25");
        assert_eq!(record.known_name(), Some("Diya Nair"));
    }

    #[test]
    fn test_identity_columns() {
        assert!(is_identity_column("Name"));
        assert!(is_identity_column("Roll_No"));
        assert!(is_identity_column("Batch"));
        assert!(is_identity_column("Semester"));
        assert!(!is_identity_column("MATH101"));
    }

    #[test]
    fn test_record_serialization() {
        let record = StudentRecord::new("Avni Rao", "2022014", "2022-26").with_mark("CS101", 91.0);
        let json = serde_json::to_string(&record).unwrap();
        let parsed: StudentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }
}
