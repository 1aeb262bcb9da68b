//! Subject to semester mapping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semesters are numbered 1 through this value.
pub const MAX_SEMESTER: u8 = 8;

/// Errors raised while building a mapping.
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("Subject {subject} is mapped to both semester {first} and semester {second}")]
    DuplicateSubject {
        subject: String,
        first: u8,
        second: u8,
    },

    #[error("Subject {subject} has semester {semester}, expected 1-{}", MAX_SEMESTER)]
    SemesterOutOfRange { subject: String, semester: u8 },
}

/// One row of the mapping table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectInfo {
    /// Subject identifier (e.g., "MATH101")
    pub subject_id: String,

    /// Semester the subject is taught in
    pub semester: u8,

    /// Human readable name
    pub subject_name: Option<String>,

    /// Credit weight
    pub credits: Option<u32>,
}

impl SubjectInfo {
    pub fn new(subject_id: impl Into<String>, semester: u8) -> Self {
        Self {
            subject_id: subject_id.into(),
            semester,
            subject_name: None,
            credits: None,
        }
    }

    /// Builder method to set the subject name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.subject_name = Some(name.into());
        self
    }

    /// Builder method to set credits.
    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits = Some(credits);
        self
    }
}

/// Read-only lookup from subject id to semester, in table order.
#[derive(Debug, Clone, Default)]
pub struct SubjectSemesterMap {
    entries: Vec<SubjectInfo>,
    index: HashMap<String, usize>,
}

impl SubjectSemesterMap {
    /// Build a mapping, rejecting conflicting or out-of-range rows.
    ///
    /// A subject listed twice with the same semester is kept once.
    pub fn new(rows: Vec<SubjectInfo>) -> Result<Self, MappingError> {
        let mut entries: Vec<SubjectInfo> = Vec::with_capacity(rows.len());
        let mut index = HashMap::new();

        for row in rows {
            if row.semester == 0 || row.semester > MAX_SEMESTER {
                return Err(MappingError::SemesterOutOfRange {
                    subject: row.subject_id,
                    semester: row.semester,
                });
            }

            if let Some(&existing) = index.get(&row.subject_id) {
                let first: &SubjectInfo = &entries[existing];
                if first.semester != row.semester {
                    return Err(MappingError::DuplicateSubject {
                        subject: row.subject_id,
                        first: first.semester,
                        second: row.semester,
                    });
                }
                continue;
            }

            index.insert(row.subject_id.clone(), entries.len());
            entries.push(row);
        }

        Ok(Self { entries, index })
    }

    /// Semester for a subject, if mapped.
    pub fn semester_of(&self, subject_id: &str) -> Option<u8> {
        self.get(subject_id).map(|s| s.semester)
    }

    pub fn get(&self, subject_id: &str) -> Option<&SubjectInfo> {
        self.index.get(subject_id).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, subject_id: &str) -> bool {
        self.index.contains_key(subject_id)
    }

    /// Subjects for a semester, in table order.
    pub fn subjects_for(&self, semester: u8) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|s| s.semester == semester)
            .map(|s| s.subject_id.as_str())
            .collect()
    }

    pub fn entries(&self) -> &[SubjectInfo] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
