//! Statistics and filtering engine.
//!
//! Every operation takes the store and mapping explicitly:
//! - Batch/semester filtering with availability checks
//! - Per-subject, per-student and class-level aggregates
//! - Grade distribution, backlogs and top-N rankings
//! - Name / roll number search
//! - Validated student admission
//! - Semester-wise comparison and batch overview

mod aggregate;
mod compare;
mod enrol;
mod filter;
mod search;

pub use aggregate::*;
pub use compare::*;
pub use enrol::*;
pub use filter::*;
pub use search::*;

use thiserror::Error;

use crate::models::Grade;

/// Validation failures. All are recoverable; the caller reports and moves on.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Unknown batch: {0}")]
    UnknownBatch(String),

    #[error(
        "Batch {batch} does not have information for Semester {requested} \
         (available: {available:?}, completed up to Semester {max_completed})"
    )]
    SemesterNotAvailable {
        batch: String,
        requested: u8,
        available: Vec<u8>,
        max_completed: u8,
    },

    #[error("No applicable subjects for this selection")]
    NoApplicableSubjects,

    #[error("No student records in this selection")]
    NoRecords,

    #[error("Student {roll_no} has no mark for {subject}")]
    MissingMarkData { roll_no: String, subject: String },

    #[error("Roll number {roll_no} already exists in batch {batch}")]
    DuplicateRollNo { batch: String, roll_no: String },

    #[error("Mark {mark} for {subject} is outside 0-100")]
    MarkOutOfRange { subject: String, mark: f64 },

    #[error("Student {0} must not be blank")]
    MissingIdentity(&'static str),
}

/// Calculate a letter grade from a percentage.
pub fn calculate_grade(percentage: f64) -> Grade {
    Grade::from_percentage(percentage)
}

/// Calculate a percentage from a total over `subject_count` subjects.
pub fn calculate_percentage(total: f64, subject_count: usize) -> f64 {
    if subject_count == 0 {
        0.0
    } else {
        total / (subject_count as f64 * 100.0) * 100.0
    }
}

/// Calculate a pass rate (0 to 100) from a pass count.
pub fn calculate_pass_rate(passed: usize, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        passed as f64 * 100.0 / count as f64
    }
}
