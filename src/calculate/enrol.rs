//! Adding students to a batch.

use std::collections::BTreeMap;

use tracing::info;

use super::{available_semesters, max_semester_completed, ValidationError};
use crate::models::{StudentRecord, SubjectSemesterMap};
use crate::store::RecordStore;

/// A student to be added, as collected by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub batch: String,
    pub name: String,
    pub roll_no: String,
    pub semester_reached: Option<u8>,
    pub marks: BTreeMap<String, f64>,
}

/// Result of a successful admission.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// The appended record
    pub record: StudentRecord,

    /// Highest semester the batch had completed before the append
    pub max_semester_completed: u8,
}

/// Validate a new student and append it to its batch.
///
/// Every declared column of the batch needs a mark. Subjects the batch has
/// not seen before become new columns. Persisting the store is left to the
/// caller.
pub fn add_student(
    store: &mut RecordStore,
    mapping: &SubjectSemesterMap,
    student: NewStudent,
) -> Result<Admission, ValidationError> {
    let available = available_semesters(store, mapping, Some(&student.batch))?;
    let max_completed = max_semester_completed(&available);

    let name = student.name.trim();
    let roll_no = student.roll_no.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingIdentity("name"));
    }
    if roll_no.is_empty() {
        return Err(ValidationError::MissingIdentity("roll number"));
    }

    let batch = store
        .batch_mut(&student.batch)
        .ok_or_else(|| ValidationError::UnknownBatch(student.batch.clone()))?;

    if batch.has_roll_no(roll_no) {
        return Err(ValidationError::DuplicateRollNo {
            batch: student.batch.clone(),
            roll_no: roll_no.to_string(),
        });
    }

    if let Some((subject, &mark)) = student
        .marks
        .iter()
        .find(|&(_, &mark)| !(0.0..=100.0).contains(&mark))
    {
        return Err(ValidationError::MarkOutOfRange {
            subject: subject.clone(),
            mark,
        });
    }

    if let Some(subject) = batch
        .columns()
        .iter()
        .find(|c| !student.marks.contains_key(c.as_str()))
    {
        return Err(ValidationError::MissingMarkData {
            roll_no: roll_no.to_string(),
            subject: subject.clone(),
        });
    }

    let record = StudentRecord {
        name: name.to_string(),
        roll_no: roll_no.to_string(),
        batch: student.batch.clone(),
        semester_reached: student.semester_reached,
        marks: student.marks,
    };

    batch.push(record.clone());
    info!(
        "Added student {} to batch {} ({} subjects)",
        record.roll_no,
        record.batch,
        record.marks.len()
    );

    Ok(Admission {
        record,
        max_semester_completed: max_completed,
    })
}

/// Subjects a new student should be marked on for a semester.
///
/// Uses the mapping when it defines subjects for the semester, otherwise
/// `adhoc_count` placeholder subjects.
pub fn enrolment_subjects(
    mapping: &SubjectSemesterMap,
    semester: u8,
    adhoc_count: usize,
) -> Vec<String> {
    let mapped = mapping.subjects_for(semester);
    if mapped.is_empty() {
        placeholder_subjects(semester, adhoc_count)
    } else {
        mapped.into_iter().map(str::to_string).collect()
    }
}

/// Placeholder subject ids `SEM{n}_SUB{i}`, numbered from 1.
pub fn placeholder_subjects(semester: u8, count: usize) -> Vec<String> {
    (1..=count)
        .map(|i| format!("SEM{}_SUB{}", semester, i))
        .collect()
}
