//! Batch and semester filtering.

use std::collections::BTreeSet;

use tracing::debug;

use super::ValidationError;
use crate::models::{StudentRecord, SubjectSemesterMap};
use crate::store::{Batch, RecordStore};

/// Label used in errors when no batch was requested.
pub const ALL_BATCHES: &str = "all batches";

/// A validated selection of rows and the subjects that apply to them.
#[derive(Debug, Clone)]
pub struct RecordSubset<'a> {
    /// Requested batch, `None` for every batch
    pub batch: Option<String>,

    /// Requested semester, `None` for every semester
    pub semester: Option<u8>,

    pub rows: Vec<&'a StudentRecord>,

    /// Applicable subject columns, in column order
    pub subjects: Vec<String>,
}

impl RecordSubset<'_> {
    /// Subjects, or `NoApplicableSubjects` when there are none.
    pub fn require_subjects(&self) -> Result<&[String], ValidationError> {
        if self.subjects.is_empty() {
            Err(ValidationError::NoApplicableSubjects)
        } else {
            Ok(&self.subjects)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Semesters whose subjects appear among a batch's columns, ascending.
///
/// With no batch, the columns of every batch are considered.
pub fn available_semesters(
    store: &RecordStore,
    mapping: &SubjectSemesterMap,
    batch: Option<&str>,
) -> Result<Vec<u8>, ValidationError> {
    let columns = columns_for(store, batch)?;

    let semesters: BTreeSet<u8> = columns
        .iter()
        .filter_map(|c| mapping.semester_of(c))
        .collect();

    Ok(semesters.into_iter().collect())
}

/// Highest available semester, 0 when there is none.
pub fn max_semester_completed(available: &[u8]) -> u8 {
    available.iter().copied().max().unwrap_or(0)
}

/// Restrict the store to a batch and/or semester.
///
/// A semester is only validated when one is requested. An empty subject
/// list is a valid result; see [`RecordSubset::require_subjects`].
///
/// Without a batch, only batches that declare every selected subject
/// contribute rows. With no semester either, the subjects narrow to the
/// columns every non-empty batch declares.
pub fn select<'a>(
    store: &'a RecordStore,
    mapping: &SubjectSemesterMap,
    batch: Option<&str>,
    semester: Option<u8>,
) -> Result<RecordSubset<'a>, ValidationError> {
    let columns = match (batch, semester) {
        (None, None) => shared_columns(store),
        _ => columns_for(store, batch)?,
    };

    let subjects: Vec<String> = match semester {
        None => columns,
        Some(requested) => {
            let available = available_semesters(store, mapping, batch)?;
            if !available.contains(&requested) {
                return Err(ValidationError::SemesterNotAvailable {
                    batch: batch.unwrap_or(ALL_BATCHES).to_string(),
                    requested,
                    max_completed: max_semester_completed(&available),
                    available,
                });
            }

            mapping
                .subjects_for(requested)
                .into_iter()
                .filter(|s| columns.iter().any(|c| c == s))
                .map(str::to_string)
                .collect()
        }
    };

    let rows: Vec<&StudentRecord> = match batch {
        Some(label) => store
            .batch(label)
            .map(|b| b.students().iter().collect())
            .unwrap_or_default(),
        None => store
            .batches()
            .filter(|b| subjects.iter().all(|s| b.columns().contains(s)))
            .flat_map(|b| b.students())
            .collect(),
    };

    debug!(
        "Selected {} rows and {} subjects (batch: {:?}, semester: {:?})",
        rows.len(),
        subjects.len(),
        batch,
        semester
    );

    Ok(RecordSubset {
        batch: batch.map(str::to_string),
        semester,
        rows,
        subjects,
    })
}

/// Columns declared by every batch that has students, first-seen order.
fn shared_columns(store: &RecordStore) -> Vec<String> {
    let populated: Vec<&Batch> = store.batches().filter(|b| !b.is_empty()).collect();

    store
        .all_columns()
        .into_iter()
        .filter(|c| populated.iter().all(|b| b.columns().contains(c)))
        .collect()
}

fn columns_for(store: &RecordStore, batch: Option<&str>) -> Result<Vec<String>, ValidationError> {
    match batch {
        Some(label) => store
            .batch(label)
            .map(|b| b.columns().to_vec())
            .ok_or_else(|| ValidationError::UnknownBatch(label.to_string())),
        None => Ok(store.all_columns()),
    }
}
