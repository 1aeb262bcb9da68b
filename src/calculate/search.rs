//! Name and roll number search across batches.

use tracing::debug;

use crate::models::StudentRecord;
use crate::store::RecordStore;

/// Matching rows within one batch.
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub batch: String,
    pub rows: Vec<&'a StudentRecord>,

    /// The batch's declared columns, in table order
    pub subjects: Vec<String>,
}

/// Case-insensitive substring search over name or roll number.
///
/// Blank names and roll numbers never match. Batches are returned in label
/// order and only when they contain a match; no match is an empty vector.
pub fn search<'a>(store: &'a RecordStore, term: &str) -> Vec<SearchHit<'a>> {
    let needle = term.trim().to_lowercase();

    let hits: Vec<SearchHit<'a>> = store
        .batches()
        .filter_map(|batch| {
            let rows: Vec<&StudentRecord> = batch
                .students()
                .iter()
                .filter(|record| is_match(record, &needle))
                .collect();

            if rows.is_empty() {
                None
            } else {
                Some(SearchHit {
                    batch: batch.label().to_string(),
                    rows,
                    subjects: batch.columns().to_vec(),
                })
            }
        })
        .collect();

    debug!("Search for {:?} matched {} batches", term, hits.len());
    hits
}

fn is_match(record: &StudentRecord, needle: &str) -> bool {
    let contains = |field: Option<&str>| {
        field
            .map(|value| value.to_lowercase().contains(needle))
            .unwrap_or(false)
    };

    contains(record.known_name()) || contains(record.known_roll_no())
}
