//! In-memory record store.
//!
//! Records are sharded by batch label. Each batch keeps its declared
//! subject columns in table order, so both physical layouts (one table per
//! batch, or one unified table with a batch column) load into the same
//! shape. Batches iterate in label order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::StudentRecord;

/// Physical layout of the stored tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreLayout {
    /// One CSV file per batch
    #[default]
    PerBatch,
    /// One CSV file with a batch column
    Unified,
}

/// One cohort's rows and subject columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    label: String,
    columns: Vec<String>,
    students: Vec<StudentRecord>,
}

impl Batch {
    /// Create an empty batch with declared subject columns.
    pub fn new(label: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            label: label.into(),
            columns,
            students: Vec::new(),
        }
    }

    /// Create a batch whose columns are the subjects its rows carry,
    /// in first-seen order of `column_order`.
    pub fn from_rows(
        label: impl Into<String>,
        column_order: &[String],
        students: Vec<StudentRecord>,
    ) -> Self {
        let columns = column_order
            .iter()
            .filter(|c| students.iter().any(|s| s.marks.contains_key(c.as_str())))
            .cloned()
            .collect();

        Self {
            label: label.into(),
            columns,
            students,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Declared subject columns, in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn students(&self) -> &[StudentRecord] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn has_roll_no(&self, roll_no: &str) -> bool {
        let roll_no = roll_no.trim();
        self.students.iter().any(|s| s.roll_no.trim() == roll_no)
    }

    /// Roll numbers held by more than one row, in first-seen order.
    /// Blank roll numbers are ignored.
    pub fn duplicate_roll_nos(&self) -> Vec<String> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        let mut duplicates = Vec::new();
        for student in &self.students {
            let roll_no = student.roll_no.trim();
            if roll_no.is_empty() {
                continue;
            }
            let count = seen.entry(roll_no).or_insert(0);
            *count += 1;
            if *count == 2 {
                duplicates.push(roll_no.to_string());
            }
        }
        duplicates
    }

    /// Append a record, extending the declared columns with any new subjects.
    pub(crate) fn push(&mut self, record: StudentRecord) {
        for subject in record.marks.keys() {
            if !self.columns.iter().any(|c| c == subject) {
                self.columns.push(subject.clone());
            }
        }
        self.students.push(record);
    }
}

/// All loaded records.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    batches: BTreeMap<String, Batch>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from one table per batch.
    pub fn from_batches(batches: Vec<Batch>) -> Self {
        let mut store = Self::new();
        for batch in batches {
            store.batches.insert(batch.label.clone(), batch);
        }
        store
    }

    /// Build from one unified table, grouping rows by their batch field.
    ///
    /// `column_order` is the table's subject column order.
    pub fn from_unified(column_order: &[String], records: Vec<StudentRecord>) -> Self {
        let mut grouped: BTreeMap<String, Vec<StudentRecord>> = BTreeMap::new();
        for record in records {
            grouped.entry(record.batch.clone()).or_default().push(record);
        }

        let batches = grouped
            .into_iter()
            .map(|(label, rows)| Batch::from_rows(label, column_order, rows))
            .collect();

        Self::from_batches(batches)
    }

    pub fn batch(&self, label: &str) -> Option<&Batch> {
        self.batches.get(label)
    }

    pub(crate) fn batch_mut(&mut self, label: &str) -> Option<&mut Batch> {
        self.batches.get_mut(label)
    }

    /// Batches in label order.
    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }

    /// Batch labels in order.
    pub fn labels(&self) -> Vec<&str> {
        self.batches.keys().map(String::as_str).collect()
    }

    /// Flat view of every record, batch by batch.
    pub fn records(&self) -> impl Iterator<Item = &StudentRecord> {
        self.batches.values().flat_map(|b| b.students.iter())
    }

    /// Union of every batch's columns, first-seen order.
    pub fn all_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for batch in self.batches.values() {
            for column in &batch.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        columns
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.batches.values().map(Batch::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unified_groups_by_batch() {
        let order = columns(&["MATH101", "PHY101", "MATH102"]);
        let records = vec![
            StudentRecord::new("A", "1", "2022-26")
                .with_mark("MATH101", 50.0)
                .with_mark("MATH102", 60.0),
            StudentRecord::new("B", "2", "2021-25").with_mark("PHY101", 70.0),
            StudentRecord::new("C", "3", "2022-26").with_mark("MATH101", 55.0),
        ];

        let store = RecordStore::from_unified(&order, records);

        assert_eq!(store.labels(), vec!["2021-25", "2022-26"]);
        assert_eq!(store.len(), 3);

        let batch = store.batch("2022-26").unwrap();
        assert_eq!(batch.columns(), columns(&["MATH101", "MATH102"]).as_slice());
        assert_eq!(batch.len(), 2);

        let flat: Vec<&str> = store.records().map(|r| r.name.as_str()).collect();
        assert_eq!(flat, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_per_batch_keeps_declared_columns() {
        let batch = Batch::new("2024-28", columns(&["MATH101", "PHY101"]));
        let store = RecordStore::from_batches(vec![batch]);

        let batch = store.batch("2024-28").unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.columns().len(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_push_extends_columns() {
        let mut batch = Batch::new("2023-27", columns(&["MATH101"]));
        batch.push(
            StudentRecord::new("A", "1", "2023-27")
                .with_mark("MATH101", 40.0)
                .with_mark("SEM3_SUB1", 50.0),
        );

        assert_eq!(batch.columns(), columns(&["MATH101", "SEM3_SUB1"]).as_slice());
        assert!(batch.has_roll_no(" 1 "));
        assert!(!batch.has_roll_no("2"));
    }

    #[test]
    fn test_duplicate_roll_nos() {
        let batch = Batch::from_rows(
            "2022-26",
            &[],
            vec![
                StudentRecord::new("A", "2022001", "2022-26"),
                StudentRecord::new("B", " 2022002", "2022-26"),
                StudentRecord::new("C", "2022002 ", "2022-26"),
                StudentRecord::new("D", "", "2022-26"),
                StudentRecord::new("E", "  ", "2022-26"),
                StudentRecord::new("F", "2022002", "2022-26"),
            ],
        );

        assert_eq!(batch.duplicate_roll_nos(), vec!["2022002"]);
        assert!(Batch::new("2024-28", vec![]).duplicate_roll_nos().is_empty());
    }

    #[test]
    fn test_all_columns_union() {
        let store = RecordStore::from_batches(vec![
            Batch::new("a", columns(&["X", "Y"])),
            Batch::new("b", columns(&["Y", "Z"])),
        ]);
        assert_eq!(store.all_columns(), columns(&["X", "Y", "Z"]));
    }

    #[test]
    fn test_layout_serialization() {
        let json = serde_json::to_string(&StoreLayout::PerBatch).unwrap();
        assert_eq!(json, "\"per-batch\"");
        let parsed: StoreLayout = serde_json::from_str("\"unified\"").unwrap();
        assert_eq!(parsed, StoreLayout::Unified);
    }
}
