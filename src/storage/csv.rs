//! CSV tables.
//!
//! Identity columns come first (`Name`, `Roll_No`, and for the unified
//! table `Batch`, `Semester`), followed by subject columns. An empty subject
//! cell means the student has no mark for that subject.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ::csv::{Reader, StringRecord, Writer};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::StorageError;
use crate::models::{
    is_identity_column, StudentRecord, SubjectInfo, SubjectSemesterMap, BATCH_COLUMN,
    NAME_COLUMN, ROLL_NO_COLUMN, SEMESTER_COLUMN,
};
use crate::store::{Batch, RecordStore};

/// One row of `subjects_semester.csv`.
#[derive(Debug, Serialize, Deserialize)]
struct MappingRow {
    #[serde(rename = "Subject")]
    subject: String,

    #[serde(rename = "Semester")]
    semester: u8,

    #[serde(rename = "Subject_Name", default)]
    subject_name: Option<String>,

    #[serde(rename = "Credits", default)]
    credits: Option<u32>,
}

/// Read the subject to semester mapping.
pub fn read_mapping(path: &Path) -> Result<SubjectSemesterMap, StorageError> {
    let mut reader = Reader::from_path(path)?;
    let mut rows = Vec::new();

    for result in reader.deserialize::<MappingRow>() {
        let row = result?;
        rows.push(SubjectInfo {
            subject_id: row.subject.trim().to_string(),
            semester: row.semester,
            subject_name: row.subject_name.filter(|n| !n.trim().is_empty()),
            credits: row.credits,
        });
    }

    let mapping = SubjectSemesterMap::new(rows)?;
    debug!("Read {} subjects from {:?}", mapping.len(), path);
    Ok(mapping)
}

/// Write the mapping, replacing the file.
pub fn write_mapping(path: &Path, mapping: &SubjectSemesterMap) -> Result<usize, StorageError> {
    ensure_parent(path)?;
    let mut writer = Writer::from_path(path)?;

    for info in mapping.entries() {
        writer.serialize(MappingRow {
            subject: info.subject_id.clone(),
            semester: info.semester,
            subject_name: info.subject_name.clone(),
            credits: info.credits,
        })?;
    }

    writer.flush()?;
    info!("Wrote {} subjects to {:?}", mapping.len(), path);
    Ok(mapping.len())
}

fn batch_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^batch_(.+)\.csv$").expect("valid batch file regex"))
}

/// Batch label from a file name: `batch_2021_25.csv` -> `2021-25`.
pub fn batch_label_from_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let caps = batch_file_regex().captures(file_name)?;
    Some(caps[1].replace('_', "-"))
}

/// File name for a batch: `2021-25` -> `batch_2021_25.csv`.
pub fn batch_file_name(label: &str) -> String {
    format!("batch_{}.csv", label.replace('-', "_"))
}

/// Read every `batch_*.csv` in a directory, in file name order.
pub fn read_batch_dir(dir: &Path) -> Result<Vec<Batch>, StorageError> {
    let pattern = dir.join("batch_*.csv");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| StorageError::InvalidPath(dir.display().to_string()))?;

    let mut paths: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|e| StorageError::InvalidPath(e.to_string()))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable batch file: {}", e);
                None
            }
        })
        .collect();
    paths.sort();

    let mut batches = Vec::new();
    for path in paths {
        match batch_label_from_path(&path) {
            Some(label) => batches.push(read_batch_file(&path, &label)?),
            None => warn!("Skipping {:?}: not a batch file name", path),
        }
    }

    Ok(batches)
}

/// Read one batch table. The label comes from the caller, not the rows.
pub fn read_batch_file(path: &Path, label: &str) -> Result<Batch, StorageError> {
    let mut reader = Reader::from_path(path)?;
    let layout = HeaderLayout::from_headers(path, reader.headers()?)?;

    let mut batch = Batch::new(label, layout.subject_columns());
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        batch.push(layout.parse_row(path, i + 1, &record, Some(label))?);
    }

    warn_duplicate_roll_nos(&batch, path);
    debug!("Read {} students for batch {} from {:?}", batch.len(), label, path);
    Ok(batch)
}

/// Write one batch table into `dir`, replacing the file.
pub fn write_batch(dir: &Path, batch: &Batch) -> Result<PathBuf, StorageError> {
    let path = dir.join(batch_file_name(batch.label()));
    ensure_parent(&path)?;

    let with_semester = batch.students().iter().any(|s| s.semester_reached.is_some());
    let mut header = vec![NAME_COLUMN.to_string(), ROLL_NO_COLUMN.to_string()];
    if with_semester {
        header.push(SEMESTER_COLUMN.to_string());
    }
    header.extend(batch.columns().iter().cloned());

    let mut writer = Writer::from_path(&path)?;
    writer.write_record(&header)?;
    for student in batch.students() {
        let mut row = vec![student.name.clone(), student.roll_no.clone()];
        if with_semester {
            row.push(semester_cell(student));
        }
        row.extend(batch.columns().iter().map(|c| mark_cell(student, c)));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!("Wrote {} students to {:?}", batch.len(), path);
    Ok(path)
}

/// Read a unified table with a `Batch` column.
pub fn read_unified(path: &Path) -> Result<RecordStore, StorageError> {
    let mut reader = Reader::from_path(path)?;
    let layout = HeaderLayout::from_headers(path, reader.headers()?)?;
    if layout.batch.is_none() {
        return Err(StorageError::MissingColumn {
            path: path.to_path_buf(),
            column: BATCH_COLUMN.to_string(),
        });
    }

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        records.push(layout.parse_row(path, i + 1, &record, None)?);
    }

    debug!("Read {} students from {:?}", records.len(), path);
    let store = RecordStore::from_unified(&layout.subject_columns(), records);
    for batch in store.batches() {
        warn_duplicate_roll_nos(batch, path);
    }
    Ok(store)
}

/// Write every batch into one unified table, replacing the file.
pub fn write_unified(path: &Path, store: &RecordStore) -> Result<usize, StorageError> {
    ensure_parent(path)?;
    let columns = store.all_columns();

    // A batch exists in this table only through its rows.
    for batch in store.batches().filter(|b| b.is_empty()) {
        warn!(
            "Batch {} has no students and will not be kept in {:?}",
            batch.label(),
            path
        );
    }

    let mut header = vec![
        NAME_COLUMN.to_string(),
        ROLL_NO_COLUMN.to_string(),
        BATCH_COLUMN.to_string(),
        SEMESTER_COLUMN.to_string(),
    ];
    header.extend(columns.iter().cloned());

    let mut writer = Writer::from_path(path)?;
    writer.write_record(&header)?;

    let mut count = 0;
    for student in store.records() {
        let mut row = vec![
            student.name.clone(),
            student.roll_no.clone(),
            student.batch.clone(),
            semester_cell(student),
        ];
        row.extend(columns.iter().map(|c| mark_cell(student, c)));
        writer.write_record(&row)?;
        count += 1;
    }

    writer.flush()?;
    info!("Wrote {} students to {:?}", count, path);
    Ok(count)
}

fn warn_duplicate_roll_nos(batch: &Batch, path: &Path) {
    let duplicates = batch.duplicate_roll_nos();
    if !duplicates.is_empty() {
        warn!(
            "Batch {} in {:?} has duplicate roll numbers: {}",
            batch.label(),
            path,
            duplicates.join(", ")
        );
    }
}

/// Column positions resolved from a header row.
struct HeaderLayout {
    name: usize,
    roll_no: usize,
    batch: Option<usize>,
    semester: Option<usize>,
    subjects: Vec<(usize, String)>,
}

impl HeaderLayout {
    fn from_headers(path: &Path, headers: &StringRecord) -> Result<Self, StorageError> {
        let find = |column: &str| headers.iter().position(|h| h.trim() == column);
        let require = |column: &str| {
            find(column).ok_or_else(|| StorageError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })
        };

        let subjects = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (i, h.trim().to_string()))
            .filter(|(_, h)| !h.is_empty() && !is_identity_column(h))
            .collect();

        Ok(Self {
            name: require(NAME_COLUMN)?,
            roll_no: require(ROLL_NO_COLUMN)?,
            batch: find(BATCH_COLUMN),
            semester: find(SEMESTER_COLUMN),
            subjects,
        })
    }

    fn subject_columns(&self) -> Vec<String> {
        self.subjects.iter().map(|(_, s)| s.clone()).collect()
    }

    fn parse_row(
        &self,
        path: &Path,
        row: usize,
        record: &StringRecord,
        batch_label: Option<&str>,
    ) -> Result<StudentRecord, StorageError> {
        let cell = |i: usize| record.get(i).unwrap_or("").trim();
        let invalid = |column: &str, value: &str| StorageError::InvalidValue {
            path: path.to_path_buf(),
            row,
            column: column.to_string(),
            value: value.to_string(),
        };

        let batch = match (batch_label, self.batch) {
            (Some(label), _) => label.to_string(),
            (None, Some(i)) => cell(i).to_string(),
            (None, None) => String::new(),
        };

        let semester_reached = match self.semester.map(cell) {
            None | Some("") => None,
            Some(value) => Some(
                value
                    .parse::<u8>()
                    .map_err(|_| invalid(SEMESTER_COLUMN, value))?,
            ),
        };

        let mut marks = BTreeMap::new();
        for (i, subject) in &self.subjects {
            let value = cell(*i);
            if value.is_empty() {
                continue;
            }
            let mark: f64 = value.parse().map_err(|_| invalid(subject.as_str(), value))?;
            if !(0.0..=100.0).contains(&mark) {
                return Err(invalid(subject.as_str(), value));
            }
            marks.insert(subject.clone(), mark);
        }

        Ok(StudentRecord {
            name: cell(self.name).to_string(),
            roll_no: cell(self.roll_no).to_string(),
            batch,
            semester_reached,
            marks,
        })
    }
}

fn semester_cell(student: &StudentRecord) -> String {
    student
        .semester_reached
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn mark_cell(student: &StudentRecord, subject: &str) -> String {
    student
        .mark(subject)
        .map(|m| m.to_string())
        .unwrap_or_default()
}

fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_batch_label_from_path() {
        assert_eq!(
            batch_label_from_path(Path::new("/data/batch_2021_25.csv")),
            Some("2021-25".to_string())
        );
        assert_eq!(batch_label_from_path(Path::new("students.csv")), None);
        assert_eq!(batch_file_name("2021-25"), "batch_2021_25.csv");
    }

    #[test]
    fn test_read_mapping_with_optional_columns() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("subjects_semester.csv");
        fs::write(
            &path,
            "Subject,Semester,Subject_Name,Credits\nMATH101,1,Calculus I,4\nPHY101,1,,\n",
        )
        .unwrap();

        let mapping = read_mapping(&path).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(
            mapping.get("MATH101").unwrap().subject_name.as_deref(),
            Some("Calculus I")
        );
        assert_eq!(mapping.get("PHY101").unwrap().credits, None);
    }

    #[test]
    fn test_read_mapping_minimal_columns() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("subjects_semester.csv");
        fs::write(&path, "Subject,Semester\nMATH101,1\nMATH102,2\n").unwrap();

        let mapping = read_mapping(&path).unwrap();
        assert_eq!(mapping.subjects_for(2), vec!["MATH102"]);
    }

    #[test]
    fn test_read_batch_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("batch_2024_28.csv"),
            "Name,Roll_No,MATH101,PHY101\nDiya Nair,2024001,55.5,38\nDev Rao,2024002,71,\n",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("batch_2021_25.csv"),
            "Name,Roll_No,MATH101\nAarav Shah,2021001,90\n",
        )
        .unwrap();
        fs::write(temp_dir.path().join("notes.csv"), "x\n1\n").unwrap();

        let batches = read_batch_dir(temp_dir.path()).unwrap();
        let labels: Vec<&str> = batches.iter().map(|b| b.label()).collect();
        assert_eq!(labels, vec!["2021-25", "2024-28"]);

        let junior = &batches[1];
        assert_eq!(junior.columns(), &["MATH101".to_string(), "PHY101".to_string()]);
        assert_eq!(junior.students()[0].mark("PHY101"), Some(38.0));
        assert_eq!(junior.students()[0].batch, "2024-28");
        assert_eq!(junior.students()[1].mark("PHY101"), None);
    }

    #[test]
    fn test_invalid_mark_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("batch_2024_28.csv");
        fs::write(&path, "Name,Roll_No,MATH101\nDiya Nair,2024001,abc\n").unwrap();

        let err = read_batch_file(&path, "2024-28").unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidValue { row: 1, ref column, .. } if column == "MATH101"
        ));

        fs::write(&path, "Name,Roll_No,MATH101\nDiya Nair,2024001,100.5\n").unwrap();
        assert!(read_batch_file(&path, "2024-28").is_err());
    }

    #[test]
    fn test_missing_identity_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("batch_2024_28.csv");
        fs::write(&path, "Name,MATH101\nDiya Nair,50\n").unwrap();

        let err = read_batch_file(&path, "2024-28").unwrap_err();
        assert!(matches!(
            err,
            StorageError::MissingColumn { ref column, .. } if column == "Roll_No"
        ));
    }

    #[test]
    fn test_unified_round_trip_preserves_batches() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("students.csv");
        fs::write(
            &path,
            "Name,Roll_No,Batch,Semester,MATH101,MATH102\n\
             Aarav Shah,2021001,2021-25,8,90,85\n\
             Diya Nair,2024001,2024-28,2,55,\n",
        )
        .unwrap();

        let store = read_unified(&path).unwrap();
        assert_eq!(store.labels(), vec!["2021-25", "2024-28"]);
        assert_eq!(
            store.batch("2024-28").unwrap().columns(),
            &["MATH101".to_string()]
        );
        assert_eq!(store.batch("2021-25").unwrap().students()[0].semester_reached, Some(8));

        let out = temp_dir.path().join("out").join("students.csv");
        assert_eq!(write_unified(&out, &store).unwrap(), 2);

        let reloaded = read_unified(&out).unwrap();
        let a: Vec<&StudentRecord> = store.records().collect();
        let b: Vec<&StudentRecord> = reloaded.records().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_roll_nos_still_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("batch_2022_26.csv");
        fs::write(
            &path,
            "Name,Roll_No,MATH101
Rohan Das,2022001,60
Riya Das,2022001,70
",
        )
        .unwrap();

        let batch = read_batch_file(&path, "2022-26").unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.duplicate_roll_nos(), vec!["2022001"]);
    }

    #[test]
    fn test_unified_drops_empty_batches() {
        let temp_dir = TempDir::new().unwrap();
        let mut senior = Batch::new("2021-25", vec!["MATH101".to_string()]);
        senior.push(
            StudentRecord::new("Aarav Shah", "2021001", "2021-25").with_mark("MATH101", 90.0),
        );
        let store = RecordStore::from_batches(vec![senior, Batch::new("2025-29", vec![])]);

        let path = temp_dir.path().join("students.csv");
        assert_eq!(write_unified(&path, &store).unwrap(), 1);

        let reloaded = read_unified(&path).unwrap();
        assert_eq!(reloaded.labels(), vec!["2021-25"]);
    }

    #[test]
    fn test_unified_requires_batch_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("students.csv");
        fs::write(&path, "Name,Roll_No,MATH101\nA,1,50\n").unwrap();

        assert!(matches!(
            read_unified(&path),
            Err(StorageError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_write_batch_column_order() {
        let temp_dir = TempDir::new().unwrap();
        let mut batch = Batch::new("2023-27", vec!["PHY101".to_string(), "MATH101".to_string()]);
        batch.push(
            StudentRecord::new("Kavya Iyer", "2023001", "2023-27")
                .with_mark("MATH101", 70.5)
                .with_mark("PHY101", 64.0),
        );

        let path = write_batch(temp_dir.path(), &batch).unwrap();
        assert!(path.ends_with("batch_2023_27.csv"));

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("Name,Roll_No,PHY101,MATH101"));
        assert_eq!(lines.next(), Some("Kavya Iyer,2023001,64,70.5"));
    }
}
