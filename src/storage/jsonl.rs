//! JSONL (JSON Lines) export of derived metrics.
//!
//! Each line is a valid JSON object. Exports live under
//! `<data_dir>/<export_dir>/<batch>/` and are replaced on every run.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{StorageConfig, StorageError};
use crate::calculate::ALL_BATCHES;
use crate::models::{ClassSummary, GradeCount, Stats};

/// Exported files for one computed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Students,
    Subjects,
    Summary,
    Backlogs,
}

impl ExportKind {
    /// Get the filename for this export.
    pub fn filename(&self) -> &'static str {
        match self {
            ExportKind::Students => "students.jsonl",
            ExportKind::Subjects => "subjects.jsonl",
            ExportKind::Summary => "summary.jsonl",
            ExportKind::Backlogs => "backlogs.jsonl",
        }
    }
}

/// Directory holding the exports of one view.
///
/// A semester view gets its own `semester-<n>` subdirectory.
pub fn export_dir(config: &StorageConfig, batch: Option<&str>, semester: Option<u8>) -> PathBuf {
    let label = batch.unwrap_or(ALL_BATCHES).replace(' ', "-");
    let dir = config.derived_dir().join(label);
    match semester {
        Some(n) => dir.join(format!("semester-{}", n)),
        None => dir,
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for one export file of a view.
    pub fn for_export(
        config: &StorageConfig,
        kind: ExportKind,
        batch: Option<&str>,
        semester: Option<u8>,
    ) -> Self {
        Self::new(export_dir(config, batch, semester).join(kind.filename()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write items, replacing the entire file.
    pub fn write_all(&self, items: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let mut writer = BufWriter::new(File::create(&self.path)?);
        for item in items {
            writeln!(writer, "{}", serde_json::to_string(item)?)?;
        }
        writer.flush()?;

        debug!("Wrote {} lines to {:?}", items.len(), self.path);
        Ok(items.len())
    }
}

/// Headline line written to `summary.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub batch: String,
    pub semester: Option<u8>,
    pub subjects: Vec<String>,
    pub summary: ClassSummary,
    pub grade_distribution: Vec<GradeCount>,
    pub computed_at: DateTime<Utc>,
}

/// Export a computed view, replacing earlier exports of the same view.
///
/// Returns the directory written to.
pub fn export_stats(
    config: &StorageConfig,
    batch: Option<&str>,
    semester: Option<u8>,
    stats: &Stats,
) -> Result<PathBuf, StorageError> {
    JsonlWriter::for_export(config, ExportKind::Students, batch, semester)
        .write_all(&stats.students)?;
    JsonlWriter::for_export(config, ExportKind::Subjects, batch, semester)
        .write_all(&stats.subject_stats)?;
    JsonlWriter::for_export(config, ExportKind::Backlogs, batch, semester)
        .write_all(&stats.backlogs)?;

    let summary = ExportSummary {
        batch: batch.unwrap_or(ALL_BATCHES).to_string(),
        semester,
        subjects: stats.subjects.clone(),
        summary: stats.summary.clone(),
        grade_distribution: stats.grade_distribution.clone(),
        computed_at: Utc::now(),
    };
    JsonlWriter::for_export(config, ExportKind::Summary, batch, semester).write_all(&[summary])?;

    let dir = export_dir(config, batch, semester);
    info!(
        "Exported {} students and {} subjects to {:?}",
        stats.students.len(),
        stats.subject_stats.len(),
        dir
    );
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::aggregate;
    use crate::models::{BacklogEntry, StudentMetrics, StudentRecord, SubjectStat};
    use pretty_assertions::assert_eq;
    use serde::de::DeserializeOwned;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Line {
        subject: String,
        mark: f64,
    }

    fn line(subject: &str, mark: f64) -> Line {
        Line {
            subject: subject.to_string(),
            mark,
        }
    }

    fn test_config(temp_dir: &TempDir) -> StorageConfig {
        StorageConfig::new(temp_dir.path().to_path_buf())
    }

    fn read_lines<T: DeserializeOwned>(path: &Path) -> Vec<T> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn exported<T: DeserializeOwned>(config: &StorageConfig, kind: ExportKind) -> Vec<T> {
        read_lines(&export_dir(config, Some("2023-27"), Some(1)).join(kind.filename()))
    }

    #[test]
    fn test_jsonl_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("marks.jsonl");

        let lines = vec![line("MATH101", 71.5), line("PHY101", 38.0)];
        let writer: JsonlWriter<Line> = JsonlWriter::new(path.clone());
        assert_eq!(writer.write_all(&lines).unwrap(), 2);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "{\"subject\":\"MATH101\",\"mark\":71.5}\n{\"subject\":\"PHY101\",\"mark\":38.0}\n"
        );
    }

    #[test]
    fn test_write_all_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("marks.jsonl");

        let writer: JsonlWriter<Line> = JsonlWriter::new(path.clone());
        writer.write_all(&[line("A", 1.0), line("B", 2.0)]).unwrap();
        writer.write_all(&[line("C", 3.0)]).unwrap();

        assert_eq!(read_lines::<Line>(&path), vec![line("C", 3.0)]);
    }

    #[test]
    fn test_export_paths() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let writer: JsonlWriter<Line> =
            JsonlWriter::for_export(&config, ExportKind::Students, Some("2022-26"), None);
        assert_eq!(
            writer.path(),
            config.derived_dir().join("2022-26").join("students.jsonl")
        );

        assert_eq!(
            export_dir(&config, None, Some(3)),
            config.derived_dir().join("all-batches").join("semester-3")
        );
    }

    #[test]
    fn test_export_stats() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let rows = vec![
            StudentRecord::new("Kavya Iyer", "2023001", "2023-27")
                .with_mark("MATH101", 82.0)
                .with_mark("PHY101", 35.0),
            StudentRecord::new("Rohan Das", "2023002", "2023-27")
                .with_mark("MATH101", 64.0)
                .with_mark("PHY101", 58.0),
        ];
        let refs: Vec<&StudentRecord> = rows.iter().collect();
        let subjects = vec!["MATH101".to_string(), "PHY101".to_string()];
        let stats = aggregate(&refs, &subjects).unwrap();

        let dir = export_stats(&config, Some("2023-27"), Some(1), &stats).unwrap();
        assert!(dir.ends_with("2023-27/semester-1"));

        let students: Vec<StudentMetrics> = exported(&config, ExportKind::Students);
        assert_eq!(students, stats.students);

        let subject_stats: Vec<SubjectStat> = exported(&config, ExportKind::Subjects);
        assert_eq!(subject_stats.len(), 2);

        let summary: Vec<ExportSummary> = exported(&config, ExportKind::Summary);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].batch, "2023-27");
        assert_eq!(summary[0].semester, Some(1));
        assert_eq!(summary[0].summary, stats.summary);

        let backlogs: Vec<BacklogEntry> = exported(&config, ExportKind::Backlogs);
        assert_eq!(backlogs.len(), 1);
        assert_eq!(backlogs[0].roll_no, "2023001");

        // A second export of the same view replaces the files.
        export_stats(&config, Some("2023-27"), Some(1), &stats).unwrap();
        let students: Vec<StudentMetrics> = exported(&config, ExportKind::Students);
        assert_eq!(students.len(), 2);
    }
}
