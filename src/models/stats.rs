//! Derived statistics models.

use serde::{Deserialize, Serialize};

use super::Grade;

/// Round to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-subject statistics over a set of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStat {
    /// Subject identifier
    pub subject: String,

    /// Semester, when the subject is mapped
    pub semester: Option<u8>,

    pub mean: f64,
    pub max: f64,
    pub min: f64,

    /// Sample standard deviation; `None` with fewer than two rows
    pub std_dev: Option<f64>,

    /// Share of rows with a passing mark (0 to 100)
    pub pass_rate: f64,
}

/// Derived metrics for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentMetrics {
    pub name: String,
    pub roll_no: String,
    pub batch: String,

    /// Sum of the considered marks
    pub total: f64,

    /// Total normalised to 0-100, full precision
    pub percentage: f64,

    pub grade: Grade,
}

impl StudentMetrics {
    /// Percentage rounded for display.
    pub fn display_percentage(&self) -> f64 {
        round2(self.percentage)
    }
}

/// Class-level summary of percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub student_count: usize,
    pub subject_count: usize,
    pub mean: f64,
    pub max: f64,
    pub min: f64,

    /// Sample standard deviation; `None` with fewer than two rows
    pub std_dev: Option<f64>,

    /// Share of students without any backlog (0 to 100)
    pub pass_rate: f64,
}

/// Number of students holding a grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCount {
    pub grade: Grade,
    pub count: usize,
}

/// A subject the student failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSubject {
    pub subject: String,
    pub mark: f64,
}

/// A student with at least one failed subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogEntry {
    pub name: String,
    pub roll_no: String,
    pub batch: String,
    pub failed: Vec<FailedSubject>,
}

/// Ranking key for top-N views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankKey {
    Percentage,
    Total,
}

/// Everything computed for one filtered view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Subjects considered, in column order
    pub subjects: Vec<String>,

    pub subject_stats: Vec<SubjectStat>,

    /// Per-student metrics, in row order
    pub students: Vec<StudentMetrics>,

    pub summary: ClassSummary,

    /// One entry per grade, best first
    pub grade_distribution: Vec<GradeCount>,

    pub backlogs: Vec<BacklogEntry>,
}

impl Stats {
    /// Get a subject's statistics.
    pub fn subject(&self, subject: &str) -> Option<&SubjectStat> {
        self.subject_stats.iter().find(|s| s.subject == subject)
    }

    /// Count of students holding a grade.
    pub fn grade_count(&self, grade: Grade) -> usize {
        self.grade_distribution
            .iter()
            .find(|g| g.grade == grade)
            .map(|g| g.count)
            .unwrap_or(0)
    }

    /// Attach semesters to subject statistics.
    pub fn with_semesters<F>(mut self, semester_of: F) -> Self
    where
        F: Fn(&str) -> Option<u8>,
    {
        for stat in &mut self.subject_stats {
            stat.semester = semester_of(&stat.subject);
        }
        self
    }
}

/// Average performance within one semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterSummary {
    pub semester: u8,
    pub subjects: Vec<String>,
    pub subject_count: usize,

    /// Mean of the per-subject means
    pub average: f64,
}

/// Headline figures for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOverview {
    pub batch: String,
    pub student_count: usize,

    /// Highest semester with data; 0 when none
    pub semesters_completed: u8,

    pub subject_count: usize,
}
