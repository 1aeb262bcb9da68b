//! Aggregate statistics over a filtered subset.

use tracing::debug;

use super::{calculate_pass_rate, calculate_percentage, ValidationError};
use crate::models::{
    BacklogEntry, ClassSummary, FailedSubject, Grade, GradeCount, RankKey, Stats,
    StudentMetrics, StudentRecord, SubjectStat, PASS_MARK,
};

/// Compute every statistic for `rows` over `subjects`.
///
/// Requires at least one subject and one row, and every row to carry a
/// mark for every subject. Standard deviations use the sample (N-1)
/// denominator and are `None` for a single row.
pub fn aggregate(rows: &[&StudentRecord], subjects: &[String]) -> Result<Stats, ValidationError> {
    if subjects.is_empty() {
        return Err(ValidationError::NoApplicableSubjects);
    }
    if rows.is_empty() {
        return Err(ValidationError::NoRecords);
    }

    let matrix = mark_matrix(rows, subjects)?;

    let subject_stats = subjects
        .iter()
        .enumerate()
        .map(|(col, subject)| {
            let marks: Vec<f64> = matrix.iter().map(|row| row[col]).collect();
            let passed = marks.iter().filter(|&&m| m >= PASS_MARK).count();
            SubjectStat {
                subject: subject.clone(),
                semester: None,
                mean: mean(&marks),
                max: max(&marks),
                min: min(&marks),
                std_dev: sample_std_dev(&marks),
                pass_rate: calculate_pass_rate(passed, marks.len()),
            }
        })
        .collect();

    let students: Vec<StudentMetrics> = rows
        .iter()
        .zip(&matrix)
        .map(|(record, marks)| metrics_for(record, marks))
        .collect();

    let backlogs: Vec<BacklogEntry> = rows
        .iter()
        .zip(&matrix)
        .filter_map(|(record, marks)| backlog_for(record, subjects, marks))
        .collect();

    let percentages: Vec<f64> = students.iter().map(|s| s.percentage).collect();
    let summary = ClassSummary {
        student_count: rows.len(),
        subject_count: subjects.len(),
        mean: mean(&percentages),
        max: max(&percentages),
        min: min(&percentages),
        std_dev: sample_std_dev(&percentages),
        pass_rate: calculate_pass_rate(rows.len() - backlogs.len(), rows.len()),
    };

    let grade_distribution = grade_distribution(&students);

    debug!(
        "Aggregated {} students over {} subjects ({} with backlogs)",
        rows.len(),
        subjects.len(),
        backlogs.len()
    );

    Ok(Stats {
        subjects: subjects.to_vec(),
        subject_stats,
        students,
        summary,
        grade_distribution,
        backlogs,
    })
}

/// Per-student total, percentage and grade over `subjects`.
pub fn student_metrics(
    rows: &[&StudentRecord],
    subjects: &[String],
) -> Result<Vec<StudentMetrics>, ValidationError> {
    if subjects.is_empty() {
        return Err(ValidationError::NoApplicableSubjects);
    }

    let matrix = mark_matrix(rows, subjects)?;
    Ok(rows
        .iter()
        .zip(&matrix)
        .map(|(record, marks)| metrics_for(record, marks))
        .collect())
}

/// Count students per grade. Every grade is listed, best first.
pub fn grade_distribution(students: &[StudentMetrics]) -> Vec<GradeCount> {
    let mut counts = [0usize; Grade::ALL.len()];
    for student in students {
        counts[student.grade.rank()] += 1;
    }

    Grade::ALL
        .iter()
        .map(|&grade| GradeCount {
            grade,
            count: counts[grade.rank()],
        })
        .collect()
}

/// Highest `n` students by `key`, descending. Ties keep row order.
pub fn top(students: &[StudentMetrics], n: usize, key: RankKey) -> Vec<&StudentMetrics> {
    let value = |s: &StudentMetrics| match key {
        RankKey::Percentage => s.percentage,
        RankKey::Total => s.total,
    };

    let mut ranked: Vec<&StudentMetrics> = students.iter().collect();
    ranked.sort_by(|a, b| value(*b).total_cmp(&value(*a)));
    ranked.truncate(n);
    ranked
}

fn mark_matrix(rows: &[&StudentRecord], subjects: &[String]) -> Result<Vec<Vec<f64>>, ValidationError> {
    rows.iter()
        .map(|record| {
            subjects
                .iter()
                .map(|subject| {
                    record
                        .mark(subject)
                        .ok_or_else(|| ValidationError::MissingMarkData {
                            roll_no: record.roll_no.clone(),
                            subject: subject.clone(),
                        })
                })
                .collect()
        })
        .collect()
}

fn metrics_for(record: &StudentRecord, marks: &[f64]) -> StudentMetrics {
    let total: f64 = marks.iter().sum();
    let percentage = calculate_percentage(total, marks.len());

    StudentMetrics {
        name: record.name.clone(),
        roll_no: record.roll_no.clone(),
        batch: record.batch.clone(),
        total,
        percentage,
        grade: Grade::from_percentage(percentage),
    }
}

fn backlog_for(record: &StudentRecord, subjects: &[String], marks: &[f64]) -> Option<BacklogEntry> {
    let failed: Vec<FailedSubject> = subjects
        .iter()
        .zip(marks)
        .filter(|&(_, &mark)| mark < PASS_MARK)
        .map(|(subject, &mark)| FailedSubject {
            subject: subject.clone(),
            mark,
        })
        .collect();

    if failed.is_empty() {
        None
    } else {
        Some(BacklogEntry {
            name: record.name.clone(),
            roll_no: record.roll_no.clone(),
            batch: record.batch.clone(),
            failed,
        })
    }
}

/// Arithmetic mean; 0.0 for no values.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Sample standard deviation (N-1); undefined below two values.
pub(crate) fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}
