//! Plain-text rendering of computed results.
//!
//! Every function here is pure: it takes results from [`crate::calculate`]
//! and returns the text to print.

use std::fmt::Write;

use crate::calculate::{student_metrics, top, RecordSubset, SearchHit, ALL_BATCHES};
use crate::models::{
    round2, BatchOverview, RankKey, SemesterSummary, Stats, StudentMetrics, StudentRecord,
    NAME_COLUMN, PASS_MARK, ROLL_NO_COLUMN,
};

const WIDE_RULE: usize = 100;
const REPORT_RULE: usize = 90;
const NARROW_RULE: usize = 70;
const BAR_WIDTH: f64 = 50.0;

/// Batch list with student counts, semesters completed and subject counts.
pub fn overview(batches: &[BatchOverview]) -> String {
    let mut output = String::new();
    heading(&mut output, "AVAILABLE BATCHES", NARROW_RULE);

    if batches.is_empty() {
        let _ = writeln!(output, "No batches loaded.");
        return output;
    }

    for batch in batches {
        let _ = writeln!(output);
        let _ = writeln!(output, "Batch: {}", batch.batch);
        let _ = writeln!(output, "  Students: {}", batch.student_count);
        let _ = writeln!(output, "  Semesters Completed: {}", batch.semesters_completed);
        let _ = writeln!(output, "  Total Subjects: {}", batch.subject_count);
    }

    output
}

/// Student rows of a subset with their marks.
///
/// When `metrics` is given (one entry per row, in row order), Total,
/// Percentage and Grade columns are appended.
pub fn student_table(subset: &RecordSubset<'_>, metrics: Option<&[StudentMetrics]>) -> String {
    let mut output = String::new();
    let label = subset.batch.as_deref().unwrap_or(ALL_BATCHES);
    let _ = writeln!(output, "{}", "=".repeat(WIDE_RULE));
    let _ = writeln!(output, "STUDENT RECORDS - BATCH {}", label);
    if let Some(semester) = subset.semester {
        let _ = writeln!(output, "Semester: {}", semester);
    }
    let _ = writeln!(output, "{}", "=".repeat(WIDE_RULE));

    if subset.is_empty() {
        let _ = writeln!(output, "No students found.");
        let _ = writeln!(output, "{}", "=".repeat(WIDE_RULE));
        return output;
    }

    let mut headers: Vec<String> = vec![NAME_COLUMN.to_string(), ROLL_NO_COLUMN.to_string()];
    headers.extend(subset.subjects.iter().cloned());
    if metrics.is_some() {
        headers.extend(["Total", "Percentage", "Grade"].map(String::from));
    }

    let rows: Vec<Vec<String>> = subset
        .rows
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let mut row = identity_cells(record);
            row.extend(
                subset
                    .subjects
                    .iter()
                    .map(|subject| record.mark(subject).map_or_else(|| "-".to_string(), format_mark)),
            );
            if let Some(student) = metrics.and_then(|m| m.get(index)) {
                row.push(format_mark(student.total));
                row.push(format!("{:.2}", student.display_percentage()));
                row.push(student.grade.to_string());
            }
            row
        })
        .collect();

    output.push_str(&table(&headers, &rows));
    let _ = writeln!(output, "{}", "=".repeat(WIDE_RULE));
    output
}

/// Full statistics report: subjects, overall figures, grade distribution,
/// top performers and backlogs.
pub fn stats_report(
    batch: Option<&str>,
    semester: Option<u8>,
    stats: &Stats,
    top_n: usize,
) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", "=".repeat(REPORT_RULE));
    let _ = writeln!(
        output,
        "STATISTICS REPORT - BATCH {}",
        batch.unwrap_or(ALL_BATCHES)
    );
    if let Some(semester) = semester {
        let _ = writeln!(output, "Semester: {}", semester);
    }
    let _ = writeln!(output, "{}", "=".repeat(REPORT_RULE));

    section(&mut output, "1. SUBJECT-WISE PERFORMANCE");
    let headers = ["Subject", "Sem", "Average", "Highest", "Lowest", "Std Dev", "Pass %"]
        .map(String::from);
    let rows: Vec<Vec<String>> = stats
        .subject_stats
        .iter()
        .map(|s| {
            vec![
                s.subject.clone(),
                s.semester.map_or_else(|| "N/A".to_string(), |n| n.to_string()),
                format!("{:.2}", s.mean),
                format_mark(s.max),
                format_mark(s.min),
                format_std_dev(s.std_dev),
                format!("{:.2}", s.pass_rate),
            ]
        })
        .collect();
    output.push_str(&table(&headers, &rows));

    section(&mut output, "2. OVERALL PERFORMANCE");
    let summary = &stats.summary;
    let _ = writeln!(output, "Total Students: {}", summary.student_count);
    let _ = writeln!(output, "Subjects Considered: {}", summary.subject_count);
    let _ = writeln!(output, "Class Average: {:.2}%", summary.mean);
    let _ = writeln!(output, "Highest: {:.2}%", summary.max);
    let _ = writeln!(output, "Lowest: {:.2}%", summary.min);
    let _ = writeln!(output, "Standard Deviation: {}", format_std_dev(summary.std_dev));

    section(&mut output, "3. GRADE DISTRIBUTION");
    let total = summary.student_count.max(1) as f64;
    for entry in &stats.grade_distribution {
        let share = entry.count as f64 / total;
        let bar = "█".repeat((share * BAR_WIDTH) as usize);
        let _ = writeln!(
            output,
            "{}: {:3} students ({:5.1}%) {}",
            entry.grade.as_str(),
            entry.count,
            share * 100.0,
            bar
        );
    }

    section(&mut output, &format!("4. TOP {} PERFORMERS", top_n));
    let headers = [NAME_COLUMN, ROLL_NO_COLUMN, "Total", "Percentage", "Grade"].map(String::from);
    let rows: Vec<Vec<String>> = top(&stats.students, top_n, RankKey::Percentage)
        .into_iter()
        .map(|s| {
            vec![
                s.name.clone(),
                s.roll_no.clone(),
                format_mark(s.total),
                format!("{:.2}", s.display_percentage()),
                s.grade.to_string(),
            ]
        })
        .collect();
    output.push_str(&table(&headers, &rows));

    section(&mut output, "5. BACKLOG ANALYSIS");
    let with_backlogs = stats.backlogs.len();
    let without = summary.student_count.saturating_sub(with_backlogs);
    let _ = writeln!(
        output,
        "Students with No Backlogs: {} ({:.1}%)",
        without,
        without as f64 / total * 100.0
    );
    let _ = writeln!(
        output,
        "Students with Backlogs: {} ({:.1}%)",
        with_backlogs,
        with_backlogs as f64 / total * 100.0
    );

    if !stats.backlogs.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Students with Backlogs (Marks < {}):", PASS_MARK);
        for entry in &stats.backlogs {
            let details: Vec<String> = entry
                .failed
                .iter()
                .map(|f| format!("{} ({:.1})", f.subject, f.mark))
                .collect();
            let _ = writeln!(
                output,
                "  • {} ({}): {}",
                entry.name,
                entry.roll_no,
                details.join(", ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "{}", "=".repeat(REPORT_RULE));
    output
}

/// Per-semester averages for one batch.
pub fn semester_comparison(batch: &str, summaries: &[SemesterSummary]) -> String {
    let mut output = String::new();
    heading(
        &mut output,
        &format!("SEMESTER-WISE COMPARISON - BATCH {}", batch),
        NARROW_RULE,
    );

    if summaries.is_empty() {
        let _ = writeln!(output, "No semester data available.");
        return output;
    }

    for summary in summaries {
        let _ = writeln!(output);
        let _ = writeln!(output, "Semester {}:", summary.semester);
        let _ = writeln!(output, "  Subjects: {}", summary.subject_count);
        let _ = writeln!(output, "  Average: {:.2}", summary.average);
        let _ = writeln!(output, "  Subject List: {}", summary.subjects.join(", "));
    }

    output
}

/// Search results grouped by batch.
///
/// Marks follow the batch's column order. Total, Percentage and Grade are
/// shown when every match has a mark for each column.
pub fn search_results(term: &str, hits: &[SearchHit<'_>]) -> String {
    let mut output = String::new();

    if hits.is_empty() {
        let _ = writeln!(output, "No student found matching '{}'", term.trim());
        return output;
    }

    for hit in hits {
        let _ = writeln!(output, "--- Found in Batch {} ---", hit.batch);

        let metrics = student_metrics(&hit.rows, &hit.subjects).ok();
        let mut headers = vec![NAME_COLUMN.to_string(), ROLL_NO_COLUMN.to_string()];
        headers.extend(hit.subjects.iter().cloned());
        if metrics.is_some() {
            headers.extend(["Total", "Percentage", "Grade"].map(String::from));
        }

        let rows: Vec<Vec<String>> = hit
            .rows
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let mut row = identity_cells(record);
                row.extend(
                    hit.subjects
                        .iter()
                        .map(|s| record.mark(s).map_or_else(|| "-".to_string(), format_mark)),
                );
                if let Some(student) = metrics.as_ref().and_then(|m| m.get(index)) {
                    row.push(format_mark(student.total));
                    row.push(format!("{:.2}", student.display_percentage()));
                    row.push(student.grade.to_string());
                }
                row
            })
            .collect();

        output.push_str(&table(&headers, &rows));
        let _ = writeln!(output);
    }

    output
}

fn identity_cells(record: &StudentRecord) -> Vec<String> {
    vec![
        record.known_name().unwrap_or("-").to_string(),
        record.known_roll_no().unwrap_or("-").to_string(),
    ]
}

fn heading(output: &mut String, title: &str, width: usize) {
    let _ = writeln!(output, "{}", "=".repeat(width));
    let _ = writeln!(output, "{}", title);
    let _ = writeln!(output, "{}", "=".repeat(width));
}

fn section(output: &mut String, title: &str) {
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", title);
    let _ = writeln!(output, "{}", "-".repeat(REPORT_RULE));
}

/// Marks print without trailing zeros: 64, 70.5, 33.25.
fn format_mark(mark: f64) -> String {
    round2(mark).to_string()
}

fn format_std_dev(std_dev: Option<f64>) -> String {
    std_dev.map_or_else(|| "N/A".to_string(), |sd| format!("{:.2}", sd))
}

/// Left-aligned columns padded to the widest cell.
fn table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let render = |output: &mut String, cells: &[String]| {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
            .collect();
        let _ = writeln!(output, "{}", line.join("  ").trim_end());
    };

    render(&mut output, headers);
    for row in rows {
        render(&mut output, row.as_slice());
    }
    output
}
