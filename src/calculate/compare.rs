//! Semester-wise comparison and batch overview.

use super::aggregate::mean;
use super::{available_semesters, max_semester_completed, ValidationError};
use crate::models::{BatchOverview, SemesterSummary, SubjectSemesterMap, MAX_SEMESTER};
use crate::store::RecordStore;

/// Average performance per semester for one batch.
///
/// Each subject's mean is taken over the rows that hold a mark for it;
/// the semester average is the mean of those subject means. Semesters
/// without any of the batch's subjects are omitted.
pub fn semester_comparison(
    store: &RecordStore,
    mapping: &SubjectSemesterMap,
    batch: &str,
) -> Result<Vec<SemesterSummary>, ValidationError> {
    let batch = store
        .batch(batch)
        .ok_or_else(|| ValidationError::UnknownBatch(batch.to_string()))?;

    let mut summaries = Vec::new();
    for semester in 1..=MAX_SEMESTER {
        let subjects: Vec<String> = mapping
            .subjects_for(semester)
            .into_iter()
            .filter(|s| batch.columns().iter().any(|c| c == s))
            .map(str::to_string)
            .collect();

        if subjects.is_empty() {
            continue;
        }

        let subject_means: Vec<f64> = subjects
            .iter()
            .filter_map(|subject| {
                let marks: Vec<f64> = batch
                    .students()
                    .iter()
                    .filter_map(|s| s.mark(subject))
                    .collect();
                if marks.is_empty() {
                    None
                } else {
                    Some(mean(&marks))
                }
            })
            .collect();

        summaries.push(SemesterSummary {
            semester,
            subject_count: subjects.len(),
            subjects,
            average: mean(&subject_means),
        });
    }

    Ok(summaries)
}

/// Student count, semesters completed and subject count for every batch.
pub fn batch_overview(store: &RecordStore, mapping: &SubjectSemesterMap) -> Vec<BatchOverview> {
    store
        .batches()
        .map(|batch| {
            let available =
                available_semesters(store, mapping, Some(batch.label())).unwrap_or_default();

            BatchOverview {
                batch: batch.label().to_string(),
                student_count: batch.len(),
                semesters_completed: max_semester_completed(&available),
                subject_count: batch.columns().len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StudentRecord, SubjectInfo};
    use crate::store::Batch;
    use pretty_assertions::assert_eq;

    fn mapping() -> SubjectSemesterMap {
        SubjectSemesterMap::new(vec![
            SubjectInfo::new("MATH101", 1),
            SubjectInfo::new("PHY101", 1),
            SubjectInfo::new("MATH102", 2),
            SubjectInfo::new("CS301", 5),
        ])
        .unwrap()
    }

    fn store() -> RecordStore {
        let mut batch = Batch::new(
            "2022-26",
            vec![
                "PHY101".to_string(),
                "MATH101".to_string(),
                "MATH102".to_string(),
            ],
        );
        batch.push(
            StudentRecord::new("a", "1", "2022-26")
                .with_mark("MATH101", 80.0)
                .with_mark("PHY101", 60.0)
                .with_mark("MATH102", 50.0),
        );
        batch.push(
            StudentRecord::new("b", "2", "2022-26")
                .with_mark("MATH101", 40.0)
                .with_mark("PHY101", 40.0)
                .with_mark("MATH102", 70.0),
        );

        let empty = Batch::new("2025-29", vec!["ORIENT1".to_string()]);
        RecordStore::from_batches(vec![batch, empty])
    }

    #[test]
    fn test_semester_comparison() {
        let summaries = semester_comparison(&store(), &mapping(), "2022-26").unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].semester, 1);
        assert_eq!(summaries[0].subjects, vec!["MATH101", "PHY101"]);
        assert_eq!(summaries[0].subject_count, 2);
        // MATH101 mean 60, PHY101 mean 50
        assert!((summaries[0].average - 55.0).abs() < 1e-9);

        assert_eq!(summaries[1].semester, 2);
        assert!((summaries[1].average - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_semester_comparison_unknown_batch() {
        assert_eq!(
            semester_comparison(&store(), &mapping(), "nope").unwrap_err(),
            ValidationError::UnknownBatch("nope".to_string())
        );
    }

    #[test]
    fn test_batch_overview() {
        let overview = batch_overview(&store(), &mapping());

        assert_eq!(
            overview,
            vec![
                BatchOverview {
                    batch: "2022-26".to_string(),
                    student_count: 2,
                    semesters_completed: 2,
                    subject_count: 3,
                },
                BatchOverview {
                    batch: "2025-29".to_string(),
                    student_count: 0,
                    semesters_completed: 0,
                    subject_count: 1,
                },
            ]
        );
    }
}
