//! Reproducible synthetic dataset.
//!
//! Builds the standard 40-subject mapping and four batches at different
//! stages of the programme. Each student draws one base performance and
//! every mark varies around it, drifting down slightly in later semesters.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::models::{round2, MappingError, StudentRecord, SubjectInfo, SubjectSemesterMap};
use crate::store::{Batch, RecordStore};

pub const DEFAULT_SEED: u64 = 42;

const BASE_MEAN: f64 = 70.0;
const BASE_STD_DEV: f64 = 12.0;
const MARK_STD_DEV: f64 = 10.0;
const SEMESTER_PENALTY: f64 = 0.5;

/// Subjects of the standard programme, by semester.
const SUBJECTS: [(&str, u8); 40] = [
    ("MATH101", 1),
    ("PHY101", 1),
    ("CHEM101", 1),
    ("ENG101", 1),
    ("CS101", 1),
    ("MATH102", 2),
    ("PHY102", 2),
    ("EE101", 2),
    ("ME101", 2),
    ("CS102", 2),
    ("MATH201", 3),
    ("CS201", 3),
    ("CS202", 3),
    ("CS203", 3),
    ("CS204", 3),
    ("MATH202", 4),
    ("CS205", 4),
    ("CS206", 4),
    ("CS207", 4),
    ("CS208", 4),
    ("MGT101", 4),
    ("CS301", 5),
    ("CS302", 5),
    ("CS303", 5),
    ("CS304", 5),
    ("CS305", 5),
    ("CS306", 6),
    ("CS307", 6),
    ("CS308", 6),
    ("CS309", 6),
    ("CS310", 6),
    ("CS401", 7),
    ("CS402", 7),
    ("CS403", 7),
    ("CS404", 7),
    ("CS405", 7),
    ("CS406", 8),
    ("CS407", 8),
    ("CS408", 8),
    ("MGT201", 8),
];

const FIRST_NAMES: [&str; 60] = [
    "Aarav", "Vivaan", "Aditya", "Arjun", "Sai", "Arnav", "Ayaan", "Krishna", "Ishaan", "Reyansh",
    "Ananya", "Diya", "Aadhya", "Saanvi", "Pari", "Avni", "Sara", "Myra", "Anika", "Riya",
    "Rohan", "Karan", "Rahul", "Amit", "Priya", "Neha", "Pooja", "Sneha", "Vikram", "Rajesh",
    "Shreya", "Ishita", "Kavya", "Nidhi", "Tanvi", "Aryan", "Dev", "Harsh", "Kunal", "Nikhil",
    "Aditi", "Divya", "Gargi", "Jiya", "Kiara", "Lakshmi", "Meera", "Naina", "Ojas", "Pranav",
    "Manish", "Suresh", "Deepak", "Ramesh", "Sandeep", "Anjali", "Shalini", "Preeti", "Sunita",
    "Rekha",
];

const LAST_NAMES: [&str; 30] = [
    "Sharma", "Verma", "Kumar", "Singh", "Patel", "Reddy", "Nair", "Iyer", "Joshi", "Desai",
    "Gupta", "Agarwal", "Mehta", "Shah", "Kulkarni", "Rao", "Pillai", "Menon", "Das", "Roy",
    "Banerjee", "Mukherjee", "Chatterjee", "Jain", "Sinha", "Mishra", "Tiwari", "Pandey", "Yadav",
    "Chauhan",
];

/// One batch to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub label: &'static str,
    pub students: usize,

    /// Highest semester completed
    pub semesters: u8,
}

/// The four cohorts of the standard dataset, final year first.
pub const BATCH_PLANS: [BatchPlan; 4] = [
    BatchPlan {
        label: "2021-25",
        students: 60,
        semesters: 8,
    },
    BatchPlan {
        label: "2022-26",
        students: 65,
        semesters: 6,
    },
    BatchPlan {
        label: "2023-27",
        students: 70,
        semesters: 4,
    },
    BatchPlan {
        label: "2024-28",
        students: 75,
        semesters: 2,
    },
];

/// A generated mapping and its batches.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub mapping: SubjectSemesterMap,
    pub store: RecordStore,
}

/// The standard subject to semester mapping.
pub fn default_mapping() -> Result<SubjectSemesterMap, MappingError> {
    SubjectSemesterMap::new(
        SUBJECTS
            .iter()
            .map(|&(subject, semester)| SubjectInfo::new(subject, semester))
            .collect(),
    )
}

/// Generate the standard dataset. Equal seeds give equal datasets.
pub fn generate(seed: u64) -> Result<Dataset, MappingError> {
    generate_with(seed, &BATCH_PLANS)
}

/// Generate a dataset for the given batch plans.
pub fn generate_with(seed: u64, plans: &[BatchPlan]) -> Result<Dataset, MappingError> {
    let mapping = default_mapping()?;
    let mut rng = StdRng::seed_from_u64(seed);

    let batches: Vec<Batch> = plans
        .iter()
        .map(|plan| generate_batch(&mut rng, &mapping, plan))
        .collect();

    for batch in &batches {
        info!(
            "Generated batch {}: {} students, {} subjects",
            batch.label(),
            batch.len(),
            batch.columns().len()
        );
    }

    Ok(Dataset {
        mapping,
        store: RecordStore::from_batches(batches),
    })
}

fn generate_batch<R: Rng>(rng: &mut R, mapping: &SubjectSemesterMap, plan: &BatchPlan) -> Batch {
    let subjects: Vec<(String, u8)> = (1..=plan.semesters)
        .flat_map(|semester| {
            mapping
                .subjects_for(semester)
                .into_iter()
                .map(move |s| (s.to_string(), semester))
        })
        .collect();

    let year = plan.label.split('-').next().unwrap_or(plan.label);
    let mut batch = Batch::new(
        plan.label,
        subjects.iter().map(|(s, _)| s.clone()).collect(),
    );

    // Capped so the unique-name loop always terminates.
    let count = plan.students.min(FIRST_NAMES.len() * LAST_NAMES.len());
    let mut used_names = HashSet::with_capacity(count);

    for index in 1..=count {
        let name = loop {
            let name = format!(
                "{} {}",
                FIRST_NAMES[rng.random_range(0..FIRST_NAMES.len())],
                LAST_NAMES[rng.random_range(0..LAST_NAMES.len())]
            );
            if used_names.insert(name.clone()) {
                break name;
            }
        };

        let base = normal(rng, BASE_MEAN, BASE_STD_DEV);
        let mut record = StudentRecord::new(name, format!("{}{:03}", year, index), plan.label);
        for (subject, semester) in &subjects {
            let mark = base + normal(rng, 0.0, MARK_STD_DEV) - f64::from(*semester) * SEMESTER_PENALTY;
            record.marks.insert(subject.clone(), round2(mark.clamp(0.0, 100.0)));
        }

        batch.push(record);
    }

    batch
}

/// Normal sample via the Box-Muller transform.
fn normal<R: Rng>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}
