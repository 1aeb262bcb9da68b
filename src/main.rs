use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cohort_dashboard::calculate::{
    add_student, aggregate, batch_overview, enrolment_subjects, search, select,
    semester_comparison, student_metrics, NewStudent,
};
use cohort_dashboard::config::AppConfig;
use cohort_dashboard::generate::{self, DEFAULT_SEED};
use cohort_dashboard::models::{SubjectSemesterMap, MAX_SEMESTER};
use cohort_dashboard::parse_mark_assignment;
use cohort_dashboard::report;
use cohort_dashboard::storage::{self, export_stats, StorageConfig};
use cohort_dashboard::store::{RecordStore, StoreLayout};

#[derive(Parser)]
#[command(name = "cohort-dashboard")]
#[command(about = "Batch-wise academic records, statistics and reports")]
#[command(version)]
struct Cli {
    /// Path to configuration file (optional)
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Table layout (overrides the config file)
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    /// One batch_<label>.csv per batch
    PerBatch,
    /// One students.csv with a Batch column
    Unified,
}

impl From<LayoutArg> for StoreLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::PerBatch => StoreLayout::PerBatch,
            LayoutArg::Unified => StoreLayout::Unified,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List batches with student counts and semesters completed
    Batches,

    /// Show student records
    View {
        /// Batch label (e.g. 2022-26); all batches when omitted
        #[arg(long)]
        batch: Option<String>,

        /// Only this semester's subjects
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=MAX_SEMESTER as i64))]
        semester: Option<u8>,
    },

    /// Statistics report for a batch
    Stats {
        /// Batch label; all batches when omitted
        #[arg(long)]
        batch: Option<String>,

        /// Only this semester's subjects
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=MAX_SEMESTER as i64))]
        semester: Option<u8>,

        /// Rows in the top performers table (defaults to report.top_n)
        #[arg(long)]
        top: Option<usize>,

        /// Also write the results as JSONL under the export directory
        #[arg(long)]
        export: bool,
    },

    /// Semester-wise averages for a batch
    Compare {
        #[arg(long)]
        batch: String,
    },

    /// Find students by name or roll number across all batches
    Search {
        /// Case-insensitive substring
        term: String,
    },

    /// Add a student to a batch
    AddStudent {
        #[arg(long)]
        batch: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        roll_no: String,

        /// Semester the student is currently in
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=MAX_SEMESTER as i64))]
        semester_reached: Option<u8>,

        /// Mark as SUBJECT=MARK; repeat for each subject
        #[arg(long = "mark", value_parser = parse_mark_assignment)]
        marks: Vec<(String, f64)>,

        /// Require marks for every subject of this semester
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=MAX_SEMESTER as i64))]
        semester: Option<u8>,

        /// Placeholder subjects when the semester has no mapped subjects
        #[arg(long, default_value_t = 5)]
        adhoc: usize,
    },

    /// Write a synthetic dataset into the data directory
    Generate {
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        AppConfig::from_file(&cli.config)
            .with_context(|| format!("Failed to load config {}", cli.config.display()))?
    } else {
        AppConfig::default()
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(layout) = cli.layout {
        config.layout = layout.into();
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    config.validate()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Starting cohort-dashboard v{}", env!("CARGO_PKG_VERSION"));

    let storage = config.storage();
    let layout = config.layout;

    match cli.command {
        Commands::Batches => {
            let (mapping, store) = load(&storage, layout)?;
            print!("{}", report::overview(&batch_overview(&store, &mapping)));
        }

        Commands::View { batch, semester } => {
            let (mapping, store) = load(&storage, layout)?;
            let subset = select(&store, &mapping, batch.as_deref(), semester)?;

            // Rows missing a mark still display, without derived columns.
            let metrics = if subset.subjects.is_empty() {
                None
            } else {
                match student_metrics(&subset.rows, &subset.subjects) {
                    Ok(metrics) => Some(metrics),
                    Err(e) => {
                        tracing::warn!("Skipping totals: {}", e);
                        None
                    }
                }
            };

            print!("{}", report::student_table(&subset, metrics.as_deref()));
        }

        Commands::Stats {
            batch,
            semester,
            top,
            export,
        } => {
            let (mapping, store) = load(&storage, layout)?;
            let subset = select(&store, &mapping, batch.as_deref(), semester)?;
            let stats = aggregate(&subset.rows, subset.require_subjects()?)?
                .with_semesters(|s| mapping.semester_of(s));

            let top_n = top.unwrap_or(config.report.top_n);
            print!(
                "{}",
                report::stats_report(batch.as_deref(), semester, &stats, top_n)
            );

            if export {
                let dir = export_stats(&storage, batch.as_deref(), semester, &stats)?;
                println!("Exported results to {}", dir.display());
            }
        }

        Commands::Compare { batch } => {
            let (mapping, store) = load(&storage, layout)?;
            let summaries = semester_comparison(&store, &mapping, &batch)?;
            print!("{}", report::semester_comparison(&batch, &summaries));
        }

        Commands::Search { term } => {
            let (_, store) = load(&storage, layout)?;
            print!("{}", report::search_results(&term, &search(&store, &term)));
        }

        Commands::AddStudent {
            batch,
            name,
            roll_no,
            semester_reached,
            marks,
            semester,
            adhoc,
        } => {
            let (mapping, mut store) = load(&storage, layout)?;
            let marks: std::collections::BTreeMap<String, f64> = marks.into_iter().collect();

            if let Some(semester) = semester {
                let missing: Vec<String> = enrolment_subjects(&mapping, semester, adhoc)
                    .into_iter()
                    .filter(|s| !marks.contains_key(s))
                    .collect();
                if !missing.is_empty() {
                    bail!(
                        "Missing marks for Semester {}: {}",
                        semester,
                        missing.join(", ")
                    );
                }
            }

            let admission = add_student(
                &mut store,
                &mapping,
                NewStudent {
                    batch,
                    name,
                    roll_no,
                    semester_reached,
                    marks,
                },
            )?;

            storage::save_store(&storage, layout, &store).context("Failed to save records")?;

            println!(
                "Student {} ({}) added to batch {}",
                admission.record.name, admission.record.roll_no, admission.record.batch
            );
            println!(
                "This batch has completed up to Semester {}",
                admission.max_semester_completed
            );
        }

        Commands::Generate { seed } => {
            let dataset = generate::generate(seed)?;

            storage::csv::write_mapping(&storage.mapping_path(), &dataset.mapping)
                .context("Failed to write subject mapping")?;
            storage::save_store(&storage, layout, &dataset.store)
                .context("Failed to write batch tables")?;

            println!("\n=== Dataset Generated ===");
            println!("Data directory:   {}", storage.data_dir.display());
            println!("Subjects:         {}", dataset.mapping.len());
            for batch in dataset.store.batches() {
                println!(
                    "Batch {}:    {} students, {} subjects",
                    batch.label(),
                    batch.len(),
                    batch.columns().len()
                );
            }
        }
    }

    Ok(())
}

fn load(storage: &StorageConfig, layout: StoreLayout) -> Result<(SubjectSemesterMap, RecordStore)> {
    let mapping = storage::load_mapping(storage).with_context(|| {
        format!(
            "Failed to load subject mapping from {}",
            storage.mapping_path().display()
        )
    })?;
    let store = storage::load_store(storage, layout).context("Failed to load batch records")?;

    if store.labels().is_empty() {
        tracing::warn!(
            "No batch data found in {}; run `generate` first",
            storage.data_dir.display()
        );
    }

    Ok((mapping, store))
}
