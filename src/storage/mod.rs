//! Filesystem storage.
//!
//! Handles reading and writing the data directory:
//! - Subject to semester mapping (CSV)
//! - Batch mark tables, one CSV per batch or one unified CSV
//! - Exported derived metrics (JSONL)

pub mod csv;
pub mod jsonl;

pub use jsonl::*;

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::models::{MappingError, SubjectSemesterMap};
use crate::store::{RecordStore, StoreLayout};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid mapping: {0}")]
    Mapping(#[from] MappingError),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Missing column {column} in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid value {value:?} for {column} in {path}, row {row}")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
}

/// Default directory name for exported metrics.
pub const DEFAULT_EXPORT_DIR: &str = "derived";

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,

    /// Directory name under `data_dir` for exported metrics
    pub export_dir_name: String,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            export_dir_name: DEFAULT_EXPORT_DIR.to_string(),
        }
    }

    pub fn with_export_dir(mut self, name: impl Into<String>) -> Self {
        self.export_dir_name = name.into();
        self
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.data_dir.join("subjects_semester.csv")
    }

    /// Directory holding `batch_*.csv` files.
    pub fn batches_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    pub fn unified_path(&self) -> PathBuf {
        self.data_dir.join("students.csv")
    }

    pub fn derived_dir(&self) -> PathBuf {
        self.data_dir.join(&self.export_dir_name)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Load the subject mapping.
pub fn load_mapping(config: &StorageConfig) -> Result<SubjectSemesterMap, StorageError> {
    let path = config.mapping_path();
    if !path.exists() {
        return Err(StorageError::PathNotFound(path));
    }
    csv::read_mapping(&path)
}

/// Load every record in the given layout.
pub fn load_store(config: &StorageConfig, layout: StoreLayout) -> Result<RecordStore, StorageError> {
    let store = match layout {
        StoreLayout::PerBatch => {
            RecordStore::from_batches(csv::read_batch_dir(&config.batches_dir())?)
        }
        StoreLayout::Unified => {
            let path = config.unified_path();
            if !path.exists() {
                return Err(StorageError::PathNotFound(path));
            }
            csv::read_unified(&path)?
        }
    };

    info!(
        "Loaded {} students across {} batches",
        store.len(),
        store.labels().len()
    );
    Ok(store)
}

/// Write the store back in the given layout, replacing existing files.
pub fn save_store(
    config: &StorageConfig,
    layout: StoreLayout,
    store: &RecordStore,
) -> Result<(), StorageError> {
    match layout {
        StoreLayout::PerBatch => {
            for batch in store.batches() {
                csv::write_batch(&config.batches_dir(), batch)?;
            }
        }
        StoreLayout::Unified => {
            csv::write_unified(&config.unified_path(), store)?;
        }
    }
    Ok(())
}
