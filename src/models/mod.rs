//! Core data models for the cohort dashboard.

mod grade;
mod mapping;
mod stats;
mod student;

pub use grade::*;
pub use mapping::*;
pub use stats::*;
pub use student::*;
