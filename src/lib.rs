//! # Cohort Dashboard
//!
//! Academic records and reporting for a multi-batch degree programme.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (records, mapping, grades, statistics)
//! - **store**: In-memory record store sharded by batch
//! - **calculate**: Filtering, statistics, search and admission
//! - **storage**: CSV tables and JSONL exports on the filesystem
//! - **report**: Plain-text rendering of computed results
//! - **generate**: Reproducible synthetic dataset
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod generate;
pub mod models;
pub mod report;
pub mod storage;
pub mod store;

pub use models::*;

/// Parse a `SUBJECT=MARK` assignment (e.g. "MATH101=78.5").
///
/// Only the syntax is checked here; mark ranges are validated on admission.
pub fn parse_mark_assignment(s: &str) -> Result<(String, f64), String> {
    let (subject, mark) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SUBJECT=MARK, got {:?}", s))?;

    let subject = subject.trim();
    if subject.is_empty() {
        return Err(format!("missing subject in {:?}", s));
    }

    let mark: f64 = mark
        .trim()
        .parse()
        .map_err(|_| format!("invalid mark {:?} for {}", mark.trim(), subject))?;

    Ok((subject.to_string(), mark))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mark_assignment() {
        assert_eq!(
            parse_mark_assignment("MATH101=78.5"),
            Ok(("MATH101".to_string(), 78.5))
        );
    }

    #[test]
    fn test_parse_mark_assignment_trims() {
        assert_eq!(
            parse_mark_assignment(" CS101 = 40 "),
            Ok(("CS101".to_string(), 40.0))
        );
    }

    #[test]
    fn test_parse_mark_assignment_keeps_out_of_range() {
        assert_eq!(
            parse_mark_assignment("PHY101=100.01"),
            Ok(("PHY101".to_string(), 100.01))
        );
    }

    #[test]
    fn test_parse_mark_assignment_missing_separator() {
        assert!(parse_mark_assignment("MATH101").is_err());
    }

    #[test]
    fn test_parse_mark_assignment_missing_subject() {
        assert!(parse_mark_assignment("=50").is_err());
    }

    #[test]
    fn test_parse_mark_assignment_invalid_mark() {
        assert!(parse_mark_assignment("MATH101=abc").is_err());
        assert!(parse_mark_assignment("MATH101=").is_err());
    }
}
