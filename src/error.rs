use thiserror::Error;

/// Fatal failures of an analysis entry point.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Dataset is empty ({rows} row(s) x {columns} column(s)); nothing to profile")]
    EmptyDataset { rows: usize, columns: usize },
}

/// Failure while profiling a single column. Never fatal to the batch: the
/// profiler downgrades the column to `Unknown` and tags it `PROFILE_ERROR`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Column '{column}' holds {actual} value(s) but the dataset has {expected} row(s)")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// Malformed domain-pattern library. Raised before any analysis runs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatternConfigError {
    #[error("Domain pattern library declares no patterns")]
    NoPatterns,
    #[error("Domain pattern at position {index} has an empty name")]
    EmptyName { index: usize },
    #[error("Domain pattern '{name}' is declared more than once")]
    DuplicateName { name: String },
    #[error("Domain pattern '{name}' has non-positive weight {weight}")]
    NonPositiveWeight { name: String, weight: f64 },
    #[error("Domain pattern '{name}' declares no keywords")]
    EmptyKeywords { name: String },
    #[error("Match threshold '{field}' must be a finite, non-negative number (got {value})")]
    InvalidThreshold { field: &'static str, value: f64 },
}
