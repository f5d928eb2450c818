//! Error types for artifact export

use thiserror::Error;

/// Errors raised while building or writing an artifact.
///
/// Every variant is fatal for the export call that raised it and leaves no
/// file behind.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A term lacks a required value
    #[error("Universe #{universe}, term '{term}': missing field '{field}'")]
    MissingField {
        universe: usize,
        term: String,
        field: &'static str,
    },

    /// `cdf.x` and `cdf.y` differ in length
    #[error("Universe #{universe}, term '{term}': cdf.x has {x_len} points but cdf.y has {y_len}")]
    LengthMismatch {
        universe: usize,
        term: String,
        x_len: usize,
        y_len: usize,
    },

    /// A CDF sample violates monotonicity or range constraints
    #[error("Universe #{universe}, term '{term}': invalid CDF: {reason}")]
    InvalidCdf {
        universe: usize,
        term: String,
        reason: String,
    },

    /// Dataset columns differ in length
    #[error("Ragged dataset: column '{column}' has {actual} values, expected {expected}")]
    RaggedDataset {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A float cell holds NaN or an infinity, which JSON cannot represent
    #[error("Column '{column}', row {row}: non-finite value {value}")]
    NonFiniteValue {
        column: String,
        row: usize,
        value: f64,
    },

    #[error(transparent)]
    Core(#[from] multiverse_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;
