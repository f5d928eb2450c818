//! Error types for multiverse analysis
//!
//! Provides a unified error type for declaration, expansion and wiring
//! failures across the multiverse crates.

use thiserror::Error;

/// Core error type for multiverse operations
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter with this name has already been declared
    #[error("Duplicate parameter: '{0}' is already declared")]
    DuplicateParameter(String),

    /// Two options of the same parameter share a name
    #[error("Duplicate option: parameter '{parameter}' declares option '{option}' more than once")]
    DuplicateOption { parameter: String, option: String },

    /// A condition references a parameter that is undeclared, declared later,
    /// or the parameter being declared
    #[error(
        "Invalid condition reference in '{parameter}={option}': '{referenced}' {reason}"
    )]
    InvalidConditionReference {
        parameter: String,
        option: String,
        referenced: String,
        reason: String,
    },

    /// A parameter was declared without any options
    #[error("Parameter '{0}' declares no options")]
    EmptyParameter(String),

    /// A condition was evaluated before one of its parameters was assigned
    #[error("Condition references '{0}', which is not yet assigned")]
    UnresolvedCondition(String),

    /// A pipeline step names a parameter the registry does not know
    #[error("Unknown parameter: '{0}'")]
    UnknownParameter(String),

    /// A universe identifier outside the expanded set
    #[error("Unknown universe: #{0}")]
    UnknownUniverse(usize),

    /// A variant step does not cover every option of its parameter
    #[error("Step '{step}' has no variant for option '{option}' of parameter '{parameter}'")]
    MissingVariant {
        step: String,
        parameter: String,
        option: String,
    },

    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Threading or scheduling error
    #[error("Execution error: {0}")]
    Execution(String),

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for a condition pointing at a missing or later parameter
    pub fn condition_reference(
        parameter: &str,
        option: &str,
        referenced: &str,
        reason: &str,
    ) -> Self {
        Self::InvalidConditionReference {
            parameter: parameter.to_string(),
            option: option.to_string(),
            referenced: referenced.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an error for an invalid cumulative probability
    pub fn invalid_probability(p: f64) -> Self {
        Self::InvalidParameter(format!("Probability {p} must lie strictly inside (0, 1)"))
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::Computation(format!("{context} contains NaN or infinite values"))
    }
}
