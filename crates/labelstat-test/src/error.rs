//! Error types for the test helpers

use thiserror::Error;

/// Errors that can occur while preparing regression tests
#[derive(Debug, Error)]
pub enum TestError {
    /// Invalid generator parameters
    #[error("invalid generator parameter: {0}")]
    InvalidParameter(String),

    /// Value comparison failed
    #[error(
        "value comparison failed at index {index}: expected {expected}, got {actual}, delta {delta}"
    )]
    ValueMismatch {
        index: usize,
        expected: f64,
        actual: f64,
        delta: f64,
    },
}

/// Result type for test helpers
pub type TestResult<T> = Result<T, TestError>;
