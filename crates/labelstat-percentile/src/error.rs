//! Error types for labelstat-percentile

use thiserror::Error;

/// Errors that can occur while finding percentiles
#[derive(Debug, Error)]
pub enum PercentileError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] labelstat_core::Error),

    /// Label processing error
    #[error("labels error: {0}")]
    Labels(#[from] labelstat_labels::LabelsError),

    /// Percentile level outside `[0, 1]`
    #[error("invalid percentile level {level}: must be in range 0..1")]
    InvalidLevel { level: f64 },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for percentile operations
pub type PercentileResult<T> = Result<T, PercentileError>;
