//! Error types for labelstat-measure

use thiserror::Error;

/// Errors that can occur while measuring labelled objects
#[derive(Debug, Error)]
pub enum MeasureError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] labelstat_core::Error),

    /// Label processing error
    #[error("labels error: {0}")]
    Labels(#[from] labelstat_labels::LabelsError),

    /// Percentile error
    #[error("percentile error: {0}")]
    Percentile(#[from] labelstat_percentile::PercentileError),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for measuring operations
pub type MeasureResult<T> = Result<T, MeasureError>;
