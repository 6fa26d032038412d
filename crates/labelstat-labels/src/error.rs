//! Error types for labelstat-labels

use thiserror::Error;

/// Errors that can occur in label reducers and object processing
#[derive(Debug, Error)]
pub enum LabelsError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] labelstat_core::Error),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for label operations
pub type LabelsResult<T> = Result<T, LabelsError>;
