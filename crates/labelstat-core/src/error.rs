//! Error types for labelstat-core
//!
//! Provides a unified error type for the core crate. All of these are
//! raised before any parallel work starts, or by a worker that aborts the
//! whole request; no variant ever accompanies a partial result.

use thiserror::Error;

/// Labelstat core error type
#[derive(Error, Debug)]
pub enum Error {
    /// No value channels were supplied
    #[error("empty channel list")]
    EmptyChannels,

    /// Array length disagrees with the label image or with other channels
    #[error("{what} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Channels of one request must share a single element type
    #[error("different element types of channels: {0} != {1}")]
    MixedElementTypes(&'static str, &'static str),

    /// Width and height do not describe the label array
    #[error("invalid dimensions: {width}x{height} for {len} labels")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    /// Label value beyond the allowed maximum
    #[error("too large label {label} > {max}: it is probably a random int value, not a label")]
    TooLargeLabel { label: i64, max: i32 },

    /// A dense result array would exceed the 32-bit element count
    #[error("too large array for {what}: {elements} elements")]
    TooLargeArray { what: &'static str, elements: u64 },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A result was requested before it was computed
    #[error("not ready: {0}")]
    NotReady(&'static str),
}

/// Result type alias for labelstat core operations
pub type Result<T> = std::result::Result<T, Error>;
