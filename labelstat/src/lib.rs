//! Labelstat - Per-object statistics of labelled images
//!
//! Given a label image (`0` for background, a positive label per object)
//! and one or more co-registered value channels, labelstat measures every
//! object in one parallel pass per statistic:
//!
//! - Pixel counts, sums and sums of squares, means, standard deviations
//! - Percentiles at any levels, per channel or ranked by another channel
//! - Truncated means between two percentiles
//! - First non-zero pixel of every object
//!
//! # Example
//!
//! ```
//! use labelstat::{Channels, LabelImage};
//! use labelstat::measure::{MeasureOptions, ObjectParameter, measure_labelled_objects};
//!
//! let labels = [0, 1, 1, 2, 2, 2];
//! let values = [0u8, 10, 20, 5, 15, 25];
//! let result = measure_labelled_objects(
//!     &LabelImage::new(&labels, 3, 2).unwrap(),
//!     None,
//!     &Channels::single(&values[..]),
//!     None,
//!     &[ObjectParameter::Cardinality],
//!     &MeasureOptions::new(),
//! )
//! .unwrap();
//! assert_eq!(result.ints(ObjectParameter::Cardinality), Some(&[2, 3][..]));
//! ```

// Re-export core types (primary data structures used everywhere)
pub use labelstat_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use labelstat_labels as labels;
pub use labelstat_measure as measure;
pub use labelstat_percentile as percentile;
