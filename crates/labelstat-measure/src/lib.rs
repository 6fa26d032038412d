//! labelstat-measure - Measuring labelled objects
//!
//! This crate is the entry point of labelstat. It combines the reducers,
//! the pixel lists and the percentile finders into two APIs:
//!
//! - **[`LabelsAnalyser`]** - Stateful analyser of one label image, running
//!   each pass on demand and keeping its results
//! - **[`measure_labelled_objects`]** - One request: a label image, an
//!   optional mask, an image, an optional level image and a set of
//!   [`ObjectParameter`]s
//!
//! All outputs are dense arrays indexed by `label - 1`, interleaved by
//! channel for multi-channel images. Values are scaled by
//! `1 / max_possible_value` of the image element type (255 for `u8`, 65535
//! for `u16`, 1 for floating-point images) unless raw values are requested.
//!
//! # Examples
//!
//! ```
//! use labelstat_core::{Channels, LabelImage};
//! use labelstat_measure::{MeasureOptions, ObjectParameter, measure_labelled_objects};
//!
//! let labels = [0, 1, 1, 2, 2, 2];
//! let values = [0u8, 10, 20, 5, 15, 25];
//! let options = MeasureOptions::new().with_raw_values(true).with_percentile_a(vec![0.5]);
//! let result = measure_labelled_objects(
//!     &LabelImage::from_slice(&labels),
//!     None,
//!     &Channels::single(&values[..]),
//!     None,
//!     &[ObjectParameter::PercentileA],
//!     &options,
//! )
//! .unwrap();
//! assert_eq!(result.floats(ObjectParameter::PercentileA), Some(&[20.0, 15.0][..]));
//! ```

pub mod analyser;
pub mod error;
pub mod measure;
pub mod options;
pub mod values;

// Re-export dependent crates
pub use labelstat_core;
pub use labelstat_labels;
pub use labelstat_percentile;

// Re-export facade types
pub use analyser::LabelsAnalyser;
pub use measure::{LabelledObjectsMeasurements, measure_labelled_objects};
pub use options::{MeasureOptions, ObjectParameter};
pub use values::ObjectValues;

pub use error::{MeasureError, MeasureResult};
