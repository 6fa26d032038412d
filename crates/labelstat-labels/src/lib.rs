//! labelstat-labels - Parallel per-label reductions for labelstat
//!
//! This crate provides the single-pass reducers over a label array and the
//! per-object pixel machinery:
//!
//! - **Cardinalities** - Pixel count per label
//! - **Sums** - Per-channel sums and sums of squares per label
//! - **First non-zero pixels** - Smallest non-zero pixel index per label
//! - **Pixel lists** - Intrusive linked lists partitioning pixels by label
//! - **Object streaming** - Per-object pixel buffers fed to a callback
//!
//! # Examples
//!
//! ## Counting and summing
//!
//! ```
//! use labelstat_labels::find_sums;
//! use labelstat_core::SchedulerOptions;
//!
//! let labels = [0, 1, 1, 2, 2, 2];
//! let values = [0u8, 10, 20, 5, 15, 25];
//! let sums = find_sums(&labels, &[&values[..]], false, &SchedulerOptions::default()).unwrap();
//! assert_eq!(sums.cardinalities, vec![2, 3]);
//! assert_eq!(sums.means(1.0), vec![15.0, 15.0]);
//! ```
//!
//! ## Walking the pixels of an object
//!
//! ```
//! use labelstat_labels::build_label_lists;
//! use labelstat_core::SchedulerOptions;
//!
//! let labels = [0, 1, 1, 2, 2, 2];
//! let lists = build_label_lists(&labels, &SchedulerOptions::default()).unwrap();
//! assert_eq!(lists.pixels(2).count(), 3);
//! ```

pub mod cardinalities;
pub mod error;
pub mod first_non_zero;
pub mod lists;
pub mod objects;
pub mod sums;

use labelstat_core::Error;

// Re-export core crate
pub use labelstat_core;

// Re-export reducers
pub use cardinalities::find_cardinalities;
pub use first_non_zero::{FirstNonZero, find_first_non_zero};
pub use sums::{LabelSums, find_sums};

// Re-export list and object types
pub use lists::{LIST_END, LabelLists, LabelPixels, build_label_lists};
pub use objects::{ObjectPixels, ObjectRows, PixelChannels, SingleObjectProcessor, process_objects};

pub use error::{LabelsError, LabelsResult};

/// Check that `channels` is non-empty and every channel has `len` pixels
pub(crate) fn check_channels<T>(len: usize, channels: &[&[T]]) -> LabelsResult<()> {
    if channels.is_empty() {
        return Err(Error::EmptyChannels.into());
    }
    if let Some(channel) = channels.iter().find(|c| c.len() != len) {
        return Err(Error::LengthMismatch {
            what: "channel",
            expected: len,
            actual: channel.len(),
        }
        .into());
    }
    Ok(())
}
