//! labelstat-percentile - Per-object percentiles for labelstat
//!
//! Percentiles of every labelled object are found by streaming the pixels
//! of each object into scratch buffers and partially sorting them:
//!
//! - **Selection** - Quickselect of several ranks at once, with a counting
//!   fast path for byte channels of 128 pixels or more
//! - **Separate channels** - Each channel with its own levels
//! - **Common levels** - Channels read at the percentiles of a ranking
//!   channel, with ties averaged or resolved to a single pixel
//! - **Truncated means** - Means of the values between two percentiles
//!
//! The percentile of level `p` among `n` values is the value of rank
//! `round(p * (n - 1))`. Label 0 is background and is never measured.
//!
//! # Examples
//!
//! ```
//! use labelstat_labels::build_label_lists;
//! use labelstat_core::SchedulerOptions;
//! use labelstat_percentile::find_percentiles;
//!
//! let labels = [1, 1, 1, 2];
//! let values = [3u8, 1, 2, 9];
//! let options = SchedulerOptions::default();
//! let lists = build_label_lists(&labels, &options).unwrap();
//! let found = find_percentiles(&lists, &[&values[..]], &[0.5], &options).unwrap();
//! assert_eq!(found.percentiles_by_channels[0][0], vec![2.0, 9.0]);
//! ```

pub mod byte_selector;
pub mod common_levels;
pub mod error;
pub mod finder;
pub mod levels;
pub mod result;
pub mod selector;
pub mod separate;

// Re-export dependent crates
pub use labelstat_core;
pub use labelstat_labels;

// Re-export selection primitives
pub use byte_selector::{ByteSelector, MIN_LENGTH_FOR_BYTE_SELECTOR};
pub use selector::{percentile_index, select_indexes, select_levels};

// Re-export finders
pub use common_levels::{CommonLevelsFinder, CommonLevelsScratch, CommonLevelsTieMode};
pub use finder::{PercentilesFinder, find_percentiles};
pub use levels::{PercentileLevels, TruncatedMeanBounds};
pub use result::ChannelPercentiles;
pub use separate::{SelectionScratch, SeparateChannelsFinder};

pub use error::{PercentileError, PercentileResult};
