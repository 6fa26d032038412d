//! Labelstat Core - Shared building blocks for labelled-object statistics
//!
//! This crate provides the data structures and the parallel machinery used
//! by every reducer of the labelstat workspace:
//!
//! - [`LabelImage`] - Dense `i32` label array, `0` = background
//! - [`Channels`] / [`ChannelSlice`] - Value channels of one element type
//! - [`Element`] - Generic numeric element (`u8`, `u16`, `i32`, `f32`, `f64`)
//! - [`BlockScheduler`] - Block-parallel execution with a merge barrier
//! - [`ensure_capacity_for_label`] - Growable label-indexed accumulators
//! - [`ScratchPool`] / [`PooledBuffer`] - Scoped scratch-buffer leases
//!
//! # Example
//!
//! ```
//! use labelstat_core::{BlockScheduler, Error};
//!
//! let labels = [0, 1, 1, 2, 2, 2];
//! let scheduler = BlockScheduler::new(labels.len(), 2, 2);
//! let foreground = scheduler
//!     .run(
//!         |_| 0usize,
//!         |count: &mut usize, block| -> Result<(), Error> {
//!             *count += labels[block.range()].iter().filter(|&&l| l > 0).count();
//!             Ok(())
//!         },
//!         |workers| Ok(workers.into_iter().sum::<usize>()),
//!     )
//!     .unwrap();
//! assert_eq!(foreground, 5);
//! ```

pub mod accumulator;
pub mod channels;
pub mod element;
pub mod error;
pub mod label_image;
pub mod pool;
pub mod scheduler;

pub use accumulator::{
    MAX_ALLOWED_LABEL, checked_dense_len, ensure_capacity_for_label, ensure_capacity_for_pixels,
    ensure_several_capacity_for_label, increased_capacity_for_label,
};
pub use channels::{ChannelSlice, Channels, ElementType};
pub use element::Element;
pub use error::{Error, Result};
pub use label_image::LabelImage;
pub use pool::{BUFFER_SIZE, PooledBuffer, ScratchPool, cleared_f64_pool, cleared_i32_pool};
pub use scheduler::{Block, BlockScheduler, SchedulerOptions};
