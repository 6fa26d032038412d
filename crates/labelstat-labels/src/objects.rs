//! Per-object pixel streaming
//!
//! Labels are split into small blocks and processed in parallel. For each
//! label the worker walks its pixel list, copies every channel value of the
//! visited pixels into its own scratch buffers (leased from the element
//! type's pool, grown by doubling in lockstep when an object is large) and
//! hands them to a [`SingleObjectProcessor`]. Labels without pixels are
//! passed too, with zero pixels.
//!
//! Every label owns one row of `row_len` `f32` result slots; a block of
//! labels writes only its own rows, so results need no synchronization.

use crate::check_channels;
use crate::error::LabelsResult;
use crate::lists::LabelLists;
use labelstat_core::{
    BlockScheduler, Element, PooledBuffer, SchedulerOptions, checked_dense_len,
    ensure_capacity_for_pixels,
};

/// Buffered pixel values of one object
///
/// Channel `c` holds `len()` values, in list order.
pub struct ObjectPixels<'a, T: Element> {
    buffers: &'a mut [PooledBuffer<'static, T>],
    len: usize,
}

impl<T: Element> ObjectPixels<'_, T> {
    /// Number of pixels of the object
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether the object has no pixels
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buffered channels
    pub fn number_of_channels(&self) -> usize {
        self.buffers.len()
    }

    /// Values of channel `c`
    pub fn channel(&self, c: usize) -> &[T] {
        &self.buffers[c][..self.len]
    }

    /// Mutable values of channel `c`; processors may reorder them
    pub fn channel_mut(&mut self, c: usize) -> &mut [T] {
        &mut self.buffers[c][..self.len]
    }

    /// Split into the leading channels (read-only) and the last channel
    pub fn split_last_mut(&mut self) -> Option<(PixelChannels<'_, T>, &mut [T])> {
        let len = self.len;
        let (last, rest) = self.buffers.split_last_mut()?;
        Some((PixelChannels { buffers: rest, len }, &mut last[..len]))
    }
}

/// Read-only view of several buffered channels
pub struct PixelChannels<'a, T: Element> {
    buffers: &'a [PooledBuffer<'static, T>],
    len: usize,
}

impl<T: Element> PixelChannels<'_, T> {
    /// Number of channels in the view
    pub fn number_of_channels(&self) -> usize {
        self.buffers.len()
    }

    /// Values of channel `c`
    pub fn channel(&self, c: usize) -> &[T] {
        &self.buffers[c][..self.len]
    }
}

/// Per-object callback of [`process_objects`]
pub trait SingleObjectProcessor<T: Element>: Sync {
    /// Per-worker scratch state
    type Scratch: Send;

    /// Number of `f32` result slots per label
    fn row_len(&self) -> usize;

    /// Create the scratch state of one worker
    fn create_scratch(&self) -> Self::Scratch;

    /// Process the pixels of `label`, writing results into `row`
    ///
    /// Called for every label in `0..=max_label`, including labels without
    /// pixels. The buffers must not be retained beyond the call.
    fn process_pixels(
        &self,
        label: usize,
        pixels: &mut ObjectPixels<'_, T>,
        row: &mut [f32],
        scratch: &mut Self::Scratch,
    );
}

/// Result rows of [`process_objects`]
#[derive(Debug, Clone)]
pub struct ObjectRows {
    cardinalities: Vec<i32>,
    rows: Vec<f32>,
    row_len: usize,
}

impl ObjectRows {
    /// Highest label processed
    pub fn max_label(&self) -> usize {
        self.cardinalities.len()
    }

    /// Pixel count per label, index `label - 1`
    pub fn cardinalities(&self) -> &[i32] {
        &self.cardinalities
    }

    /// Number of slots per label
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    /// Result slots of `label` in `0..=max_label`
    pub fn row(&self, label: usize) -> &[f32] {
        &self.rows[label * self.row_len..(label + 1) * self.row_len]
    }

    /// Take the cardinalities, dropping the rows
    pub fn into_cardinalities(self) -> Vec<i32> {
        self.cardinalities
    }
}

struct ObjectWorker<T: Element, S> {
    buffers: Vec<PooledBuffer<'static, T>>,
    capacity: usize,
    scratch: S,
    cardinalities: Vec<(usize, i32)>,
}

/// Stream the pixels of every labelled object through `processor`
///
/// # Arguments
///
/// * `lists` - Pixel lists built by [`crate::build_label_lists`]
/// * `channels` - Value channels aligned with the label image
/// * `processor` - Per-object callback
/// * `options` - Scheduling options
///
/// # Errors
///
/// Returns an error if the channels are empty or misaligned with the
/// lists, or if the lists are corrupted (visit more pixels than exist).
pub fn process_objects<T, P>(
    lists: &LabelLists,
    channels: &[&[T]],
    processor: &P,
    options: &SchedulerOptions,
) -> LabelsResult<ObjectRows>
where
    T: Element,
    P: SingleObjectProcessor<T>,
{
    check_channels(lists.len(), channels)?;
    let number_of_labels = lists.list_heads().len();
    let row_len = processor.row_len();
    let total_pixels = lists.len();
    let mut rows = vec![f32::NAN; checked_dense_len("object rows", number_of_labels, row_len)?];
    let pool = T::scratch_pool();
    let scheduler = BlockScheduler::for_labels(number_of_labels, options);
    let cardinalities = scheduler.run_with_output(
        &mut rows,
        row_len,
        |_| {
            let buffers = pool.acquire_many(channels.len());
            let capacity = buffers.iter().map(|b| b.len()).min().unwrap_or(0);
            ObjectWorker {
                buffers,
                capacity,
                scratch: processor.create_scratch(),
                cardinalities: Vec::new(),
            }
        },
        |worker, block, block_rows: &mut [f32]| -> LabelsResult<()> {
            for (offset, label) in block.range().enumerate() {
                let mut count = 0usize;
                for index in lists.pixels(label) {
                    if count >= worker.capacity {
                        ensure_capacity_for_pixels(&mut worker.buffers[..], total_pixels, count)?;
                        worker.capacity = worker.buffers.iter().map(|b| b.len()).min().unwrap_or(0);
                    }
                    for (buffer, channel) in worker.buffers.iter_mut().zip(channels) {
                        buffer[count] = channel[index];
                    }
                    count += 1;
                }
                if label > 0 {
                    worker.cardinalities.push((label, count as i32));
                }
                let row = &mut block_rows[offset * row_len..(offset + 1) * row_len];
                let mut pixels = ObjectPixels {
                    buffers: &mut worker.buffers,
                    len: count,
                };
                processor.process_pixels(label, &mut pixels, row, &mut worker.scratch);
            }
            Ok(())
        },
        |workers, _| {
            let mut cardinalities = vec![0i32; number_of_labels.saturating_sub(1)];
            for worker in &workers {
                for &(label, count) in &worker.cardinalities {
                    cardinalities[label - 1] = count;
                }
            }
            Ok(cardinalities)
        },
    )?;
    Ok(ObjectRows {
        cardinalities,
        rows,
        row_len,
    })
}
