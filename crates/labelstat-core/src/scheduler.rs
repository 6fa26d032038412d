//! Parallel block scheduler
//!
//! Splits an index range `[0, len)` into contiguous blocks and runs a
//! callback on each of them on the rayon thread pool. Every worker owns one
//! mutable state value; blocks are dealt to workers round-robin (block `b`
//! goes to worker `b % T`), so a worker never shares its state and no
//! locking is needed. After a full barrier the `finish` step runs once, on
//! the calling thread, with all worker states.
//!
//! The first failing block sets an abort flag checked before each further
//! block; its error is returned and `finish` is never called.

use crate::error::Error;
use rayon::prelude::*;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default number of pixels per block in pixel scans
pub const DEFAULT_PIXEL_BLOCK_SIZE: usize = 32768;

/// Lower bound of labels per block in per-object passes
pub const MIN_LABELS_PER_BLOCK: usize = 4;

/// Default upper bound of labels per block in per-object passes
pub const MAX_LABELS_PER_BLOCK: usize = 64;

/// One contiguous block of indices assigned to a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// First index of the block
    pub start: usize,
    /// Number of indices in the block
    pub count: usize,
    /// Worker processing the block, in `[0, T)`
    pub worker_id: usize,
}

impl Block {
    /// Index range covered by the block
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.count
    }
}

/// Options for block scheduling
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Number of workers; `None` uses the rayon thread count
    pub num_workers: Option<usize>,
    /// Pixels per block in pixel scans
    pub pixel_block_size: usize,
    /// Upper bound of labels per block in per-object passes
    pub max_labels_per_block: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            num_workers: None,
            pixel_block_size: DEFAULT_PIXEL_BLOCK_SIZE,
            max_labels_per_block: MAX_LABELS_PER_BLOCK,
        }
    }
}

impl SchedulerOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fixed number of workers
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = Some(num_workers);
        self
    }

    /// Set the pixel block size
    pub fn with_pixel_block_size(mut self, size: usize) -> Self {
        self.pixel_block_size = size;
        self
    }

    /// Set the upper bound of labels per block
    pub fn with_max_labels_per_block(mut self, count: usize) -> Self {
        self.max_labels_per_block = count;
        self
    }

    /// Effective number of workers
    pub fn workers(&self) -> usize {
        self.num_workers
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }
}

/// Block partition of an index range over a fixed number of workers
#[derive(Debug, Clone)]
pub struct BlockScheduler {
    len: usize,
    block_size: usize,
    num_workers: usize,
}

impl BlockScheduler {
    /// Create a scheduler over `[0, len)`
    pub fn new(len: usize, block_size: usize, num_workers: usize) -> Self {
        Self {
            len,
            block_size: block_size.max(1),
            num_workers: num_workers.max(1),
        }
    }

    /// Scheduler for a scan over all pixels
    pub fn for_pixels(len: usize, options: &SchedulerOptions) -> Self {
        Self::new(len, options.pixel_block_size, options.workers())
    }

    /// Scheduler for a pass over labels
    ///
    /// Each block holds `max(4, min(labels / (2 * workers), max_labels_per_block))`
    /// labels, so that even few labels are spread over all workers.
    pub fn for_labels(number_of_labels: usize, options: &SchedulerOptions) -> Self {
        let workers = options.workers();
        let recommended = number_of_labels / (2 * workers);
        let block_size = recommended
            .min(options.max_labels_per_block)
            .max(MIN_LABELS_PER_BLOCK);
        Self::new(number_of_labels, block_size, workers)
    }

    /// Length of the scheduled range
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether the range is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Indices per block (the last block may be shorter)
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks
    pub fn number_of_blocks(&self) -> usize {
        self.len.div_ceil(self.block_size)
    }

    /// Number of worker states created by [`BlockScheduler::run`]
    pub fn number_of_workers(&self) -> usize {
        self.num_workers.min(self.number_of_blocks()).max(1)
    }

    fn block(&self, index: usize, worker_id: usize) -> Block {
        let start = index * self.block_size;
        Block {
            start,
            count: self.block_size.min(self.len - start),
            worker_id,
        }
    }

    /// Blocks processed by worker `worker_id`, in ascending order
    pub fn blocks_of_worker(&self, worker_id: usize) -> impl Iterator<Item = Block> + '_ {
        (worker_id..self.number_of_blocks())
            .step_by(self.number_of_workers())
            .map(move |index| self.block(index, worker_id))
    }

    /// Run `process` on every block, then `finish` on all worker states
    ///
    /// # Arguments
    ///
    /// * `init` - Creates the state of worker `worker_id`
    /// * `process` - Processes one block with its worker's state
    /// * `finish` - Merges the worker states after the barrier
    ///
    /// # Errors
    ///
    /// Returns the first error raised by `process` or the error of `finish`.
    pub fn run<W, R, E, I, P, F>(&self, init: I, process: P, finish: F) -> Result<R, E>
    where
        W: Send,
        E: Send,
        I: FnMut(usize) -> W,
        P: Fn(&mut W, Block) -> Result<(), E> + Sync,
        F: FnOnce(Vec<W>) -> Result<R, E>,
    {
        let mut workers: Vec<W> = (0..self.number_of_workers()).map(init).collect();
        log::trace!(
            "running {} blocks of {} over {} workers",
            self.number_of_blocks(),
            self.block_size,
            workers.len()
        );
        let abort = AtomicBool::new(false);
        workers
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(worker_id, worker)| {
                for block in self.blocks_of_worker(worker_id) {
                    if abort.load(Ordering::Relaxed) {
                        break;
                    }
                    if let Err(e) = process(worker, block) {
                        abort.store(true, Ordering::Relaxed);
                        return Err(e);
                    }
                }
                Ok(())
            })?;
        finish(workers)
    }

    /// Like [`BlockScheduler::run`], with a disjoint output chunk per block
    ///
    /// Block `[start, start + count)` receives exclusive access to
    /// `output[start * stride .. (start + count) * stride]`; `finish` gets the
    /// whole output back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if `output.len() != len * stride`,
    /// otherwise the first error raised by `process` or `finish`.
    pub fn run_with_output<O, W, R, E, I, P, F>(
        &self,
        output: &mut [O],
        stride: usize,
        init: I,
        process: P,
        finish: F,
    ) -> Result<R, E>
    where
        O: Send,
        W: Send,
        E: Send + From<Error>,
        I: FnMut(usize) -> W,
        P: Fn(&mut W, Block, &mut [O]) -> Result<(), E> + Sync,
        F: FnOnce(Vec<W>, &mut [O]) -> Result<R, E>,
    {
        let expected = self.len.saturating_mul(stride);
        if output.len() != expected {
            return Err(Error::LengthMismatch {
                what: "block output",
                expected,
                actual: output.len(),
            }
            .into());
        }
        let num_workers = self.number_of_workers();
        let mut workers: Vec<W> = (0..num_workers).map(init).collect();
        {
            let mut assignments: Vec<Vec<(Block, &mut [O])>> =
                (0..num_workers).map(|_| Vec::new()).collect();
            if stride == 0 {
                for index in 0..self.number_of_blocks() {
                    let worker_id = index % num_workers;
                    let empty: &mut [O] = Default::default();
                    assignments[worker_id].push((self.block(index, worker_id), empty));
                }
            } else {
                for (index, chunk) in output.chunks_mut(self.block_size * stride).enumerate() {
                    let worker_id = index % num_workers;
                    assignments[worker_id].push((self.block(index, worker_id), chunk));
                }
            }
            let abort = AtomicBool::new(false);
            workers
                .par_iter_mut()
                .zip(assignments.into_par_iter())
                .try_for_each(|(worker, blocks)| {
                    for (block, chunk) in blocks {
                        if abort.load(Ordering::Relaxed) {
                            break;
                        }
                        if let Err(e) = process(worker, block, chunk) {
                            abort.store(true, Ordering::Relaxed);
                            return Err(e);
                        }
                    }
                    Ok(())
                })?;
        }
        finish(workers, output)
    }
}
