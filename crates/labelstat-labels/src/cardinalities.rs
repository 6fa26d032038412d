//! Pixel counts per label
//!
//! Every worker counts the labels of its own blocks in a private, growable
//! counter array leased from the cleared `i32` pool; the counts are added
//! up after the barrier.

use crate::error::LabelsResult;
use labelstat_core::{
    BlockScheduler, PooledBuffer, SchedulerOptions, cleared_i32_pool, ensure_capacity_for_label,
};

struct CountingWorker {
    counts: PooledBuffer<'static, i32>,
    max_label: usize,
}

impl CountingWorker {
    fn new() -> Self {
        Self {
            counts: cleared_i32_pool().acquire(),
            max_label: 0,
        }
    }
}

/// Count the pixels of every label
///
/// # Arguments
///
/// * `labels` - Label array, `0` and negative values are background
/// * `options` - Scheduling options
///
/// # Returns
///
/// Dense counts of length `max_label`; `result[label - 1]` is the number
/// of pixels of `label`. Labels that never occur below the maximum get `0`.
///
/// # Errors
///
/// Returns [`labelstat_core::Error::TooLargeLabel`] (wrapped) for a label
/// above [`labelstat_core::MAX_ALLOWED_LABEL`].
pub fn find_cardinalities(labels: &[i32], options: &SchedulerOptions) -> LabelsResult<Vec<i32>> {
    let scheduler = BlockScheduler::for_pixels(labels.len(), options);
    scheduler.run(
        |_| CountingWorker::new(),
        |worker, block| {
            for &label in &labels[block.range()] {
                if label > 0 {
                    let label = label as usize;
                    if label >= worker.counts.len() {
                        ensure_capacity_for_label(&mut *worker.counts, label)?;
                    }
                    worker.counts[label] += 1;
                    worker.max_label = worker.max_label.max(label);
                }
            }
            Ok(())
        },
        |mut workers| {
            let max_label = workers.iter().map(|w| w.max_label).max().unwrap_or(0);
            let mut cardinalities = vec![0i32; max_label];
            for worker in workers.iter_mut() {
                for label in 1..=worker.max_label {
                    cardinalities[label - 1] += worker.counts[label];
                }
                let used = worker.max_label + 1;
                worker.counts.set_used_len(used);
            }
            Ok(cardinalities)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LabelsError;
    use labelstat_core::{Error, MAX_ALLOWED_LABEL};

    #[test]
    fn test_simple_counts() {
        let labels = [0, 1, 1, 2, 2, 2];
        let cardinalities = find_cardinalities(&labels, &SchedulerOptions::default()).unwrap();
        assert_eq!(cardinalities, vec![2, 3]);
    }

    #[test]
    fn test_gaps_are_zero_filled() {
        let labels = [5, 0, 5, 2, 0];
        let options = SchedulerOptions::new().with_num_workers(3).with_pixel_block_size(2);
        let cardinalities = find_cardinalities(&labels, &options).unwrap();
        assert_eq!(cardinalities, vec![0, 1, 0, 0, 2]);
    }

    #[test]
    fn test_background_only() {
        let labels = [0, 0, -3, 0];
        let cardinalities = find_cardinalities(&labels, &SchedulerOptions::default()).unwrap();
        assert!(cardinalities.is_empty());
    }

    #[test]
    fn test_too_large_label() {
        let labels = [1, MAX_ALLOWED_LABEL + 1];
        let result = find_cardinalities(&labels, &SchedulerOptions::default());
        assert!(matches!(
            result,
            Err(LabelsError::Core(Error::TooLargeLabel { .. }))
        ));
    }
}
