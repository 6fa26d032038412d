//! First non-zero pixel of every label
//!
//! A pixel is non-zero if any of its channels is non-zero. Workers scan
//! their blocks in ascending order, so the first hit of a worker is its
//! smallest index; the merge keeps the minimum over workers.

use crate::check_channels;
use crate::error::LabelsResult;
use labelstat_core::{
    BlockScheduler, Element, Error, PooledBuffer, SchedulerOptions, cleared_i32_pool,
    ensure_capacity_for_label,
};

/// First non-zero pixel index of every label
#[derive(Debug, Clone)]
pub struct FirstNonZero {
    /// Pixel count per label
    pub cardinalities: Vec<i32>,
    /// Smallest non-zero pixel index per label, `-1` if there is none
    pub indexes: Vec<i32>,
}

impl FirstNonZero {
    /// Highest label found
    pub fn max_label(&self) -> usize {
        self.indexes.len()
    }

    /// Channel values at the first non-zero pixels, interleaved per channel
    ///
    /// Labels without a non-zero pixel get `0`.
    pub fn int_values<T: Element>(&self, channels: &[&[T]]) -> Vec<i32> {
        self.values(channels, |v| v.to_i32(), 0)
    }

    /// Channel values at the first non-zero pixels as floats, multiplied by
    /// `scale`
    pub fn float_values<T: Element>(&self, channels: &[&[T]], scale: f64) -> Vec<f32> {
        self.values(channels, |v| (v.to_f64() * scale) as f32, 0.0)
    }

    fn values<T: Element, V: Copy>(&self, channels: &[&[T]], convert: impl Fn(T) -> V, zero: V) -> Vec<V> {
        let mut result = Vec::with_capacity(self.indexes.len() * channels.len());
        for &index in &self.indexes {
            for channel in channels {
                result.push(if index >= 0 {
                    convert(channel[index as usize])
                } else {
                    zero
                });
            }
        }
        result
    }
}

struct ScanningWorker {
    counts: PooledBuffer<'static, i32>,
    // pixel index + 1; zero while no non-zero pixel was seen
    first_increased: PooledBuffer<'static, i32>,
    max_label: usize,
}

/// Find the first non-zero pixel of every label
///
/// # Errors
///
/// Returns an error if the channels are empty or misaligned, if a label is
/// too large, or if the image has more than `i32::MAX` pixels.
pub fn find_first_non_zero<T: Element>(
    labels: &[i32],
    channels: &[&[T]],
    options: &SchedulerOptions,
) -> LabelsResult<FirstNonZero> {
    check_channels(labels.len(), channels)?;
    if labels.len() >= i32::MAX as usize {
        return Err(Error::TooLargeArray {
            what: "pixel indexes",
            elements: labels.len() as u64,
        }
        .into());
    }
    let scheduler = BlockScheduler::for_pixels(labels.len(), options);
    scheduler.run(
        |_| ScanningWorker {
            counts: cleared_i32_pool().acquire(),
            first_increased: cleared_i32_pool().acquire(),
            max_label: 0,
        },
        |worker, block| {
            for k in block.range() {
                let label = labels[k];
                if label <= 0 {
                    continue;
                }
                let label = label as usize;
                if label >= worker.counts.len() {
                    ensure_capacity_for_label(&mut *worker.counts, label)?;
                }
                if label >= worker.first_increased.len() {
                    ensure_capacity_for_label(&mut *worker.first_increased, label)?;
                }
                worker.counts[label] += 1;
                worker.max_label = worker.max_label.max(label);
                if worker.first_increased[label] == 0 && channels.iter().any(|c| !c[k].is_zero()) {
                    worker.first_increased[label] = k as i32 + 1;
                }
            }
            Ok(())
        },
        |mut workers| {
            let max_label = workers.iter().map(|w| w.max_label).max().unwrap_or(0);
            let mut cardinalities = vec![0i32; max_label];
            let mut indexes = vec![-1i32; max_label];
            for worker in workers.iter_mut() {
                for label in 1..=worker.max_label {
                    cardinalities[label - 1] += worker.counts[label];
                    let first = worker.first_increased[label] - 1;
                    let merged = &mut indexes[label - 1];
                    if first >= 0 && (*merged < 0 || first < *merged) {
                        *merged = first;
                    }
                }
                let used = worker.max_label + 1;
                worker.counts.set_used_len(used);
                worker.first_increased.set_used_len(used);
            }
            Ok(FirstNonZero {
                cardinalities,
                indexes,
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_zero_indexes() {
        let labels = [1, 1, 2, 2, 1, 3];
        let a = [0u8, 0, 0, 7, 5, 0];
        let b = [0u8, 3, 0, 0, 0, 0];
        let options = SchedulerOptions::new().with_num_workers(3).with_pixel_block_size(2);
        let result = find_first_non_zero(&labels, &[&a[..], &b[..]], &options).unwrap();
        assert_eq!(result.indexes, vec![1, 3, -1]);
        assert_eq!(result.cardinalities, vec![3, 2, 1]);
        assert_eq!(result.int_values(&[&a[..], &b[..]]), vec![0, 3, 7, 0, 0, 0]);
    }

    #[test]
    fn test_float_values_scaled() {
        let labels = [0, 1, 1];
        let values = [9.0f32, 0.0, 4.0];
        let result = find_first_non_zero(&labels, &[&values[..]], &SchedulerOptions::default()).unwrap();
        assert_eq!(result.indexes, vec![2]);
        assert_eq!(result.float_values(&[&values[..]], 0.5), vec![2.0]);
    }
}
