//! Cardinalities and per-channel sums (and sums of squares) per label
//!
//! Each worker keeps one growable `f64` array per channel, all grown in
//! lockstep. After the barrier the partial sums are added in worker order,
//! so one build always produces the same rounding for the same input.

use crate::check_channels;
use crate::error::LabelsResult;
use labelstat_core::{
    BlockScheduler, Element, PooledBuffer, SchedulerOptions, checked_dense_len, cleared_i32_pool,
    ensure_capacity_for_label, ensure_several_capacity_for_label,
};

/// Merged per-label sums
///
/// `sums[(label - 1) * number_of_channels + c]` is the sum of channel `c`
/// over the pixels of `label`; the same layout holds for sums of squares.
#[derive(Debug, Clone)]
pub struct LabelSums {
    /// Number of channels summed
    pub number_of_channels: usize,
    /// Pixel count per label
    pub cardinalities: Vec<i32>,
    /// Sums, interleaved per channel
    pub sums: Vec<f64>,
    /// Sums of squares, interleaved per channel, if requested
    pub sums_of_squares: Option<Vec<f64>>,
}

impl LabelSums {
    /// Highest label found
    pub fn max_label(&self) -> usize {
        self.cardinalities.len()
    }

    /// Means, multiplied by `scale`; NaN for objects without pixels
    pub fn means(&self, scale: f64) -> Vec<f32> {
        self.per_element(&self.sums, scale)
    }

    /// Mean squares, multiplied by `scale * scale`
    pub fn mean_squares(&self, scale: f64) -> Option<Vec<f32>> {
        let squares = self.sums_of_squares.as_ref()?;
        Some(self.per_element(squares, scale * scale))
    }

    /// Standard deviations `sqrt(max(mean_square - mean^2, 0))`, scaled
    pub fn standard_deviations(&self, scale: f64) -> Option<Vec<f32>> {
        let squares = self.sums_of_squares.as_ref()?;
        let m = self.number_of_channels;
        let result = self
            .sums
            .iter()
            .zip(squares)
            .enumerate()
            .map(|(i, (&sum, &square))| {
                let n = self.cardinalities[i / m] as f64;
                if n == 0.0 {
                    return f32::NAN;
                }
                let mean = sum * scale / n;
                let mean_square = square * scale * scale / n;
                (mean_square - mean * mean).max(0.0).sqrt() as f32
            })
            .collect();
        Some(result)
    }

    fn per_element(&self, values: &[f64], scale: f64) -> Vec<f32> {
        let m = self.number_of_channels;
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (v * scale / self.cardinalities[i / m] as f64) as f32)
            .collect()
    }
}

struct SummingWorker {
    counts: PooledBuffer<'static, i32>,
    sums: Vec<Vec<f64>>,
    squares: Vec<Vec<f64>>,
    max_label: usize,
}

/// Find cardinalities and per-channel sums of every label
///
/// # Arguments
///
/// * `labels` - Label array, `0` and negative values are background
/// * `channels` - Value channels aligned with `labels`
/// * `need_squares` - Also accumulate sums of squares
/// * `options` - Scheduling options
///
/// # Errors
///
/// Returns an error if the channels are empty or misaligned, if a label is
/// too large, or if `max_label * channels` exceeds the 32-bit element count.
pub fn find_sums<T: Element>(
    labels: &[i32],
    channels: &[&[T]],
    need_squares: bool,
    options: &SchedulerOptions,
) -> LabelsResult<LabelSums> {
    check_channels(labels.len(), channels)?;
    let m = channels.len();
    let scheduler = BlockScheduler::for_pixels(labels.len(), options);
    scheduler.run(
        |_| SummingWorker {
            counts: cleared_i32_pool().acquire(),
            sums: vec![Vec::new(); m],
            squares: if need_squares { vec![Vec::new(); m] } else { Vec::new() },
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
                if label >= worker.sums[0].len() {
                    ensure_several_capacity_for_label(&mut worker.sums, label)?;
                    if need_squares {
                        ensure_several_capacity_for_label(&mut worker.squares, label)?;
                    }
                }
                worker.counts[label] += 1;
                worker.max_label = worker.max_label.max(label);
                for (c, channel) in channels.iter().enumerate() {
                    let v = channel[k].to_f64();
                    worker.sums[c][label] += v;
                    if need_squares {
                        worker.squares[c][label] += v * v;
                    }
                }
            }
            Ok(())
        },
        |mut workers| {
            let max_label = workers.iter().map(|w| w.max_label).max().unwrap_or(0);
            let len = checked_dense_len("sums", max_label, m)?;
            let mut cardinalities = vec![0i32; max_label];
            let mut sums = vec![0.0f64; len];
            let mut squares = if need_squares { vec![0.0f64; len] } else { Vec::new() };
            for worker in workers.iter_mut() {
                for label in 1..=worker.max_label {
                    cardinalities[label - 1] += worker.counts[label];
                    let disp = (label - 1) * m;
                    for c in 0..m {
                        sums[disp + c] += worker.sums[c][label];
                        if need_squares {
                            squares[disp + c] += worker.squares[c][label];
                        }
                    }
                }
                let used = worker.max_label + 1;
                worker.counts.set_used_len(used);
            }
            Ok(LabelSums {
                number_of_channels: m,
                cardinalities,
                sums,
                sums_of_squares: need_squares.then_some(squares),
            })
        },
    )
}
