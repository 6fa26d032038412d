//! Percentiles with independent levels per channel
//!
//! Every channel of an object is selected on its own: its values are
//! partially sorted so that the ranks of the requested levels are in place,
//! or, for byte channels of at least [`MIN_LENGTH_FOR_BYTE_SELECTOR`]
//! pixels, counted into a histogram. Label 0 is never measured.

use crate::byte_selector::{ByteSelector, MIN_LENGTH_FOR_BYTE_SELECTOR};
use crate::error::{PercentileError, PercentileResult};
use crate::levels::{PercentileLevels, TruncatedMeanBounds};
use crate::result::{ChannelPercentiles, RowLayout};
use crate::selector::{percentile_index, select_levels};
use labelstat_core::{Element, SchedulerOptions};
use labelstat_labels::{LabelLists, ObjectPixels, SingleObjectProcessor, process_objects};

/// Per-worker selection state
#[derive(Debug, Default)]
pub struct SelectionScratch {
    selector: ByteSelector,
    byte_results: Vec<u8>,
    level_values: Vec<f64>,
}

impl SelectionScratch {
    /// Fill `level_values` with the percentiles of `levels`, in requested
    /// order; may reorder `values`
    pub(crate) fn find_level_values<T: Element>(&mut self, values: &mut [T], levels: &PercentileLevels) {
        let n = values.len();
        self.level_values.clear();
        self.level_values.resize(levels.len(), f64::NAN);
        if n == 0 {
            return;
        }
        if n >= MIN_LENGTH_FOR_BYTE_SELECTOR {
            if let Some(bytes) = T::as_bytes(values) {
                self.byte_results.resize(levels.len(), 0);
                self.selector.select(bytes, levels.sorted(), &mut self.byte_results);
                for (&result, &k) in self.byte_results.iter().zip(levels.unsorted_indexes()) {
                    self.level_values[k] = f64::from(result);
                }
                return;
            }
        }
        select_levels(values, levels.sorted());
        for (slot, &level) in self.level_values.iter_mut().zip(levels.levels()) {
            *slot = values[percentile_index(level, n)].to_f64();
        }
    }

    /// Percentiles found by the last [`Self::find_level_values`]
    pub(crate) fn level_values(&self) -> &[f64] {
        &self.level_values
    }
}

/// Mean of the values between the percentiles at level indexes
/// `bounds.low` and `bounds.high`, both inclusive
///
/// A missing low bound gives NaN; a missing or identical high bound gives
/// the low percentile itself, as does an empty range; crossed bounds give
/// NaN.
fn truncated_mean_of<T: Element>(
    values: &[T],
    level_values: &[f64],
    bounds: TruncatedMeanBounds,
) -> f32 {
    let Some(&low) = level_values.get(bounds.low) else {
        return f32::NAN;
    };
    let high = match level_values.get(bounds.high) {
        Some(&high) if bounds.high != bounds.low => high,
        _ => return low as f32,
    };
    if low > high {
        return f32::NAN;
    }
    if low == high {
        return low as f32;
    }
    let (sum, count) = values
        .iter()
        .map(|v| v.to_f64())
        .filter(|v| (low..=high).contains(v))
        .fold((0.0f64, 0usize), |(sum, count), v| (sum + v, count + 1));
    (sum / count as f64) as f32
}

/// Percentiles of one channel of one object
///
/// An empty level set leaves only the truncated mean, as NaN. An object
/// without pixels gets NaN everywhere.
pub(crate) fn percentiles_in_channel<T: Element>(
    values: &mut [T],
    levels: &PercentileLevels,
    bounds: Option<TruncatedMeanBounds>,
    percentiles: &mut [f32],
    truncated_mean: Option<&mut f32>,
    scratch: &mut SelectionScratch,
) {
    if levels.is_empty() || values.is_empty() {
        percentiles.fill(f32::NAN);
        if let Some(mean) = truncated_mean {
            *mean = f32::NAN;
        }
        return;
    }
    scratch.find_level_values(values, levels);
    for (slot, &v) in percentiles.iter_mut().zip(&scratch.level_values) {
        *slot = v as f32;
    }
    if let (Some(mean), Some(bounds)) = (truncated_mean, bounds) {
        *mean = truncated_mean_of(values, &scratch.level_values, bounds);
    }
}

/// Finder selecting every channel independently
#[derive(Debug, Clone)]
pub struct SeparateChannelsFinder {
    levels: Vec<PercentileLevels>,
    bounds: Option<TruncatedMeanBounds>,
    layout: RowLayout,
}

impl SeparateChannelsFinder {
    /// Create a finder
    ///
    /// # Arguments
    ///
    /// * `levels_by_channels` - One level set per channel; may be empty sets
    /// * `bounds` - Level indexes of the truncated mean, if requested
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::InvalidParameters`] if no channel is given.
    pub fn new(
        levels_by_channels: Vec<PercentileLevels>,
        bounds: Option<TruncatedMeanBounds>,
    ) -> PercentileResult<Self> {
        if levels_by_channels.is_empty() {
            return Err(PercentileError::InvalidParameters(
                "at least one channel of levels is required".into(),
            ));
        }
        let layout = RowLayout::new(
            levels_by_channels.iter().map(PercentileLevels::len).collect(),
            bounds.is_some(),
        );
        Ok(Self {
            levels: levels_by_channels,
            bounds,
            layout,
        })
    }

    /// Number of channels measured
    pub fn number_of_channels(&self) -> usize {
        self.levels.len()
    }

    /// Find the percentiles of every object
    ///
    /// `channels` must hold at least [`Self::number_of_channels`] channels;
    /// only that many are read.
    pub fn find<T: Element>(
        &self,
        lists: &LabelLists,
        channels: &[&[T]],
        options: &SchedulerOptions,
    ) -> PercentileResult<ChannelPercentiles> {
        let m = self.number_of_channels();
        if channels.len() < m {
            return Err(PercentileError::InvalidParameters(format!(
                "{} channels given, {m} required",
                channels.len()
            )));
        }
        let rows = process_objects(lists, &channels[..m], self, options)?;
        Ok(self.layout.collect(&rows))
    }
}

impl<T: Element> SingleObjectProcessor<T> for SeparateChannelsFinder {
    type Scratch = SelectionScratch;

    fn row_len(&self) -> usize {
        self.layout.row_len()
    }

    fn create_scratch(&self) -> SelectionScratch {
        SelectionScratch::default()
    }

    fn process_pixels(
        &self,
        label: usize,
        pixels: &mut ObjectPixels<'_, T>,
        row: &mut [f32],
        scratch: &mut SelectionScratch,
    ) {
        if label == 0 {
            return;
        }
        for (c, levels) in self.levels.iter().enumerate() {
            let (percentiles, truncated_mean) = self.layout.channel_slots(row, c);
            percentiles_in_channel(
                pixels.channel_mut(c),
                levels,
                self.bounds,
                percentiles,
                truncated_mean,
                scratch,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelstat_labels::build_label_lists;

    fn levels(values: &[f64]) -> PercentileLevels {
        PercentileLevels::new(values).unwrap()
    }

    #[test]
    fn test_truncated_mean_rules() {
        let values = [1, 2, 3, 4, 5];
        let level_values = [2.0, 4.0, 3.0, 4.0];
        let mean = |low, high| truncated_mean_of(&values, &level_values, TruncatedMeanBounds::new(low, high));
        assert_eq!(mean(0, 1), 3.0);
        assert_eq!(mean(0, 7), 2.0);
        assert_eq!(mean(1, 1), 4.0);
        assert!(mean(1, 2).is_nan());
        assert_eq!(mean(1, 3), 4.0);
        assert!(mean(9, 0).is_nan());
    }

    #[test]
    fn test_single_object_scenario() {
        let labels = [1, 1, 1, 1, 1];
        let values = [10u16, 50, 20, 40, 30];
        let options = SchedulerOptions::default();
        let lists = build_label_lists(&labels, &options).unwrap();
        let finder = SeparateChannelsFinder::new(
            vec![levels(&[0.5, 0.0, 1.0])],
            Some(TruncatedMeanBounds::new(1, 0)),
        )
        .unwrap();
        let result = finder.find(&lists, &[&values[..]], &options).unwrap();
        assert_eq!(result.percentiles_by_channels[0][0], vec![30.0]);
        assert_eq!(result.percentiles_by_channels[0][1], vec![10.0]);
        assert_eq!(result.percentiles_by_channels[0][2], vec![50.0]);
        assert_eq!(result.truncated_means_by_channels.unwrap()[0], vec![20.0]);
    }

    #[test]
    fn test_empty_object_and_empty_levels() {
        let labels = [1, 1, 3];
        let first = [1.0f32, 3.0, 7.0];
        let second = [2.0f32, 4.0, 8.0];
        let options = SchedulerOptions::default();
        let lists = build_label_lists(&labels, &options).unwrap();
        let finder = SeparateChannelsFinder::new(
            vec![levels(&[0.0, 1.0]), PercentileLevels::empty()],
            Some(TruncatedMeanBounds::new(0, 1)),
        )
        .unwrap();
        let result = finder.find(&lists, &[&first[..], &second[..]], &options).unwrap();
        assert_eq!(result.cardinalities, vec![2, 0, 1]);
        assert_eq!(result.percentiles_by_channels[0][1][0], 3.0);
        assert!(result.percentiles_by_channels[0][0][1].is_nan());
        assert!(result.percentiles_by_channels[1].is_empty());
        let truncated = result.truncated_means_by_channels.unwrap();
        assert_eq!(truncated[0][0], 2.0);
        assert!(truncated[0][1].is_nan());
        assert_eq!(truncated[0][2], 7.0);
        assert!(truncated[1].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_byte_path_matches_sorting() {
        let n = 200;
        let labels = vec![1; n];
        let values: Vec<u8> = (0..n).map(|k| ((k * 89) % 256) as u8).collect();
        let widened: Vec<u16> = values.iter().map(|&v| u16::from(v)).collect();
        let options = SchedulerOptions::default();
        let lists = build_label_lists(&labels, &options).unwrap();
        let finder = SeparateChannelsFinder::new(
            vec![levels(&[0.9, 0.1, 0.5, 0.25])],
            Some(TruncatedMeanBounds::new(1, 0)),
        )
        .unwrap();
        let bytes = finder.find(&lists, &[&values[..]], &options).unwrap();
        let shorts = finder.find(&lists, &[&widened[..]], &options).unwrap();
        assert_eq!(bytes, shorts);
    }
}
