//! Percentiles ranked by a separate channel
//!
//! The pixels of an object are ranked by one extra channel (for example
//! the brightness of a colour image). For each common level the ranking
//! value at that percentile is selected, and every result channel reports
//! its values at the pixels holding that ranking value. Truncated means
//! average the result channels over the pixels whose ranking value lies
//! between the two bounding percentiles.
//!
//! The ranking channel is streamed twice: one copy keeps pixel order and is
//! used to find matching pixels, the other is reordered by selection.
//! Channels marked separate are measured on their own, with their own
//! levels, exactly as [`crate::SeparateChannelsFinder`] does.

use crate::error::{PercentileError, PercentileResult};
use crate::levels::{PercentileLevels, TruncatedMeanBounds};
use crate::result::{ChannelPercentiles, RowLayout};
use crate::separate::{SelectionScratch, percentiles_in_channel};
use labelstat_core::{Element, SchedulerOptions};
use labelstat_labels::{LabelLists, ObjectPixels, SingleObjectProcessor, process_objects};

/// How result channels are read at a selected ranking value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommonLevelsTieMode {
    /// Average over all pixels whose ranking value equals the selected one
    #[default]
    AverageTies,
    /// Take the first such pixel in list order
    SinglePixel,
}

/// Per-worker state of [`CommonLevelsFinder`]
#[derive(Debug, Default)]
pub struct CommonLevelsScratch {
    selection: SelectionScratch,
    sums: Vec<f64>,
}

/// Finder sharing the levels of the first channel across channels, ranked
/// by an extra channel
#[derive(Debug, Clone)]
pub struct CommonLevelsFinder {
    levels: Vec<PercentileLevels>,
    common: PercentileLevels,
    separate: Vec<bool>,
    common_channels: Vec<usize>,
    bounds: Option<TruncatedMeanBounds>,
    tie_mode: CommonLevelsTieMode,
    layout: RowLayout,
}

fn average(sum: f64, count: usize) -> f32 {
    if count == 0 {
        f32::NAN
    } else {
        (sum / count as f64) as f32
    }
}

impl CommonLevelsFinder {
    /// Create a finder
    ///
    /// # Arguments
    ///
    /// * `levels_by_channels` - One level set per result channel; the first
    ///   one is the common level set
    /// * `bounds` - Level indexes of the truncated mean, if requested
    /// * `separate_channels` - Channels measured with their own levels
    /// * `tie_mode` - How pixels sharing the selected ranking value are read
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::InvalidParameters`] if no channel is
    /// given, a separate channel index is out of range, or the truncated
    /// mean bounds are not common levels.
    pub fn new(
        levels_by_channels: Vec<PercentileLevels>,
        bounds: Option<TruncatedMeanBounds>,
        separate_channels: &[usize],
        tie_mode: CommonLevelsTieMode,
    ) -> PercentileResult<Self> {
        let Some(common) = levels_by_channels.first().cloned() else {
            return Err(PercentileError::InvalidParameters(
                "at least one channel of levels is required".into(),
            ));
        };
        let m = levels_by_channels.len();
        let mut separate = vec![false; m];
        for &c in separate_channels {
            *separate.get_mut(c).ok_or_else(|| {
                PercentileError::InvalidParameters(format!(
                    "separate channel {c} out of range 0..{m}"
                ))
            })? = true;
        }
        if let Some(b) = bounds {
            if b.low >= common.len() || b.high >= common.len() {
                return Err(PercentileError::InvalidParameters(format!(
                    "truncated mean levels {}, {} outside {} common levels",
                    b.low,
                    b.high,
                    common.len()
                )));
            }
        }
        let level_counts = levels_by_channels
            .iter()
            .zip(&separate)
            .map(|(levels, &own)| if own { levels.len() } else { common.len() })
            .collect();
        let common_channels = (0..m).filter(|&c| !separate[c]).collect();
        Ok(Self {
            levels: levels_by_channels,
            common,
            separate,
            common_channels,
            bounds,
            tie_mode,
            layout: RowLayout::new(level_counts, bounds.is_some()),
        })
    }

    /// Number of result channels
    pub fn number_of_channels(&self) -> usize {
        self.levels.len()
    }

    /// Check whether every channel is measured with its own levels
    pub fn all_channels_separate(&self) -> bool {
        self.separate.iter().all(|&s| s)
    }

    /// Find the percentiles of every object
    ///
    /// # Arguments
    ///
    /// * `lists` - Pixel lists of the label image
    /// * `channels` - At least [`Self::number_of_channels`] result channels
    /// * `ranking` - Channel ranking the pixels
    /// * `options` - Scheduling options
    pub fn find<T: Element>(
        &self,
        lists: &LabelLists,
        channels: &[&[T]],
        ranking: &[T],
        options: &SchedulerOptions,
    ) -> PercentileResult<ChannelPercentiles> {
        let m = self.number_of_channels();
        if channels.len() < m {
            return Err(PercentileError::InvalidParameters(format!(
                "{} channels given, {m} required",
                channels.len()
            )));
        }
        let mut streamed = channels[..m].to_vec();
        streamed.push(ranking);
        streamed.push(ranking);
        let rows = process_objects(lists, &streamed, self, options)?;
        Ok(self.layout.collect(&rows))
    }
}

impl<T: Element> SingleObjectProcessor<T> for CommonLevelsFinder {
    type Scratch = CommonLevelsScratch;

    fn row_len(&self) -> usize {
        self.layout.row_len()
    }

    fn create_scratch(&self) -> CommonLevelsScratch {
        CommonLevelsScratch {
            selection: SelectionScratch::default(),
            sums: vec![0.0; 3 * self.levels.len()],
        }
    }

    fn process_pixels(
        &self,
        label: usize,
        pixels: &mut ObjectPixels<'_, T>,
        row: &mut [f32],
        scratch: &mut CommonLevelsScratch,
    ) {
        if label == 0 {
            return;
        }
        if pixels.is_empty() {
            row.fill(f32::NAN);
            return;
        }
        let m = self.levels.len();
        for c in (0..m).filter(|&c| self.separate[c]) {
            let (percentiles, truncated_mean) = self.layout.channel_slots(row, c);
            percentiles_in_channel(
                pixels.channel_mut(c),
                &self.levels[c],
                self.bounds,
                percentiles,
                truncated_mean,
                &mut scratch.selection,
            );
        }
        if self.all_channels_separate() {
            return;
        }
        let Some((channels, sorted_ranking)) = pixels.split_last_mut() else {
            return;
        };
        scratch.selection.find_level_values(sorted_ranking, &self.common);
        let selected = scratch.selection.level_values();
        let ranking = channels.channel(m);
        let common = &self.common_channels;

        for (k, &value) in selected.iter().enumerate() {
            if self.bounds.is_some_and(|b| k == b.low || k == b.high) {
                continue;
            }
            let sums = &mut scratch.sums[..m];
            sums.fill(0.0);
            let mut count = 0;
            for (j, r) in ranking.iter().enumerate() {
                if r.to_f64() != value {
                    continue;
                }
                for &c in common {
                    sums[c] += channels.channel(c)[j].to_f64();
                }
                count += 1;
                if self.tie_mode == CommonLevelsTieMode::SinglePixel {
                    break;
                }
            }
            for &c in common {
                self.layout.channel_slots(row, c).0[k] = average(sums[c], count);
            }
        }

        let Some(bounds) = self.bounds else {
            return;
        };
        let (low, high) = (selected[bounds.low], selected[bounds.high]);
        scratch.sums.fill(0.0);
        let (inside_sums, rest) = scratch.sums.split_at_mut(m);
        let (low_sums, high_sums) = rest.split_at_mut(m);
        let (mut inside_count, mut low_count, mut high_count) = (0usize, 0usize, 0usize);
        let single = self.tie_mode == CommonLevelsTieMode::SinglePixel;
        // Bound percentiles are read even when the bounds are crossed
        for (j, r) in ranking.iter().enumerate() {
            let r = r.to_f64();
            let take_low = r == low && !(single && low_count > 0);
            let take_high = r == high && !(single && high_count > 0);
            let inside = low <= r && r <= high;
            if !(take_low || take_high || inside) {
                continue;
            }
            low_count += usize::from(take_low);
            high_count += usize::from(take_high);
            inside_count += usize::from(inside);
            for &c in common {
                let v = channels.channel(c)[j].to_f64();
                if inside {
                    inside_sums[c] += v;
                }
                if take_low {
                    low_sums[c] += v;
                }
                if take_high {
                    high_sums[c] += v;
                }
            }
        }
        for &c in common {
            let (percentiles, truncated_mean) = self.layout.channel_slots(row, c);
            percentiles[bounds.low] = average(low_sums[c], low_count);
            percentiles[bounds.high] = average(high_sums[c], high_count);
            if let Some(mean) = truncated_mean {
                *mean = average(inside_sums[c], inside_count);
            }
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
    fn test_colour_by_ranking() {
        let labels = [1, 1, 1, 1];
        let red = [10.0f32, 20.0, 30.0, 40.0];
        let green = [1.0f32, 2.0, 3.0, 4.0];
        let ranking = [3.0f32, 1.0, 4.0, 2.0];
        let options = SchedulerOptions::default();
        let lists = build_label_lists(&labels, &options).unwrap();
        let finder = CommonLevelsFinder::new(
            vec![levels(&[1.0, 0.0]), levels(&[0.5])],
            None,
            &[],
            CommonLevelsTieMode::default(),
        )
        .unwrap();
        let result = finder.find(&lists, &[&red[..], &green[..]], &ranking, &options).unwrap();
        assert_eq!(result.percentiles_by_channels[0][0], vec![30.0]);
        assert_eq!(result.percentiles_by_channels[0][1], vec![20.0]);
        assert_eq!(result.percentiles_by_channels[1][0], vec![3.0]);
        assert_eq!(result.percentiles_by_channels[1][1], vec![2.0]);
    }

    #[test]
    fn test_ties_and_truncated_mean() {
        let labels = [1, 1, 1, 1, 1];
        let values = [10u8, 20, 30, 40, 50];
        let ranking = [5u8, 5, 1, 9, 7];
        let options = SchedulerOptions::default();
        let lists = build_label_lists(&labels, &options).unwrap();
        let common = vec![levels(&[0.5, 0.25, 0.75])];
        let bounds = Some(TruncatedMeanBounds::new(1, 2));

        let averaged = CommonLevelsFinder::new(common.clone(), bounds, &[], CommonLevelsTieMode::AverageTies)
            .unwrap()
            .find(&lists, &[&values[..]], &ranking, &options)
            .unwrap();
        assert_eq!(averaged.percentiles_by_channels[0][0], vec![15.0]);
        assert_eq!(averaged.percentiles_by_channels[0][1], vec![15.0]);
        assert_eq!(averaged.percentiles_by_channels[0][2], vec![50.0]);
        assert_eq!(averaged.truncated_means_by_channels.as_ref().unwrap()[0], vec![80.0 / 3.0]);

        let single = CommonLevelsFinder::new(common, bounds, &[], CommonLevelsTieMode::SinglePixel)
            .unwrap()
            .find(&lists, &[&values[..]], &ranking, &options)
            .unwrap();
        // Lists are built by prepending, so pixel 1 precedes pixel 0
        assert_eq!(single.percentiles_by_channels[0][0], vec![20.0]);
        assert_eq!(single.percentiles_by_channels[0][1], vec![20.0]);
        assert_eq!(
            single.truncated_means_by_channels.unwrap()[0],
            averaged.truncated_means_by_channels.unwrap()[0]
        );
    }

    #[test]
    fn test_crossed_bounds_keep_bound_percentiles() {
        let labels = [1, 1, 1, 1, 1];
        let values = [10u8, 20, 30, 40, 50];
        let ranking = [1u8, 2, 3, 4, 5];
        let options = SchedulerOptions::default();
        let lists = build_label_lists(&labels, &options).unwrap();
        let bounds = Some(TruncatedMeanBounds::new(0, 1));
        for tie_mode in [CommonLevelsTieMode::AverageTies, CommonLevelsTieMode::SinglePixel] {
            let result = CommonLevelsFinder::new(vec![levels(&[0.9, 0.1])], bounds, &[], tie_mode)
                .unwrap()
                .find(&lists, &[&values[..]], &ranking, &options)
                .unwrap();
            assert_eq!(result.percentiles_by_channels[0][0], vec![50.0]);
            assert_eq!(result.percentiles_by_channels[0][1], vec![10.0]);
            assert!(result.truncated_means_by_channels.unwrap()[0][0].is_nan());
        }
    }

    #[test]
    fn test_separate_channel_keeps_own_levels() {
        let labels = [0, 2, 2, 2];
        let first = [0i32, 7, 8, 9];
        let second = [0i32, 300, 100, 200];
        let ranking = [0i32, 3, 2, 1];
        let options = SchedulerOptions::default();
        let lists = build_label_lists(&labels, &options).unwrap();
        let finder = CommonLevelsFinder::new(
            vec![levels(&[0.0]), levels(&[1.0, 0.5])],
            None,
            &[1],
            CommonLevelsTieMode::AverageTies,
        )
        .unwrap();
        let result = finder.find(&lists, &[&first[..], &second[..]], &ranking, &options).unwrap();
        assert!(result.percentiles_by_channels[0][0][0].is_nan());
        assert_eq!(result.percentiles_by_channels[0][0][1], 9.0);
        assert_eq!(result.percentiles_by_channels[1][0][1], 300.0);
        assert_eq!(result.percentiles_by_channels[1][1][1], 200.0);
    }

    #[test]
    fn test_invalid_configuration() {
        let common = vec![levels(&[0.5])];
        assert!(CommonLevelsFinder::new(vec![], None, &[], CommonLevelsTieMode::default()).is_err());
        assert!(CommonLevelsFinder::new(common.clone(), None, &[3], CommonLevelsTieMode::default()).is_err());
        assert!(
            CommonLevelsFinder::new(common, Some(TruncatedMeanBounds::new(0, 1)), &[], CommonLevelsTieMode::default())
                .is_err()
        );
    }
}
