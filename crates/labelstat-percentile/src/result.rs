//! Per-object percentile results

use labelstat_labels::ObjectRows;

/// Placement of the result slots of every channel within an object row
///
/// Channel `c` owns `level_counts[c]` percentile slots followed, when
/// truncated means are requested, by one truncated mean slot.
#[derive(Debug, Clone)]
pub(crate) struct RowLayout {
    level_counts: Vec<usize>,
    offsets: Vec<usize>,
    truncated: bool,
    row_len: usize,
}

impl RowLayout {
    pub(crate) fn new(level_counts: Vec<usize>, truncated: bool) -> Self {
        let mut offsets = Vec::with_capacity(level_counts.len());
        let mut row_len = 0;
        for &count in &level_counts {
            offsets.push(row_len);
            row_len += count + usize::from(truncated);
        }
        Self {
            level_counts,
            offsets,
            truncated,
            row_len,
        }
    }

    pub(crate) fn row_len(&self) -> usize {
        self.row_len
    }

    /// Percentile slots and truncated mean slot of channel `c`
    pub(crate) fn channel_slots<'a>(
        &self,
        row: &'a mut [f32],
        c: usize,
    ) -> (&'a mut [f32], Option<&'a mut f32>) {
        let start = self.offsets[c];
        let end = start + self.level_counts[c] + usize::from(self.truncated);
        let (percentiles, truncated) = row[start..end].split_at_mut(self.level_counts[c]);
        (percentiles, truncated.first_mut())
    }

    pub(crate) fn collect(&self, rows: &ObjectRows) -> ChannelPercentiles {
        let max_label = rows.max_label();
        let percentiles_by_channels: Vec<Vec<Vec<f32>>> = self
            .level_counts
            .iter()
            .zip(&self.offsets)
            .map(|(&count, &offset)| {
                (0..count)
                    .map(|k| (1..=max_label).map(|label| rows.row(label)[offset + k]).collect())
                    .collect()
            })
            .collect();
        let truncated_means_by_channels: Option<Vec<Vec<f32>>> = self.truncated.then(|| {
            self.level_counts
                .iter()
                .zip(&self.offsets)
                .map(|(&count, &offset)| {
                    (1..=max_label)
                        .map(|label| rows.row(label)[offset + count])
                        .collect()
                })
                .collect()
        });
        ChannelPercentiles {
            cardinalities: rows.cardinalities().to_vec(),
            percentiles_by_channels,
            truncated_means_by_channels,
        }
    }
}

/// Percentiles of every labelled object
///
/// Values are in the units of the pixel values (unscaled); labels without
/// pixels carry NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPercentiles {
    /// Pixel count per label, index `label - 1`
    pub cardinalities: Vec<i32>,
    /// `percentiles_by_channels[c][k][label - 1]`: level `k` of channel `c`
    pub percentiles_by_channels: Vec<Vec<Vec<f32>>>,
    /// `truncated_means_by_channels[c][label - 1]`, when requested
    pub truncated_means_by_channels: Option<Vec<Vec<f32>>>,
}

impl ChannelPercentiles {
    /// Highest label measured
    pub fn max_label(&self) -> usize {
        self.cardinalities.len()
    }

    /// Number of measured channels
    pub fn number_of_channels(&self) -> usize {
        self.percentiles_by_channels.len()
    }

    /// Percentile of level index `level` for every object and channel
    ///
    /// The result is interleaved: `result[(label - 1) * channels + c]`.
    /// Channels with fewer levels than `level + 1` yield NaN.
    pub fn grouped_by_level(&self, level: usize, scale: f64) -> Vec<f32> {
        let channels = self.number_of_channels();
        let mut result = vec![f32::NAN; self.max_label() * channels];
        for (c, levels) in self.percentiles_by_channels.iter().enumerate() {
            if let Some(values) = levels.get(level) {
                for (label, &v) in values.iter().enumerate() {
                    result[label * channels + c] = (f64::from(v) * scale) as f32;
                }
            }
        }
        result
    }

    /// Difference between the percentiles of level indexes `high` and `low`
    ///
    /// Interleaved like [`Self::grouped_by_level`].
    pub fn range(&self, low: usize, high: usize, scale: f64) -> Vec<f32> {
        let lows = self.grouped_by_level(low, scale);
        let highs = self.grouped_by_level(high, scale);
        highs.iter().zip(&lows).map(|(h, l)| h - l).collect()
    }

    /// Interleaved truncated means, if they were requested
    pub fn truncated_means(&self, scale: f64) -> Option<Vec<f32>> {
        let by_channels = self.truncated_means_by_channels.as_ref()?;
        let channels = by_channels.len();
        let mut result = vec![f32::NAN; self.max_label() * channels];
        for (c, values) in by_channels.iter().enumerate() {
            for (label, &v) in values.iter().enumerate() {
                result[label * channels + c] = (f64::from(v) * scale) as f32;
            }
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_slots() {
        let layout = RowLayout::new(vec![2, 0, 1], true);
        assert_eq!(layout.row_len(), 6);
        let mut row = [0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0];
        let (percentiles, truncated) = layout.channel_slots(&mut row, 1);
        assert!(percentiles.is_empty());
        assert_eq!(truncated.copied(), Some(3.0));
        let (percentiles, _) = layout.channel_slots(&mut row, 2);
        assert_eq!(percentiles, &[4.0]);
    }

    #[test]
    fn test_grouped_and_range() {
        let result = ChannelPercentiles {
            cardinalities: vec![3, 1],
            percentiles_by_channels: vec![
                vec![vec![1.0, 2.0], vec![5.0, 2.0]],
                vec![vec![10.0, 20.0]],
            ],
            truncated_means_by_channels: None,
        };
        assert_eq!(result.grouped_by_level(0, 1.0), vec![1.0, 10.0, 2.0, 20.0]);
        let second = result.grouped_by_level(1, 0.5);
        assert_eq!(second[0], 2.5);
        assert!(second[1].is_nan());
        assert_eq!(result.range(0, 1, 1.0)[2], 0.0);
        assert!(result.truncated_means(1.0).is_none());
    }
}
