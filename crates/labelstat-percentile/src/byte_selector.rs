//! Histogram selection for byte channels

use crate::selector::percentile_index;

/// Minimum number of pixels for which the histogram path replaces
/// partial sorting
pub const MIN_LENGTH_FOR_BYTE_SELECTOR: usize = 128;

/// Counting selector over the 256 byte values
///
/// Finds any set of percentiles in one pass over the values plus one walk
/// over the histogram; the input is left untouched.
#[derive(Debug, Clone)]
pub struct ByteSelector {
    histogram: [u32; 256],
}

impl Default for ByteSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSelector {
    pub fn new() -> Self {
        Self {
            histogram: [0; 256],
        }
    }

    /// Write the percentiles at ascending `sorted_levels` into `results`
    ///
    /// # Arguments
    ///
    /// * `values` - Pixel values; nothing is written when empty
    /// * `sorted_levels` - Ascending levels in `[0, 1]`
    /// * `results` - One slot per level, in the same order
    pub fn select(&mut self, values: &[u8], sorted_levels: &[f64], results: &mut [u8]) {
        debug_assert!(results.len() >= sorted_levels.len());
        if values.is_empty() {
            return;
        }
        self.histogram.fill(0);
        for &v in values {
            self.histogram[v as usize] += 1;
        }
        let n = values.len();
        let mut bin = 0usize;
        let mut cumulative = self.histogram[0] as usize;
        for (result, &level) in results.iter_mut().zip(sorted_levels) {
            let index = percentile_index(level, n);
            while cumulative <= index {
                bin += 1;
                cumulative += self.histogram[bin] as usize;
            }
            *result = bin as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_sorting() {
        let values: Vec<u8> = (0..300u32).map(|k| ((k * 37) % 251) as u8).collect();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        let levels = [0.0, 0.1, 0.25, 0.5, 0.5, 0.9, 1.0];
        let mut results = [0u8; 7];
        ByteSelector::new().select(&values, &levels, &mut results);
        for (k, &level) in levels.iter().enumerate() {
            assert_eq!(results[k], sorted[percentile_index(level, values.len())]);
        }
    }

    #[test]
    fn test_constant_values() {
        let values = [42u8; 200];
        let mut results = [0u8; 2];
        ByteSelector::new().select(&values, &[0.0, 1.0], &mut results);
        assert_eq!(results, [42, 42]);
    }
}
