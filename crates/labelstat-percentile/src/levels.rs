//! Validated sets of percentile levels

use crate::error::{PercentileError, PercentileResult};

/// Percentile levels of one channel
///
/// Keeps the levels in their requested order together with an ascending
/// copy and, for each ascending position, the index of that level in the
/// requested order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PercentileLevels {
    levels: Vec<f64>,
    sorted: Vec<f64>,
    unsorted_indexes: Vec<usize>,
}

impl PercentileLevels {
    /// Create a level set
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::InvalidLevel`] if a level is NaN or
    /// outside `[0, 1]`.
    pub fn new(levels: &[f64]) -> PercentileResult<Self> {
        if let Some(&level) = levels.iter().find(|l| !(0.0..=1.0).contains(*l)) {
            return Err(PercentileError::InvalidLevel { level });
        }
        let mut unsorted_indexes: Vec<usize> = (0..levels.len()).collect();
        unsorted_indexes.sort_by(|&a, &b| levels[a].total_cmp(&levels[b]));
        let sorted = unsorted_indexes.iter().map(|&k| levels[k]).collect();
        Ok(Self {
            levels: levels.to_vec(),
            sorted,
            unsorted_indexes,
        })
    }

    /// Empty level set
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Levels in requested order
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Levels in ascending order
    pub fn sorted(&self) -> &[f64] {
        &self.sorted
    }

    /// `unsorted_indexes()[k]` is the requested position of `sorted()[k]`
    pub fn unsorted_indexes(&self) -> &[usize] {
        &self.unsorted_indexes
    }
}

/// Level indexes bounding a truncated mean
///
/// Both are indexes into a channel's requested level order, not levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncatedMeanBounds {
    pub low: usize,
    pub high: usize,
}

impl TruncatedMeanBounds {
    pub fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorting() {
        let levels = PercentileLevels::new(&[0.8, 0.2, 0.5]).unwrap();
        assert_eq!(levels.sorted(), &[0.2, 0.5, 0.8]);
        assert_eq!(levels.unsorted_indexes(), &[1, 2, 0]);
        assert_eq!(levels.levels(), &[0.8, 0.2, 0.5]);
    }

    #[test]
    fn test_invalid_levels() {
        assert!(PercentileLevels::new(&[1.5]).is_err());
        assert!(PercentileLevels::new(&[-0.1]).is_err());
        assert!(PercentileLevels::new(&[f64::NAN]).is_err());
        assert!(PercentileLevels::new(&[]).unwrap().is_empty());
    }
}
