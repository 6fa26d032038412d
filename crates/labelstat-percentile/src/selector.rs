//! Partial selection of order statistics
//!
//! Percentiles are read from a partially sorted buffer: only the requested
//! ranks are moved to their sorted positions, using quickselect
//! (`select_nth_unstable_by`) recursively on the two sides of each pivot.
//! Several ranks are brought into place with one partition per distinct
//! rank.

use labelstat_core::Element;

/// Index of the percentile at `level` among `n` sorted values
///
/// `round(level * (n - 1))`, clamped to `[0, n - 1]`.
pub fn percentile_index(level: f64, n: usize) -> usize {
    let index = (level * (n as f64 - 1.0)).round();
    if index.is_nan() || index < 0.0 {
        return 0;
    }
    (index as usize).min(n.saturating_sub(1))
}

/// Move the values of the given ranks to their sorted positions
///
/// `sorted_indexes` must be ascending and below `values.len()`.
pub fn select_indexes<T: Element>(values: &mut [T], sorted_indexes: &[usize]) {
    select_in(values, 0, sorted_indexes);
}

fn select_in<T: Element>(values: &mut [T], offset: usize, targets: &[usize]) {
    if targets.is_empty() || values.len() <= 1 {
        return;
    }
    let target = targets[targets.len() / 2];
    let (left, _, right) = values.select_nth_unstable_by(target - offset, |a, b| a.compare(b));
    let below = targets.partition_point(|&t| t < target);
    let above = targets.partition_point(|&t| t <= target);
    select_in(left, offset, &targets[..below]);
    select_in(right, target + 1, &targets[above..]);
}

/// Move the percentiles at ascending `sorted_levels` to their sorted
/// positions
pub fn select_levels<T: Element>(values: &mut [T], sorted_levels: &[f64]) {
    let n = values.len();
    if n == 0 {
        return;
    }
    let indexes: Vec<usize> = sorted_levels
        .iter()
        .map(|&level| percentile_index(level, n))
        .collect();
    select_indexes(values, &indexes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_index() {
        assert_eq!(percentile_index(0.5, 3), 1);
        assert_eq!(percentile_index(0.0, 10), 0);
        assert_eq!(percentile_index(1.0, 10), 9);
        assert_eq!(percentile_index(0.5, 2), 1);
        assert_eq!(percentile_index(0.2, 1), 0);
        assert_eq!(percentile_index(0.5, 0), 0);
    }

    #[test]
    fn test_multi_target_selection() {
        let mut values: Vec<i32> = (0..200).map(|k| (k * 7919) % 200).collect();
        let targets = [0, 13, 13, 50, 199];
        select_indexes(&mut values, &targets);
        for &t in &targets {
            assert_eq!(values[t], t as i32);
        }
    }

    #[test]
    fn test_select_levels_floats() {
        let mut values = vec![0.9f32, 0.1, 0.5, 0.3, 0.7];
        select_levels(&mut values, &[0.0, 0.5, 1.0]);
        assert_eq!(values[0], 0.1);
        assert_eq!(values[2], 0.5);
        assert_eq!(values[4], 0.9);
    }
}
