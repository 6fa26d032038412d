//! Brute-force reference statistics
//!
//! Straightforward serial implementations used to check the parallel
//! engine: full sorts instead of selection, plain loops instead of blocks.

/// Index of the percentile at `level` among `n` sorted values
pub fn percentile_index(level: f64, n: usize) -> usize {
    let index = (level * (n as f64 - 1.0)).round();
    if index.is_nan() || index < 0.0 {
        0
    } else {
        (index as usize).min(n.saturating_sub(1))
    }
}

/// Percentile at `level` by fully sorting the values; NaN if empty
pub fn percentile(values: &[f64], level: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted[percentile_index(level, sorted.len())]
}

/// Mean of the values lying in `[percentile(low), percentile(high)]`
pub fn truncated_mean(values: &[f64], low: f64, high: f64) -> f64 {
    let low_value = percentile(values, low);
    let high_value = percentile(values, high);
    if values.is_empty() || low_value > high_value {
        return f64::NAN;
    }
    let inside: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| *v >= low_value && *v <= high_value)
        .collect();
    inside.iter().sum::<f64>() / inside.len() as f64
}

/// Values of `channel` at the pixels of `label`, in pixel order
pub fn object_values<T: Copy + Into<f64>>(labels: &[i32], channel: &[T], label: i32) -> Vec<f64> {
    labels
        .iter()
        .zip(channel)
        .filter(|(l, _)| **l == label)
        .map(|(_, v)| (*v).into())
        .collect()
}

/// Pixel count per label, index `label - 1`
pub fn cardinalities(labels: &[i32]) -> Vec<i32> {
    let max_label = labels.iter().copied().max().unwrap_or(0).max(0) as usize;
    let mut counts = vec![0; max_label];
    for &label in labels {
        if label > 0 {
            counts[label as usize - 1] += 1;
        }
    }
    counts
}
