//! Synthetic label images and value channels
//!
//! All generators are driven by a seeded [`StdRng`], so every regression
//! test sees the same input on every run.

use crate::error::{TestError, TestResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Create a reproducible random number generator
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Random labels in `1..=max_label`, with background pixels mixed in
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `len` - Number of pixels
/// * `max_label` - Largest label value
/// * `background_fraction` - Probability of a pixel being background
pub fn random_labels(
    rng: &mut StdRng,
    len: usize,
    max_label: i32,
    background_fraction: f64,
) -> TestResult<Vec<i32>> {
    if max_label <= 0 {
        return Err(TestError::InvalidParameter(format!(
            "max_label must be positive, got {}",
            max_label
        )));
    }
    if !(0.0..=1.0).contains(&background_fraction) {
        return Err(TestError::InvalidParameter(format!(
            "background fraction {} out of [0, 1]",
            background_fraction
        )));
    }
    Ok((0..len)
        .map(|_| {
            if rng.random_bool(background_fraction) {
                0
            } else {
                rng.random_range(1..=max_label)
            }
        })
        .collect())
}

/// Square tiles of `tile` x `tile` pixels, each with its own label
///
/// Every third tile is background, so labels have gaps in their spatial
/// layout but remain contiguous in value.
pub fn tiled_labels(width: usize, height: usize, tile: usize) -> TestResult<Vec<i32>> {
    if tile == 0 {
        return Err(TestError::InvalidParameter("tile size must be positive".into()));
    }
    let columns = width.div_ceil(tile);
    let mut labels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let index = (y / tile) * columns + x / tile;
            labels.push(if index % 3 == 2 {
                0
            } else {
                (index - index / 3) as i32 + 1
            });
        }
    }
    Ok(labels)
}

/// Random bytes in `0..=max`
pub fn random_bytes(rng: &mut StdRng, len: usize, max: u8) -> Vec<u8> {
    (0..len).map(|_| rng.random_range(0..=max)).collect()
}

/// Random 16-bit values in `0..=max`
pub fn random_shorts(rng: &mut StdRng, len: usize, max: u16) -> Vec<u16> {
    (0..len).map(|_| rng.random_range(0..=max)).collect()
}

/// Random floats in `[0, 1)`
pub fn random_floats(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.random::<f32>()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_labels_range() {
        let mut rng = seeded_rng(1);
        let labels = random_labels(&mut rng, 1000, 7, 0.25).unwrap();
        assert!(labels.iter().all(|&l| (0..=7).contains(&l)));
        assert!(labels.contains(&0));
        assert!(random_labels(&mut rng, 10, 0, 0.5).is_err());
    }

    #[test]
    fn test_tiled_labels() {
        let labels = tiled_labels(6, 2, 2).unwrap();
        assert_eq!(labels, vec![1, 1, 2, 2, 0, 0, 1, 1, 2, 2, 0, 0]);
        assert!(tiled_labels(4, 4, 0).is_err());
    }

    #[test]
    fn test_reproducible() {
        let a = random_bytes(&mut seeded_rng(5), 64, 255);
        let b = random_bytes(&mut seeded_rng(5), 64, 255);
        assert_eq!(a, b);
    }
}
