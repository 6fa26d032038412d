//! Growable label-indexed accumulators
//!
//! Reducers do not know the number of labels in advance. Their per-worker
//! arrays are indexed directly by label value and grown by doubling when a
//! larger label shows up. Growth is capped at [`MAX_ALLOWED_LABEL`]: a label
//! above it most likely means the input is not a label image at all, and
//! allocating for it would only exhaust memory.

use crate::error::{Error, Result};

/// Largest label value accepted by the reducers
///
/// Keeps `(label + 1) * 2` representable as a 32-bit signed integer.
pub const MAX_ALLOWED_LABEL: i32 = i32::MAX / 2 - 1;

const MIN_LABEL_CAPACITY: usize = 16;

/// Compute the length an array must grow to so that it can be indexed by
/// `label`
///
/// # Errors
///
/// Returns [`Error::TooLargeLabel`] if `label > MAX_ALLOWED_LABEL`.
pub fn increased_capacity_for_label(label: usize, current_len: usize) -> Result<usize> {
    let max = MAX_ALLOWED_LABEL as usize;
    if label > max {
        return Err(Error::TooLargeLabel {
            label: label as i64,
            max: MAX_ALLOWED_LABEL,
        });
    }
    let mut new_len = current_len.max(MIN_LABEL_CAPACITY);
    while new_len <= label {
        new_len = (new_len * 2).min(max + 1);
    }
    Ok(new_len)
}

/// Ensure `array` can be indexed by `label`, zero-filling new slots
///
/// # Errors
///
/// Returns [`Error::TooLargeLabel`] if `label > MAX_ALLOWED_LABEL`.
pub fn ensure_capacity_for_label<T: Copy + Default>(array: &mut Vec<T>, label: usize) -> Result<()> {
    if label < array.len() {
        return Ok(());
    }
    let new_len = increased_capacity_for_label(label, array.len())?;
    array.resize(new_len, T::default());
    Ok(())
}

/// Grow several same-shaped arrays in lockstep to one identical length
///
/// # Errors
///
/// Returns [`Error::TooLargeLabel`] if `label > MAX_ALLOWED_LABEL`.
pub fn ensure_several_capacity_for_label<T: Copy + Default>(
    arrays: &mut [Vec<T>],
    label: usize,
) -> Result<()> {
    let current = arrays.iter().map(Vec::len).min().unwrap_or(0);
    if label < current {
        return Ok(());
    }
    let longest = arrays.iter().map(Vec::len).max().unwrap_or(0);
    let new_len = increased_capacity_for_label(label, longest)?;
    for array in arrays.iter_mut() {
        array.resize(new_len, T::default());
    }
    Ok(())
}

/// Ensure per-channel pixel buffers can store element `index`
///
/// Buffers grow by doubling in lockstep, never beyond the total number of
/// pixels of the image.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `index` is not below
/// `total_pixels`; a list visiting more pixels than the image holds is
/// corrupted.
pub fn ensure_capacity_for_pixels<B, T>(buffers: &mut [B], total_pixels: usize, index: usize) -> Result<()>
where
    B: std::ops::DerefMut<Target = Vec<T>>,
    T: Copy + Default,
{
    let current = buffers.iter().map(|b| b.len()).min().unwrap_or(0);
    if index < current {
        return Ok(());
    }
    if index >= total_pixels {
        return Err(Error::InvalidParameter(format!(
            "required number of elements {} > total number of pixels {}",
            index + 1,
            total_pixels
        )));
    }
    let mut new_len = current.max(1);
    while index >= new_len {
        new_len = (new_len * 2).min(total_pixels);
    }
    for buffer in buffers.iter_mut() {
        buffer.resize(new_len, T::default());
    }
    Ok(())
}

/// Convert a label count times channel count into a checked dense length
///
/// # Errors
///
/// Returns [`Error::TooLargeArray`] if the product exceeds `i32::MAX`.
pub fn checked_dense_len(what: &'static str, max_label: usize, number_of_channels: usize) -> Result<usize> {
    let elements = max_label as u64 * number_of_channels as u64;
    if elements > i32::MAX as u64 {
        return Err(Error::TooLargeArray { what, elements });
    }
    Ok(elements as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_by_doubling() {
        let mut counts: Vec<i32> = vec![1, 2, 3];
        ensure_capacity_for_label(&mut counts, 20).unwrap();
        assert_eq!(counts.len(), 32);
        assert_eq!(&counts[..4], &[1, 2, 3, 0]);
        ensure_capacity_for_label(&mut counts, 31).unwrap();
        assert_eq!(counts.len(), 32);
        ensure_capacity_for_label(&mut counts, 32).unwrap();
        assert_eq!(counts.len(), 64);
    }

    #[test]
    fn test_too_large_label() {
        let mut counts: Vec<i32> = Vec::new();
        let result = ensure_capacity_for_label(&mut counts, MAX_ALLOWED_LABEL as usize + 1);
        assert!(matches!(result, Err(Error::TooLargeLabel { .. })));
        assert!(counts.is_empty());
    }

    #[test]
    fn test_capacity_capped_at_max_label() {
        let len = increased_capacity_for_label(MAX_ALLOWED_LABEL as usize, 1 << 29).unwrap();
        assert_eq!(len, MAX_ALLOWED_LABEL as usize + 1);
    }

    #[test]
    fn test_several_arrays_in_lockstep() {
        let mut sums = vec![vec![1.0f64; 16], vec![2.0f64; 16]];
        ensure_several_capacity_for_label(&mut sums, 40).unwrap();
        assert_eq!(sums[0].len(), 64);
        assert_eq!(sums[1].len(), 64);
        assert_eq!(sums[1][15], 2.0);
        assert_eq!(sums[1][16], 0.0);
    }

    #[test]
    fn test_pixel_capacity_capped_by_total() {
        let mut first = vec![0u8; 4];
        let mut second = vec![0u8; 4];
        let mut buffers = [&mut first, &mut second];
        ensure_capacity_for_pixels(&mut buffers, 6, 4).unwrap();
        assert_eq!(buffers[0].len(), 6);
        assert_eq!(buffers[1].len(), 6);
        assert!(ensure_capacity_for_pixels(&mut buffers, 6, 6).is_err());
    }

    #[test]
    fn test_dense_len_overflow() {
        assert_eq!(checked_dense_len("sums", 10, 3).unwrap(), 30);
        assert!(matches!(
            checked_dense_len("sums", 1 << 30, 3),
            Err(Error::TooLargeArray { what: "sums", .. })
        ));
    }
}
