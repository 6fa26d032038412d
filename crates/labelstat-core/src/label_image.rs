//! Label images
//!
//! A label image is a dense row-major `i32` array: `0` is background and
//! every positive value identifies one object. The array is never mutated;
//! masking produces a private copy.

use crate::element::Element;
use crate::error::{Error, Result};
use std::borrow::Cow;

/// A label array together with its dimensions
#[derive(Debug, Clone)]
pub struct LabelImage<'a> {
    labels: Cow<'a, [i32]>,
    width: usize,
    height: usize,
}

impl<'a> LabelImage<'a> {
    /// Wrap a row-major label array
    ///
    /// # Arguments
    ///
    /// * `labels` - Label per pixel, `0` for background
    /// * `width` - Number of columns
    /// * `height` - Number of rows
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `width * height` differs from
    /// the array length.
    pub fn new(labels: &'a [i32], width: usize, height: usize) -> Result<Self> {
        if width.checked_mul(height) != Some(labels.len()) {
            return Err(Error::InvalidDimensions {
                width,
                height,
                len: labels.len(),
            });
        }
        Ok(Self {
            labels: Cow::Borrowed(labels),
            width,
            height,
        })
    }

    /// Wrap a label array as a single row
    pub fn from_slice(labels: &'a [i32]) -> Self {
        Self {
            width: labels.len(),
            height: 1,
            labels: Cow::Borrowed(labels),
        }
    }

    /// Clear every label whose mask value is zero
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the mask does not cover the image.
    pub fn with_mask<M: Element>(self, mask: &[M]) -> Result<LabelImage<'a>> {
        if mask.len() != self.labels.len() {
            return Err(Error::LengthMismatch {
                what: "mask",
                expected: self.labels.len(),
                actual: mask.len(),
            });
        }
        let mut labels = self.labels.into_owned();
        for (label, m) in labels.iter_mut().zip(mask) {
            if m.is_zero() {
                *label = 0;
            }
        }
        Ok(LabelImage {
            labels: Cow::Owned(labels),
            width: self.width,
            height: self.height,
        })
    }

    /// The label array
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check whether the image has no pixels
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_checked() {
        let labels = [0, 1, 1, 2, 2, 2];
        let image = LabelImage::new(&labels, 3, 2).unwrap();
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert_eq!(image.len(), 6);
        assert!(matches!(
            LabelImage::new(&labels, 4, 2),
            Err(Error::InvalidDimensions { width: 4, height: 2, len: 6 })
        ));
    }

    #[test]
    fn test_mask_clears_labels() {
        let labels = [1, 1, 2, 2];
        let mask = [255u8, 0, 0, 7];
        let image = LabelImage::from_slice(&labels).with_mask(&mask).unwrap();
        assert_eq!(image.labels(), &[1, 0, 0, 2]);
        assert_eq!(labels, [1, 1, 2, 2]);
    }

    #[test]
    fn test_mask_length_checked() {
        let labels = [1, 2];
        let mask = [1.0f32];
        assert!(LabelImage::from_slice(&labels).with_mask(&mask).is_err());
    }
}
