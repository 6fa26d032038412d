//! Value channels aligned pixel-for-pixel with a label image
//!
//! A request carries one or more channels of a single element type. The
//! typed form is [`Channels`]; [`ChannelSlice`] is the untyped view of one
//! channel, used where a caller mixes sources (for example a separate
//! ranking channel).

use crate::element::Element;
use crate::error::{Error, Result};

/// Runtime tag of a channel element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Unsigned 8-bit
    U8,
    /// Unsigned 16-bit
    U16,
    /// Signed 32-bit
    I32,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl ElementType {
    /// Human-readable type name
    pub fn name(self) -> &'static str {
        match self {
            ElementType::U8 => "u8",
            ElementType::U16 => "u16",
            ElementType::I32 => "i32",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
        }
    }

    /// Check whether the type holds integers
    pub fn is_integer(self) -> bool {
        matches!(self, ElementType::U8 | ElementType::U16 | ElementType::I32)
    }

    /// Largest meaningful value, used for normalizing results
    ///
    /// Float channels are assumed to be already normalized to `[0, 1]`.
    pub fn max_possible_value(self) -> f64 {
        match self {
            ElementType::U8 => u8::MAX as f64,
            ElementType::U16 => u16::MAX as f64,
            ElementType::I32 => i32::MAX as f64,
            ElementType::F32 | ElementType::F64 => 1.0,
        }
    }
}

/// Untyped view of a single channel
#[derive(Debug, Clone, Copy)]
pub enum ChannelSlice<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    I32(&'a [i32]),
    F32(&'a [f32]),
    F64(&'a [f64]),
}

impl<'a> ChannelSlice<'a> {
    /// Element type of the channel
    pub fn element_type(&self) -> ElementType {
        match self {
            ChannelSlice::U8(_) => ElementType::U8,
            ChannelSlice::U16(_) => ElementType::U16,
            ChannelSlice::I32(_) => ElementType::I32,
            ChannelSlice::F32(_) => ElementType::F32,
            ChannelSlice::F64(_) => ElementType::F64,
        }
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        match self {
            ChannelSlice::U8(v) => v.len(),
            ChannelSlice::U16(v) => v.len(),
            ChannelSlice::I32(v) => v.len(),
            ChannelSlice::F32(v) => v.len(),
            ChannelSlice::F64(v) => v.len(),
        }
    }

    /// Check whether the channel is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the channel into `f32` values
    pub fn to_f32_vec(&self) -> Vec<f32> {
        fn convert<T: Element>(values: &[T]) -> Vec<f32> {
            values.iter().map(|v| v.to_f32()).collect()
        }
        match *self {
            ChannelSlice::U8(v) => convert(v),
            ChannelSlice::U16(v) => convert(v),
            ChannelSlice::I32(v) => convert(v),
            ChannelSlice::F32(v) => v.to_vec(),
            ChannelSlice::F64(v) => convert(v),
        }
    }
}

macro_rules! impl_from_slice {
    ($($t:ty => $variant:ident),*) => {
        $(
            impl<'a> From<&'a [$t]> for ChannelSlice<'a> {
                fn from(values: &'a [$t]) -> Self {
                    ChannelSlice::$variant(values)
                }
            }
        )*
    };
}

impl_from_slice!(u8 => U8, u16 => U16, i32 => I32, f32 => F32, f64 => F64);

/// One or more channels of the same element type
#[derive(Debug, Clone)]
pub enum Channels<'a> {
    U8(Vec<&'a [u8]>),
    U16(Vec<&'a [u16]>),
    I32(Vec<&'a [i32]>),
    F32(Vec<&'a [f32]>),
    F64(Vec<&'a [f64]>),
}

/// Run a generic expression over the typed channel list of a [`Channels`]
///
/// The bound name is a `&Vec<&[T]>` for the concrete element type `T`.
#[macro_export]
macro_rules! dispatch_channels {
    ($channels:expr, $name:ident => $body:expr) => {
        match $channels {
            $crate::Channels::U8($name) => $body,
            $crate::Channels::U16($name) => $body,
            $crate::Channels::I32($name) => $body,
            $crate::Channels::F32($name) => $body,
            $crate::Channels::F64($name) => $body,
        }
    };
}

impl<'a> Channels<'a> {
    /// Create channels from typed slices
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyChannels`] for an empty list and
    /// [`Error::LengthMismatch`] when the channels differ in length.
    pub fn new<T: Element>(channels: Vec<&'a [T]>) -> Result<Self> {
        let result = T::into_channels(channels);
        result.check_lengths()?;
        Ok(result)
    }

    /// Create a single-channel image
    pub fn single<T: Element>(channel: &'a [T]) -> Self {
        T::into_channels(vec![channel])
    }

    /// Create channels from untyped slices
    ///
    /// # Errors
    ///
    /// Besides the checks of [`Channels::new`], returns
    /// [`Error::MixedElementTypes`] when the slices differ in element type.
    pub fn from_slices(slices: &[ChannelSlice<'a>]) -> Result<Self> {
        let first = slices.first().ok_or(Error::EmptyChannels)?;
        let element_type = first.element_type();
        if let Some(other) = slices.iter().find(|s| s.element_type() != element_type) {
            return Err(Error::MixedElementTypes(
                element_type.name(),
                other.element_type().name(),
            ));
        }
        fn collect<'b, T: Element>(slices: &[ChannelSlice<'b>]) -> Vec<&'b [T]> {
            slices
                .iter()
                .filter_map(|s| T::from_channel_slice(*s))
                .collect()
        }
        let result = match element_type {
            ElementType::U8 => Channels::U8(collect(slices)),
            ElementType::U16 => Channels::U16(collect(slices)),
            ElementType::I32 => Channels::I32(collect(slices)),
            ElementType::F32 => Channels::F32(collect(slices)),
            ElementType::F64 => Channels::F64(collect(slices)),
        };
        result.check_lengths()?;
        Ok(result)
    }

    /// Element type shared by all channels
    pub fn element_type(&self) -> ElementType {
        match self {
            Channels::U8(_) => ElementType::U8,
            Channels::U16(_) => ElementType::U16,
            Channels::I32(_) => ElementType::I32,
            Channels::F32(_) => ElementType::F32,
            Channels::F64(_) => ElementType::F64,
        }
    }

    /// Number of channels
    pub fn number_of_channels(&self) -> usize {
        dispatch_channels!(self, ch => ch.len())
    }

    /// Number of pixels per channel
    pub fn len(&self) -> usize {
        dispatch_channels!(self, ch => ch.first().map_or(0, |c| c.len()))
    }

    /// Check whether the channels hold no pixels
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Untyped view of channel `index`
    pub fn channel(&self, index: usize) -> Option<ChannelSlice<'a>> {
        match self {
            Channels::U8(ch) => ch.get(index).map(|c| ChannelSlice::U8(*c)),
            Channels::U16(ch) => ch.get(index).map(|c| ChannelSlice::U16(*c)),
            Channels::I32(ch) => ch.get(index).map(|c| ChannelSlice::I32(*c)),
            Channels::F32(ch) => ch.get(index).map(|c| ChannelSlice::F32(*c)),
            Channels::F64(ch) => ch.get(index).map(|c| ChannelSlice::F64(*c)),
        }
    }

    /// Copy every channel into `f32` values
    pub fn to_f32_vecs(&self) -> Vec<Vec<f32>> {
        (0..self.number_of_channels())
            .filter_map(|c| self.channel(c))
            .map(|c| c.to_f32_vec())
            .collect()
    }

    /// Check that the channels describe exactly `number_of_pixels` pixels
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] when they do not.
    pub fn validate(&self, number_of_pixels: usize) -> Result<()> {
        self.check_lengths()?;
        let len = self.len();
        if len != number_of_pixels {
            return Err(Error::LengthMismatch {
                what: "channel",
                expected: number_of_pixels,
                actual: len,
            });
        }
        Ok(())
    }

    fn check_lengths(&self) -> Result<()> {
        dispatch_channels!(self, ch => {
            let first = ch.first().ok_or(Error::EmptyChannels)?;
            if let Some(other) = ch.iter().find(|c| c.len() != first.len()) {
                return Err(Error::LengthMismatch {
                    what: "channel",
                    expected: first.len(),
                    actual: other.len(),
                });
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_channels() {
        let r = [1u8, 2, 3];
        let g = [4u8, 5, 6];
        let channels = Channels::new(vec![&r[..], &g[..]]).unwrap();
        assert_eq!(channels.element_type(), ElementType::U8);
        assert_eq!(channels.number_of_channels(), 2);
        assert_eq!(channels.len(), 3);
        assert!(channels.validate(3).is_ok());
        assert!(matches!(
            channels.validate(4),
            Err(Error::LengthMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_empty_channels_rejected() {
        let empty: Vec<&[f32]> = Vec::new();
        assert!(matches!(Channels::new(empty), Err(Error::EmptyChannels)));
        assert!(matches!(Channels::from_slices(&[]), Err(Error::EmptyChannels)));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let a = [1u16, 2, 3];
        let b = [1u16, 2];
        assert!(Channels::new(vec![&a[..], &b[..]]).is_err());
    }

    #[test]
    fn test_mixed_types_rejected() {
        let a = [1u8, 2];
        let b = [1.0f32, 2.0];
        let result = Channels::from_slices(&[ChannelSlice::from(&a[..]), ChannelSlice::from(&b[..])]);
        assert!(matches!(result, Err(Error::MixedElementTypes("u8", "f32"))));
    }

    #[test]
    fn test_to_f32() {
        let a = [0u16, 65535];
        let channels = Channels::single(&a[..]);
        assert_eq!(channels.to_f32_vecs(), vec![vec![0.0, 65535.0]]);
        assert_eq!(ElementType::U16.max_possible_value(), 65535.0);
    }
}
