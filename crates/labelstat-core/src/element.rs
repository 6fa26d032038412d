//! Numeric element types of value channels
//!
//! Channels may hold `u8`, `u16`, `i32`, `f32` or `f64` values. The
//! [`Element`] trait gives every reducer and selector one generic code path:
//! unsigned types widen naturally, floats are ordered with `total_cmp`.

use crate::channels::{ChannelSlice, Channels, ElementType};
use crate::pool::ScratchPool;
use std::cmp::Ordering;
use std::fmt::Debug;

/// A primitive element type of a value channel
pub trait Element: Copy + Default + PartialEq + PartialOrd + Debug + Send + Sync + 'static {
    /// Zero value of the type
    const ZERO: Self;

    /// Runtime tag of the type
    const TYPE: ElementType;

    /// Widen to `f64` (exact for every supported type except large `f64`)
    fn to_f64(self) -> f64;

    /// Convert to `f32`, the precision of per-object float outputs
    fn to_f32(self) -> f32;

    /// Convert to `i32` (saturating for floats)
    fn to_i32(self) -> i32;

    /// Total order used by selection
    fn compare(&self, other: &Self) -> Ordering;

    /// Check whether the value is zero
    fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// View the slice as bytes when the element type is `u8`
    fn as_bytes(values: &[Self]) -> Option<&[u8]>;

    /// Extract a typed slice from an untyped channel slice
    fn from_channel_slice(slice: ChannelSlice<'_>) -> Option<&[Self]>;

    /// Wrap typed channel slices into [`Channels`]
    fn into_channels(channels: Vec<&[Self]>) -> Channels<'_>;

    /// Process-wide scratch pool of per-object pixel buffers
    fn scratch_pool() -> &'static ScratchPool<Self>;
}

macro_rules! impl_element {
    ($t:ident, $variant:ident, $pool:ident, int) => {
        impl_element!(@common $t, $variant, $pool);
        impl Element for $t {
            const ZERO: Self = 0;
            const TYPE: ElementType = ElementType::$variant;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn to_f32(self) -> f32 {
                self as f32
            }

            #[inline]
            fn to_i32(self) -> i32 {
                self as i32
            }

            #[inline]
            fn compare(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }

            impl_element!(@bytes $t);
            impl_element!(@channels $t, $variant, $pool);
        }
    };
    ($t:ident, $variant:ident, $pool:ident, float) => {
        impl_element!(@common $t, $variant, $pool);
        impl Element for $t {
            const ZERO: Self = 0.0;
            const TYPE: ElementType = ElementType::$variant;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn to_f32(self) -> f32 {
                self as f32
            }

            #[inline]
            fn to_i32(self) -> i32 {
                self as i32
            }

            #[inline]
            fn compare(&self, other: &Self) -> Ordering {
                self.total_cmp(other)
            }

            impl_element!(@bytes $t);
            impl_element!(@channels $t, $variant, $pool);
        }
    };
    (@common $t:ident, $variant:ident, $pool:ident) => {
        static $pool: ScratchPool<$t> = ScratchPool::new(false);
    };
    (@bytes u8) => {
        #[inline]
        fn as_bytes(values: &[Self]) -> Option<&[u8]> {
            Some(values)
        }
    };
    (@bytes $t:ident) => {
        #[inline]
        fn as_bytes(_values: &[Self]) -> Option<&[u8]> {
            None
        }
    };
    (@channels $t:ident, $variant:ident, $pool:ident) => {
        fn from_channel_slice(slice: ChannelSlice<'_>) -> Option<&[Self]> {
            match slice {
                ChannelSlice::$variant(values) => Some(values),
                _ => None,
            }
        }

        fn into_channels(channels: Vec<&[Self]>) -> Channels<'_> {
            Channels::$variant(channels)
        }

        fn scratch_pool() -> &'static ScratchPool<Self> {
            &$pool
        }
    };
}

impl_element!(u8, U8, U8_BUFFERS, int);
impl_element!(u16, U16, U16_BUFFERS, int);
impl_element!(i32, I32, I32_BUFFERS, int);
impl_element!(f32, F32, F32_BUFFERS, float);
impl_element!(f64, F64, F64_BUFFERS, float);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_widening() {
        assert_eq!(255u8.to_f64(), 255.0);
        assert_eq!(65535u16.to_f64(), 65535.0);
        assert_eq!(200u8.to_i32(), 200);
    }

    #[test]
    fn test_float_total_order() {
        assert_eq!(1.0f32.compare(&2.0), Ordering::Less);
        assert_eq!(f64::NAN.compare(&1.0), Ordering::Greater);
        assert!(0.0f32.is_zero());
        assert!(!0.5f64.is_zero());
    }

    #[test]
    fn test_byte_view() {
        let bytes = [1u8, 2, 3];
        assert_eq!(u8::as_bytes(&bytes), Some(&bytes[..]));
        let shorts = [1u16, 2, 3];
        assert!(u16::as_bytes(&shorts).is_none());
    }

    #[test]
    fn test_channel_slice_roundtrip() {
        let values = [1.5f32, 2.5];
        let slice = ChannelSlice::F32(&values);
        assert_eq!(f32::from_channel_slice(slice), Some(&values[..]));
        assert!(f64::from_channel_slice(slice).is_none());
    }
}
