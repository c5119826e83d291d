// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Reads an inclusive `[hi:lo]` bit range out of a fixed-width unsigned integer.
//!
//! This is the single place a byte-and-shift substitution happens for every other decoder in
//! the workspace: [`cpuid`] and [`mce`] (not present in this crate) both express field extraction
//! in terms of [`BitSlice::bits`] and never touch `<<`/`>>` directly.
//!
//! Bit 0 is the least significant bit. A range `[hi:lo]` requires `hi >= lo` and `hi` within the
//! width of the word; both conditions are checked at runtime and returned as a
//! [`BitSliceError`], because unlike the const-generic ranges in `bit_fields::BitRange` the
//! ranges used by the MCA decoder vary with runtime data (capability flags, error-code grammar)
//! and cannot be fixed at compile time.

use thiserror::Error;

/// Error produced by an out-of-bounds or inverted bit range.
///
/// Per the decoder's contract, every caller in this workspace treats this as an internal bug —
/// the range itself is always a literal taken from the Intel SDM — never as a data error to
/// surface to an operator.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BitSliceError {
    /// `hi` is not a valid bit index for the given word width.
    #[error("bit index {hi} is out of range for a {width}-bit word")]
    HiOutOfRange {
        /// The requested high bit.
        hi: u8,
        /// The width, in bits, of the word being sliced.
        width: u8,
    },
    /// `hi < lo`.
    #[error("high bit {hi} is less than low bit {lo}")]
    HiLessThanLo {
        /// The requested high bit.
        hi: u8,
        /// The requested low bit.
        lo: u8,
    },
}

/// Implemented for the unsigned integer widths this workspace decodes: CPUID registers (`u32`)
/// and MCA MSRs (`u64`), plus `u16` for the handful of 16-bit sub-fields (e.g. the MCA error
/// code) that are easier to reason about in their own width.
pub trait BitSlice: Copy + Sized {
    /// Width of `Self`, in bits.
    const WIDTH: u8;

    /// Returns the value of bits `[hi:lo]` of `self`, right-shifted into the low end of the
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`BitSliceError::HiOutOfRange`] if `hi >= Self::WIDTH`, or
    /// [`BitSliceError::HiLessThanLo`] if `hi < lo`.
    fn bits(self, hi: u8, lo: u8) -> Result<Self, BitSliceError>;

    /// Returns a single bit as `0` or `1`. Equivalent to `self.bits(index, index)`.
    ///
    /// # Errors
    ///
    /// Returns [`BitSliceError::HiOutOfRange`] if `index >= Self::WIDTH`.
    #[inline]
    fn bit(self, index: u8) -> Result<Self, BitSliceError> {
        self.bits(index, index)
    }

    /// Renders `self` as a zero-padded binary string, most significant bit first.
    fn to_binary_string(self) -> String;
}

macro_rules! impl_bitslice {
    ($t:ty) => {
        impl BitSlice for $t {
            const WIDTH: u8 = (std::mem::size_of::<$t>() * 8) as u8;

            #[inline]
            fn bits(self, hi: u8, lo: u8) -> Result<$t, BitSliceError> {
                if hi >= Self::WIDTH {
                    return Err(BitSliceError::HiOutOfRange {
                        hi,
                        width: Self::WIDTH,
                    });
                }
                if hi < lo {
                    return Err(BitSliceError::HiLessThanLo { hi, lo });
                }
                // `span` is in `1..=WIDTH`, so the shift below never overflows once we special
                // case a full-width span (where `1 << span` would overflow `$t`).
                let span = hi - lo + 1;
                let mask = if span == Self::WIDTH {
                    <$t>::MAX
                } else {
                    (1 as $t << span) - 1
                };
                Ok((self >> lo) & mask)
            }

            #[inline]
            fn to_binary_string(self) -> String {
                format!("{:0width$b}", self, width = Self::WIDTH as usize)
            }
        }
    };
}

impl_bitslice!(u16);
impl_bitslice!(u32);
impl_bitslice!(u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bit() {
        let w: u64 = 0b1010;
        assert_eq!(w.bit(1).unwrap(), 1);
        assert_eq!(w.bit(0).unwrap(), 0);
        assert_eq!(w.bit(3).unwrap(), 1);
    }

    #[test]
    fn ranges() {
        let w: u64 = 0x9020_0000_0000_000e;
        assert_eq!(w.bit(63).unwrap(), 1);
        assert_eq!(w.bits(15, 0).unwrap(), 0x000e);
        assert_eq!(w.bits(62, 61).unwrap(), 0b00);
    }

    #[test]
    fn full_width_span() {
        let w: u32 = 0xffff_ffff;
        assert_eq!(w.bits(31, 0).unwrap(), 0xffff_ffff);
        let w64: u64 = u64::MAX;
        assert_eq!(w64.bits(63, 0).unwrap(), u64::MAX);
    }

    #[test]
    fn hi_out_of_range() {
        let w: u32 = 0;
        assert_eq!(
            w.bits(32, 0).unwrap_err(),
            BitSliceError::HiOutOfRange { hi: 32, width: 32 }
        );
    }

    #[test]
    fn hi_less_than_lo() {
        let w: u64 = 0;
        assert_eq!(
            w.bits(2, 5).unwrap_err(),
            BitSliceError::HiLessThanLo { hi: 2, lo: 5 }
        );
    }

    #[test]
    fn slice_symmetry_property() {
        // Mirrors the "slice symmetry" testable property: the extracted value equals
        // `(w >> lo) & ((1 << (hi - lo + 1)) - 1)`.
        let w: u64 = 0x1234_5678_9abc_def0;
        for hi in 0..64u8 {
            for lo in 0..=hi {
                let span = hi - lo + 1;
                let mask = if span == 64 { u64::MAX } else { (1u64 << span) - 1 };
                let expected = (w >> lo) & mask;
                assert_eq!(w.bits(hi, lo).unwrap(), expected, "hi={hi} lo={lo}");
            }
        }
    }

    #[test]
    fn binary_string() {
        let w: u16 = 0b1010;
        assert_eq!(w.to_binary_string(), "0000000000001010");
    }
}
