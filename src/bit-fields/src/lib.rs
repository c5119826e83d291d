// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
#![warn(missing_docs)]

//! Read-only bit-field structures over fixed-width unsigned integers.
//!
//! This crate defines the [`bitfield!`] macro, used throughout `cpuid` and `mce` to describe the
//! architectural layout of a CPUID register or an `IA32_MCi_STATUS`-shaped MSR: a single
//! newtype wrapping an unsigned integer, with one read accessor per named field or flag. Field
//! extraction itself is delegated to [`BitRange`], which is `[START, END)` half-open on the same
//! underlying integer.
//!
//! This workspace never writes an MSR back (see the `mce` crate's Non-goals), so only the
//! read-only half of the original `bitfield!`/`BitRange` machinery is carried over — there is no
//! `BitRangeMut` or `bit_mut` accessor.

mod bit_range;

pub use bit_range::BitRange;

/// Declares a newtype struct wrapping an unsigned integer, with one read accessor per named bit
/// range or single-bit flag.
///
/// A single bit (`name: N`) generates a `bool` accessor; a range (`name: START..END`, half-open,
/// matching [`BitRange`]) generates an accessor returning the same underlying integer type,
/// right-shifted into the low end.
///
/// ```
/// use bit_fields::bitfield;
///
/// bitfield!(Leaf1Edx, u32, {
///     /// Floating Point Unit On-Chip.
///     fpu: 0,
///     /// Family ID, continued from the base family ID in `Leaf1Eax`.
///     family_id: 8..12,
/// });
///
/// let edx = Leaf1Edx::from(0b1_0000_0001u32);
/// assert!(edx.fpu());
/// assert_eq!(edx.family_id(), 0);
/// assert_eq!(u32::from(edx), 0b1_0000_0001);
/// ```
#[macro_export]
macro_rules! bitfield {
    (
        $(#[$struct_meta:meta])*
        $name:ident, $repr:ty, {
            $($(#[$field_meta:meta])* $field:ident : $lo:literal $(.. $end:literal)?),* $(,)?
        }
    ) => {
        $(#[$struct_meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub $repr);

        impl $name {
            $(
                $crate::bitfield!(@field $repr, $(#[$field_meta])* $field : $lo $(.. $end)?);
            )*
        }

        impl From<$repr> for $name {
            #[inline]
            fn from(value: $repr) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $repr {
            #[inline]
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }
    };

    (@field $repr:ty, $(#[$field_meta:meta])* $field:ident : $bit:literal) => {
        $(#[$field_meta])*
        #[must_use]
        #[inline]
        pub fn $field(&self) -> bool {
            $crate::BitRange::<$repr, $bit, { $bit + 1 }>(&self.0).read() != 0
        }
    };

    (@field $repr:ty, $(#[$field_meta:meta])* $field:ident : $lo:literal .. $end:literal) => {
        $(#[$field_meta])*
        #[must_use]
        #[inline]
        pub fn $field(&self) -> $repr {
            $crate::BitRange::<$repr, $lo, $end>(&self.0).read()
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    bitfield!(
        /// Toy register used only to exercise the macro itself.
        TestReg, u32, {
            /// bit 0
            a: 0,
            /// bit 1
            b: 1,
            /// bits [8:4)
            c: 4..8,
        }
    );

    #[test]
    fn flags_and_ranges() {
        let reg = TestReg::from(0b0000_0000_0000_0000_0000_0000_0101_0011u32);
        assert!(reg.a());
        assert!(reg.b());
        assert_eq!(reg.c(), 0b0101);
        assert_eq!(u32::from(reg), 0b0101_0011);
    }

    #[test]
    fn default_is_zero() {
        let reg = TestReg::default();
        assert!(!reg.a());
        assert!(!reg.b());
        assert_eq!(reg.c(), 0);
    }

    #[test]
    fn display_is_hex() {
        let reg = TestReg::from(0xau32);
        assert_eq!(reg.to_string(), "0xa");
    }
}
