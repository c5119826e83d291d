// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Brand Index (`CPUID.01H:EBX[7:0]`) to brand string lookup.
//!
//! The static table and the two signature-keyed exceptions are from the Intel SDM's brand index
//! table; unassigned indices in `00h..=17h` carry no brand string ("reserved").

/// Maps a Brand Index directly to its brand string, ignoring the two signature-dependent
/// exceptions handled separately by [`brand_string`].
static BRAND_TABLE: phf::Map<u8, &'static str> = phf::phf_map! {
    0x00u8 => "This processor does not support the brand identification feature",
    0x01u8 => "Intel(R) Celeron(R) processor",
    0x02u8 => "Intel(R) Pentium(R) III processor",
    0x03u8 => "Intel(R) Pentium(R) III Xeon(R) processor",
    0x04u8 => "Intel(R) Pentium(R) III processor",
    0x06u8 => "Mobile Intel(R) Pentium(R) III processor-M",
    0x07u8 => "Mobile Intel(R) Celeron(R) processor",
    0x08u8 => "Intel(R) Pentium(R) 4 processor",
    0x09u8 => "Intel(R) Pentium(R) 4 processor",
    0x0Au8 => "Intel(R) Celeron(R) processor",
    0x0Bu8 => "Intel(R) Xeon(R) processor",
    0x0Cu8 => "Intel(R) Xeon(R) processor MP",
    0x0Eu8 => "Mobile Intel(R) Pentium(R) 4 processor-M",
    0x0Fu8 => "Mobile Intel(R) Celeron(R) processor",
    0x11u8 => "Mobile Genuine Intel(R) processor",
    0x12u8 => "Intel(R) Celeron(R) M processor",
    0x13u8 => "Mobile Intel(R) Celeron(R) processor",
    0x14u8 => "Intel(R) Celeron(R) processor",
    0x15u8 => "Mobile Genuine Intel(R) processor",
    0x16u8 => "Intel(R) Pentium(R) M processor",
    0x17u8 => "Mobile Intel(R) Celeron(R) processor",
};

/// The two full-EAX-signature exceptions the Intel SDM documents on top of [`BRAND_TABLE`].
///
/// Preserved as the spec requires: the override is keyed on the *exact* 32-bit
/// `CPUID.01H:EAX` signature, not on family/model alone, so a processor sharing a family/model
/// with one of these signatures but not the exact stepping does not take the override.
fn signature_override(eax: u32, brand_index: u8) -> Option<&'static str> {
    match (eax, brand_index) {
        (0x0000_06B1, 0x03) => Some("Intel(R) Celeron(R) processor"),
        (0x0000_0F13, 0x0B) => Some("Intel(R) Xeon(R) processor MP"),
        (0x0000_0F13, 0x0E) => Some("Intel(R) Xeon(R) processor"),
        _ => None,
    }
}

/// Resolves a brand string for the given `(EAX signature, Brand Index)` pair.
///
/// Returns `None` if `brand_index` is not one of the assigned `00h..=17h` slots.
#[must_use]
pub fn brand_string(eax: u32, brand_index: u8) -> Option<&'static str> {
    signature_override(eax, brand_index).or_else(|| BRAND_TABLE.get(&brand_index).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_lookup() {
        assert_eq!(
            brand_string(0x0000_0000, 0x01),
            Some("Intel(R) Celeron(R) processor")
        );
    }

    #[test]
    fn reserved_index_is_none() {
        assert_eq!(brand_string(0x0000_0000, 0x05), None);
    }

    #[test]
    fn brand_index_0b_default_is_xeon_not_pentium4() {
        // Only the exact `0x0000_0F13` signature takes the Xeon(R) MP override (see
        // `signature_override_applies_only_to_exact_eax` below); any other EAX hitting brand
        // index 0x0B falls back to the plain table entry, which is Xeon(R), not Pentium(R) 4.
        assert_eq!(
            brand_string(0x0000_0000, 0x0B),
            Some("Intel(R) Xeon(R) processor")
        );
    }

    #[test]
    fn signature_override_applies_only_to_exact_eax() {
        assert_eq!(
            brand_string(0x0000_06B1, 0x03),
            Some("Intel(R) Celeron(R) processor")
        );
        // Same brand index, different signature: falls back to the plain table entry.
        assert_eq!(
            brand_string(0x0000_0000, 0x03),
            Some("Intel(R) Pentium(R) III Xeon(R) processor")
        );
        assert_eq!(
            brand_string(0x0000_0F13, 0x0B),
            Some("Intel(R) Xeon(R) processor MP")
        );
        assert_eq!(
            brand_string(0x0000_0F13, 0x0E),
            Some("Intel(R) Xeon(R) processor")
        );
    }
}
