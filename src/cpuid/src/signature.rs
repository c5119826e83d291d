// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Derives the canonical `FF_MMH` Processor Signature string from `CPUID.01H:EAX`.

use crate::intel_leaves::Leaf1Eax;

/// `CPUID.01H:EAX[13:12]`, the Processor Type field.
#[must_use]
pub fn processor_type_name(processor_type: u32) -> &'static str {
    match processor_type {
        0 => "Original OEM",
        1 => "Intel OverDrive",
        2 => "Dual processor",
        _ => "Intel reserved",
    }
}

/// `DisplayFamily`/`DisplayModel`, derived from `CPUID.01H:EAX` per the Intel SDM's
/// documented rule (§4.3 `ProcessorSignature derivation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorSignature {
    /// The family identifier as displayed to an operator (already combines the extended family
    /// ID when the base family ID is `0FH`).
    pub display_family: u32,
    /// The model identifier as displayed to an operator (already combines the extended model ID
    /// when the base family ID is `06H` or `0FH`).
    pub display_model: u32,
}

impl ProcessorSignature {
    /// Derives [`ProcessorSignature`] from the decoded `CPUID.01H:EAX` fields.
    #[must_use]
    pub fn from_eax(eax: Leaf1Eax) -> Self {
        let family_id = eax.family_id();
        let display_family = if family_id == 0x0F {
            (eax.extended_family_id() << 4) + family_id
        } else {
            family_id
        };

        let display_model = if family_id == 0x06 || family_id == 0x0F {
            (eax.extended_model_id() << 4) | eax.model_id()
        } else {
            eax.model_id()
        };

        Self {
            display_family,
            display_model,
        }
    }

    /// Renders the canonical `"{DisplayFamily}_{DisplayModel}H"` signature string.
    ///
    /// `DisplayModel` is always rendered as two hex digits. The spec's literal text ("zero-padded
    /// to two hex digits unless the base Family ID is `0FH` or `06H`") would leave the `{06H,0FH}`
    /// branch unpadded, but its own worked example (§8 scenario 2: `CPUID.01H.EAX=0x000006F6` →
    /// `06_0FH`) has `family_id=06H` with `display_model=0xF`, which only renders as the
    /// documented `"0F"` under two-digit padding — `"F"` would contradict the scenario outright.
    /// Resolved in favor of the worked example: both branches pad to two hex digits, so the only
    /// behavioral difference between the two family classes stays in `display_model`'s *value*
    /// (already handled in `from_eax`, which combines the Extended Model ID for `{06H,0FH}`),
    /// not the rendering width.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{:02X}_{:02X}H", self.display_family, self.display_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel_leaves::Leaf1Eax;

    #[test]
    fn core2_signature() {
        // CPUID.01H.EAX = 0x000006F6: family_id=6, model_id=15 (0xF), extended_model_id=0.
        let eax = Leaf1Eax::from(0x0000_06F6u32);
        let sig = ProcessorSignature::from_eax(eax);
        assert_eq!(sig.display_family, 0x06);
        assert_eq!(sig.display_model, 0x0F);
        assert_eq!(sig.canonical(), "06_0FH");
    }

    #[test]
    fn extended_family_pentium4() {
        // family_id = 0xF (Pentium 4 family uses extended family id), extended_family_id = 0,
        // model_id = 6.
        let eax = Leaf1Eax::from(0x0000_0F60u32);
        let sig = ProcessorSignature::from_eax(eax);
        assert_eq!(sig.display_family, 0x0F);
        assert_eq!(sig.canonical(), "0F_06H");
    }

    #[test]
    fn non_canonical_family_pads_model_to_two_digits() {
        // family_id=0x01 (not in {06H,0FH}), model_id=0x3: DisplayModel must still render as
        // two hex digits ("03"), not the bare "3" a naive unpadded format would produce.
        let eax = Leaf1Eax::from(0x0000_0130u32);
        let sig = ProcessorSignature::from_eax(eax);
        assert_eq!(sig.display_family, 0x01);
        assert_eq!(sig.display_model, 0x03);
        assert_eq!(sig.canonical(), "01_03H");
    }
}
