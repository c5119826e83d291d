// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `06_3EH` (Ivy Bridge-EP): bank 4 is Internal (shares Sandy Bridge's PCU error-code shape),
//! banks 9-16 are the integrated Memory Controller (9 codes) (§4.4.8).

use bitslice::BitSlice;

use crate::families::{common, sandybridge, FamilyContext, FamilyOutcome};

const IMC_CODES: [(u16, &str); 9] = [
    (0x0001, "DIMM single-bit ECC error"),
    (0x0002, "DIMM multi-bit ECC error"),
    (0x0003, "DIMM address parity error"),
    (0x0004, "DIMM command/address timeout"),
    (0x0005, "Memory scrubbing patrol error"),
    (0x0006, "Write data CRC error"),
    (0x0007, "Spare rank copy failure"),
    (0x0008, "Memory thermal throttling event"),
    (0x0009, "DDR link training failure"),
];

pub fn handle(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    match ctx.bank {
        4 => sandybridge::handle(ctx),
        9..=16 => {
            let code = u16::try_from(ctx.status.bits(15, 0).unwrap_or(0)).unwrap_or(0);
            let mut reserved = Vec::new();
            if ctx.miscv {
                reserved.extend(common::imc_misc_fields(ctx.misc));
            }
            Some(match common::imc_code(&IMC_CODES, code) {
                Some(name) => FamilyOutcome {
                    interpretation: Some("Memory Controller Error".to_string()),
                    meaning: Some(format!("Memory Controller Error / {name}")),
                    reserved_error_status_other_information: reserved,
                    ..Default::default()
                },
                None => FamilyOutcome {
                    reserved_error_status_other_information: reserved,
                    ..FamilyOutcome::model_specific_sub_code_not_found(
                        "Memory Controller Error",
                    )
                },
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imc_bank_in_range() {
        let ctx = FamilyContext {
            signature: "06_3EH",
            bank: 12,
            status: 0x0008,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle(&ctx).unwrap();
        assert_eq!(
            outcome.meaning.as_deref(),
            Some("Memory Controller Error / Memory thermal throttling event")
        );
    }

    #[test]
    fn bank_outside_range_does_not_dispatch() {
        let ctx = FamilyContext {
            signature: "06_3EH",
            bank: 20,
            status: 0,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        assert!(handle(&ctx).is_none());
    }
}
