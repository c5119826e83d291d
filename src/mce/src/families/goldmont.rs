// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `06_5FH` (Goldmont): banks 6/7 are the integrated Memory Controller (5 codes) (§4.4.8).

use bitslice::BitSlice;

use crate::families::{common, FamilyContext, FamilyOutcome};

const IMC_CODES: [(u16, &str); 5] = [
    (0x0001, "DDR single-bit ECC error"),
    (0x0002, "DDR multi-bit ECC error"),
    (0x0003, "DIMM address parity error"),
    (0x0004, "DIMM command/address timeout"),
    (0x0005, "Memory scrubbing patrol error"),
];

pub fn handle(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    if !matches!(ctx.bank, 6 | 7) {
        return None;
    }
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
            ..FamilyOutcome::model_specific_sub_code_not_found("Memory Controller Error")
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank6_known_code() {
        let ctx = FamilyContext {
            signature: "06_5FH",
            bank: 6,
            status: 0x0003,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle(&ctx).unwrap();
        assert_eq!(
            outcome.meaning.as_deref(),
            Some("Memory Controller Error / DIMM address parity error")
        );
    }

    #[test]
    fn bank_outside_set_does_not_dispatch() {
        let ctx = FamilyContext {
            signature: "06_5FH",
            bank: 5,
            status: 0x0003,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        assert!(handle(&ctx).is_none());
    }
}
