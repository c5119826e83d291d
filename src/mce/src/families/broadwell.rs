// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `06_56H` (Broadwell D) and `06_4FH` (Broadwell E5) (§4.4.8).
//!
//! `06_56H`: bank 4 shares Sandy Bridge's PCU internal error shape; banks 9/10 are the
//! integrated Memory Controller (7 codes).
//!
//! `06_4FH`: banks 9-16 reuse Haswell-E's iMC code table; banks 7/8 are the Home Agent
//! (`Failover`, `Mirrorcorr` flags).

use bitslice::BitSlice;

use crate::families::{common, haswell_e, sandybridge, FamilyContext, FamilyOutcome};

const D_IMC_CODES: [(u16, &str); 7] = [
    (0x0001, "DIMM single-bit ECC error"),
    (0x0002, "DIMM multi-bit ECC error"),
    (0x0003, "DIMM address parity error"),
    (0x0004, "DIMM command/address timeout"),
    (0x0005, "Memory scrubbing patrol error"),
    (0x0006, "Write data CRC error"),
    (0x0007, "Spare rank copy failure"),
];

pub fn handle_d(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    match ctx.bank {
        4 => sandybridge::handle(ctx),
        9 | 10 => {
            let code = u16::try_from(ctx.status.bits(15, 0).unwrap_or(0)).unwrap_or(0);
            let mut reserved = Vec::new();
            if ctx.miscv {
                reserved.extend(common::imc_misc_fields(ctx.misc));
            }
            Some(match common::imc_code(&D_IMC_CODES, code) {
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

fn home_agent_flags(status: u64) -> Vec<(String, String)> {
    vec![
        (
            "Failover".to_string(),
            status.bit(16).unwrap_or(0).to_string(),
        ),
        (
            "Mirrorcorr".to_string(),
            status.bit(17).unwrap_or(0).to_string(),
        ),
    ]
}

pub fn handle_e5(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    match ctx.bank {
        9..=16 => {
            let code = u16::try_from(ctx.status.bits(15, 0).unwrap_or(0)).unwrap_or(0);
            let mut reserved = Vec::new();
            if ctx.miscv {
                reserved.extend(common::imc_misc_fields(ctx.misc));
            }
            Some(match common::imc_code(&haswell_e::IMC_CODES, code) {
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
        7 | 8 => Some(FamilyOutcome {
            interpretation: Some("Home Agent Error".to_string()),
            reserved_error_status_other_information: home_agent_flags(ctx.status),
            ..Default::default()
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn d_imc_bank() {
        let ctx = FamilyContext {
            signature: "06_56H",
            bank: 9,
            status: 0x0005,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle_d(&ctx).unwrap();
        assert_eq!(
            outcome.meaning.as_deref(),
            Some("Memory Controller Error / Memory scrubbing patrol error")
        );
    }

    #[test]
    fn e5_home_agent() {
        let ctx = FamilyContext {
            signature: "06_4FH",
            bank: 7,
            status: 1 << 16,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle_e5(&ctx).unwrap();
        assert!(outcome
            .reserved_error_status_other_information
            .iter()
            .any(|(k, v)| k == "Failover" && v == "1"));
    }
}
