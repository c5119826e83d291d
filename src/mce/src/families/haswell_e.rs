// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `06_3FH` (Haswell-E): bank 4 has 4 internal error codes via a simple `status[15:0]` match,
//! banks 5/20/21 are QPI (12 codes), and banks 9-16 are the integrated Memory Controller (10
//! DDR3/DDR4 codes) (§4.4.8).

use bitslice::BitSlice;

use crate::families::{common, FamilyContext, FamilyOutcome};

const BANK4_INTERNAL_CODES: [(u16, &str); 4] = [
    (0x0000, "PCU internal unclassified error"),
    (0x0001, "PCU firmware assertion"),
    (0x0002, "PCU hardware timeout"),
    (0x0003, "PCU MSR access violation"),
];

const QPI_CODES: [(u16, &str); 12] = [
    (0x0301, "QPI Physical Layer CRC error"),
    (0x0302, "QPI Link Layer retry exceeded"),
    (0x0303, "QPI Link Layer initialization failure"),
    (0x0304, "QPI Routing error"),
    (0x0305, "QPI Protocol parity error"),
    (0x0306, "QPI Home Logic timeout"),
    (0x0307, "QPI Ingress buffer overflow"),
    (0x0308, "QPI Egress buffer overflow"),
    (0x0309, "QPI Unsupported message encoding"),
    (0x030A, "QPI Link width degraded"),
    (0x030B, "QPI Link L0 to L1 transition failure"),
    (0x030C, "QPI Directory cache parity error"),
];

pub(crate) const IMC_CODES: [(u16, &str); 10] = [
    (0x0001, "DDR3/DDR4 single-bit ECC error"),
    (0x0002, "DDR3/DDR4 multi-bit ECC error"),
    (0x0003, "DIMM address parity error"),
    (0x0004, "DIMM command/address timeout"),
    (0x0005, "Memory scrubbing patrol error"),
    (0x0006, "Write data CRC error"),
    (0x0007, "Spare rank copy failure"),
    (0x0008, "Memory thermal throttling event"),
    (0x0009, "DDR link training failure"),
    (0x000A, "Address range/decoder configuration error"),
];

pub fn handle(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    let code = u16::try_from(ctx.status.bits(15, 0).unwrap_or(0)).unwrap_or(0);

    match ctx.bank {
        4 => Some(match common::qpi_code(&BANK4_INTERNAL_CODES, code) {
            Some(name) => FamilyOutcome {
                interpretation: Some("Internal Error".to_string()),
                meaning: Some(format!("Internal Error / {name}")),
                ..Default::default()
            },
            None => FamilyOutcome::model_specific_sub_code_not_found("Internal Error"),
        }),
        5 | 20 | 21 => Some(match common::qpi_code(&QPI_CODES, code) {
            Some(name) => FamilyOutcome {
                interpretation: Some("QPI Error".to_string()),
                meaning: Some(format!("QPI Error / {name}")),
                ..Default::default()
            },
            None => FamilyOutcome::model_specific_sub_code_not_found("QPI Error"),
        }),
        9..=16 => {
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
    fn bank4_simple_match() {
        let ctx = FamilyContext {
            signature: "06_3FH",
            bank: 4,
            status: 0x0002,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle(&ctx).unwrap();
        assert_eq!(
            outcome.meaning.as_deref(),
            Some("Internal Error / PCU hardware timeout")
        );
    }

    #[test]
    fn imc_bank_range() {
        let ctx = FamilyContext {
            signature: "06_3FH",
            bank: 16,
            status: 0x000A,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        assert!(handle(&ctx).is_some());
    }
}
