// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `06_2DH` (Sandy Bridge): bank 4 is Internal (a two-dimensional `(major, minor)` error code),
//! banks 6/7 are QPI, and banks 8/11 are the integrated Memory Controller (7 codes; when the
//! caller's `msr_error_control_bit1` is set, adds `1stErrDev`/`2ndErrDev`/`FailRank`) (§4.4.8).

use bitslice::BitSlice;

use crate::families::{common, FamilyContext, FamilyOutcome};

/// `(major, minor)` pairs, `status[7:4]`/`status[3:0]`.
const BANK4_INTERNAL_CODES: [((u8, u8), &str); 9] = [
    ((0x0, 0x0), "PCU internal unclassified error"),
    ((0x0, 0x1), "PCU VID control error"),
    ((0x0, 0x2), "PCU FIVR fault"),
    ((0x1, 0x0), "PCU firmware assertion"),
    ((0x1, 0x1), "PCU hardware timeout"),
    ((0x2, 0x0), "PCU MSR access violation"),
    ((0x2, 0x1), "PCU thermal sensor fault"),
    ((0x3, 0x0), "PCU power-limit exceeded"),
    ((0x3, 0x1), "PCU turbo arbitration error"),
];

const QPI_CODES: [(u16, &str); 6] = [
    (0x0301, "QPI Physical Layer CRC error"),
    (0x0302, "QPI Link Layer retry exceeded"),
    (0x0303, "QPI Link Layer initialization failure"),
    (0x0304, "QPI Routing error"),
    (0x0305, "QPI Protocol parity error"),
    (0x0306, "QPI Home Logic timeout"),
];

const IMC_CODES: [(u16, &str); 7] = [
    (0x0001, "DIMM single-bit ECC error"),
    (0x0002, "DIMM multi-bit ECC error"),
    (0x0003, "DIMM address parity error"),
    (0x0004, "DIMM command/address timeout"),
    (0x0005, "Memory scrubbing patrol error"),
    (0x0006, "Write data CRC error"),
    (0x0007, "Spare rank copy failure"),
];

pub fn handle(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    let code = u16::try_from(ctx.status.bits(15, 0).unwrap_or(0)).unwrap_or(0);

    match ctx.bank {
        4 => {
            let major = u8::try_from(ctx.status.bits(7, 4).unwrap_or(0)).unwrap_or(0);
            let minor = u8::try_from(ctx.status.bits(3, 0).unwrap_or(0)).unwrap_or(0);
            let found = BANK4_INTERNAL_CODES
                .iter()
                .find(|((maj, min), _)| *maj == major && *min == minor)
                .map(|(_, name)| *name);
            Some(match found {
                Some(name) => FamilyOutcome {
                    interpretation: Some("Internal Error".to_string()),
                    meaning: Some(format!("Internal Error / {name}")),
                    ..Default::default()
                },
                None => FamilyOutcome::model_specific_sub_code_not_found("Internal Error"),
            })
        }
        6 | 7 => Some(match common::qpi_code(&QPI_CODES, code) {
            Some(name) => FamilyOutcome {
                interpretation: Some("QPI Error".to_string()),
                meaning: Some(format!("QPI Error / {name}")),
                ..Default::default()
            },
            None => FamilyOutcome::model_specific_sub_code_not_found("QPI Error"),
        }),
        8 | 11 => {
            let name = common::imc_code(&IMC_CODES, code);
            let mut reserved = Vec::new();
            if ctx.miscv {
                reserved.extend(common::imc_misc_fields(ctx.misc));
            }
            if ctx.msr_error_control_bit1 {
                reserved.push((
                    "1stErrDev".to_string(),
                    ctx.misc.bits(13, 8).unwrap_or(0).to_string(),
                ));
                reserved.push((
                    "2ndErrDev".to_string(),
                    ctx.misc.bits(19, 14).unwrap_or(0).to_string(),
                ));
                reserved.push((
                    "FailRank".to_string(),
                    ctx.misc.bits(21, 20).unwrap_or(0).to_string(),
                ));
            }
            Some(match name {
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
    fn bank4_two_dimensional_code() {
        let ctx = FamilyContext {
            signature: "06_2DH",
            bank: 4,
            status: 0x0011,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle(&ctx).unwrap();
        assert_eq!(
            outcome.meaning.as_deref(),
            Some("Internal Error / PCU VID control error")
        );
    }

    #[test]
    fn imc_extra_fields_gated_on_error_control_bit() {
        let ctx = FamilyContext {
            signature: "06_2DH",
            bank: 8,
            status: 0x0001,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: false,
        };
        let outcome = handle(&ctx).unwrap();
        assert!(!outcome
            .reserved_error_status_other_information
            .iter()
            .any(|(k, _)| k == "FailRank"));
    }
}
