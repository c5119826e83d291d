// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `06_1AH` (Nehalem): banks 0/1 are QPI, bank 7 is Internal (a 7-entry error table), and bank 8
//! is the integrated Memory Controller (ECC flags, RTId/DIMM/Channel/Syndrome from
//! `IA32_MCi_MISC`, `CORE_ERR_CNT` from `status[52:38]`) (§4.4.8).

use bitslice::BitSlice;

use crate::families::{common, FamilyContext, FamilyOutcome};

const QPI_CODES: [(u16, &str); 8] = [
    (0x0301, "QPI Physical Layer CRC error"),
    (0x0302, "QPI Link Layer retry exceeded"),
    (0x0303, "QPI Link Layer initialization failure"),
    (0x0304, "QPI Routing error"),
    (0x0305, "QPI Protocol parity error"),
    (0x0306, "QPI Ingress buffer overflow"),
    (0x0307, "QPI Egress buffer overflow"),
    (0x0308, "QPI Unsupported message encoding"),
];

const BANK7_INTERNAL_CODES: [(u16, &str); 7] = [
    (0x0001, "Internal unclassified fatal error"),
    (0x0002, "Internal timer error"),
    (0x0003, "Internal unexpected event"),
    (0x0004, "Internal parity error, core interface"),
    (0x0005, "Internal livelock/deadlock detected"),
    (0x0006, "Internal microcode ROM error"),
    (0x0007, "Internal FIVR/VID control error"),
];

fn imc_flags(status: u64) -> Vec<(String, String)> {
    vec![
        (
            "Correctable_ECC".to_string(),
            status.bit(41).unwrap_or(0).to_string(),
        ),
        (
            "Uncorrectable_ECC".to_string(),
            status.bit(42).unwrap_or(0).to_string(),
        ),
        (
            "CORE_ERR_CNT".to_string(),
            status.bits(52, 38).unwrap_or(0).to_string(),
        ),
    ]
}

pub fn handle(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    let code = u16::try_from(ctx.status.bits(15, 0).unwrap_or(0)).unwrap_or(0);

    match ctx.bank {
        0 | 1 => Some(match common::qpi_code(&QPI_CODES, code) {
            Some(name) => FamilyOutcome {
                interpretation: Some("QPI Error".to_string()),
                meaning: Some(format!("QPI Error / {name}")),
                ..Default::default()
            },
            None => FamilyOutcome::model_specific_sub_code_not_found("QPI Error"),
        }),
        7 => Some(match common::qpi_code(&BANK7_INTERNAL_CODES, code) {
            Some(name) => FamilyOutcome {
                interpretation: Some("Internal Error".to_string()),
                meaning: Some(format!("Internal Error / {name}")),
                ..Default::default()
            },
            None => FamilyOutcome::model_specific_sub_code_not_found("Internal Error"),
        }),
        8 => {
            let mut reserved = imc_flags(ctx.status);
            if ctx.miscv {
                reserved.push((
                    "RTId".to_string(),
                    ctx.misc.bits(12, 8).unwrap_or(0).to_string(),
                ));
                reserved.extend(common::imc_misc_fields(ctx.misc));
            }
            Some(FamilyOutcome {
                interpretation: Some("Memory Controller Error".to_string()),
                reserved_error_status_other_information: reserved,
                ..Default::default()
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank8_reports_core_err_cnt() {
        let status: u64 = (0b10 << 38) | 0x0001;
        let ctx = FamilyContext {
            signature: "06_1AH",
            bank: 8,
            status,
            misc: 0x0000_0012,
            addr: 0,
            miscv: true,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle(&ctx).unwrap();
        assert!(outcome
            .reserved_error_status_other_information
            .iter()
            .any(|(k, v)| k == "CORE_ERR_CNT" && v == "2"));
        assert!(outcome
            .reserved_error_status_other_information
            .iter()
            .any(|(k, _)| k == "Channel"));
        assert!(outcome
            .reserved_error_status_other_information
            .iter()
            .any(|(k, _)| k == "RTId"));
    }

    #[test]
    fn bank0_qpi_code() {
        let ctx = FamilyContext {
            signature: "06_1AH",
            bank: 0,
            status: 0x0301,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle(&ctx).unwrap();
        assert_eq!(
            outcome.meaning.as_deref(),
            Some("QPI Error / QPI Physical Layer CRC error")
        );
    }
}
