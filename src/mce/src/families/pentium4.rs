// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `0F_xxH` (Pentium IV family): Bus and Interconnect Errors and Cache Hierarchy Errors reuse
//! the P6-style bus-queue decode; `0F_06H` bank 4 additionally has its own internal-error code
//! table (§4.4.8).

use bitslice::BitSlice;

use crate::error_code::{self, McaErrorCode};
use crate::families::{common, FamilyContext, FamilyOutcome};

const BANK4_INTERNAL_CODES: [(u16, &str); 8] = [
    (0x0000, "Internal unclassified error"),
    (0x0001, "Internal timer error"),
    (0x0002, "Trace cache parity error"),
    (0x0003, "Front-end unclassified error"),
    (0x0004, "Execution unit parity error"),
    (0x0005, "Retirement unclassified error"),
    (0x0006, "Microcode ROM parity error"),
    (0x0007, "Thermal control circuit error"),
];

pub fn handle(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    if ctx.signature == "0F_06H" && ctx.bank == 4 {
        let code = u16::try_from(ctx.status.bits(15, 0).unwrap_or(0)).unwrap_or(0);
        return Some(match common::qpi_code(&BANK4_INTERNAL_CODES, code) {
            Some(name) => FamilyOutcome {
                interpretation: Some("Internal Error".to_string()),
                meaning: Some(format!("Internal Error / {name}")),
                ..Default::default()
            },
            None => FamilyOutcome::model_specific_sub_code_not_found("Internal Error"),
        });
    }

    let decoded = error_code::decode(u16::try_from(ctx.status & 0xffff).unwrap_or(0))?;
    if !matches!(
        decoded,
        McaErrorCode::BusAndInterconnectErrors { .. } | McaErrorCode::CacheHierarchyErrors { .. }
    ) {
        return None;
    }

    Some(FamilyOutcome {
        model_specific_errors: vec![
            (
                "Bus_queue_request_type".to_string(),
                common::bus_queue_request_type(ctx.status).to_string(),
            ),
            (
                "Bus_queue_error_type".to_string(),
                common::bus_queue_error_type(ctx.status).to_string(),
            ),
        ],
        reserved_error_status_other_information: common::bus_other_information_flags(ctx.status),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank4_internal_table() {
        let ctx = FamilyContext {
            signature: "0F_06H",
            bank: 4,
            status: 0x0006,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle(&ctx).unwrap();
        assert_eq!(
            outcome.meaning.as_deref(),
            Some("Internal Error / Microcode ROM parity error")
        );
    }
}
