// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `06_0FH`/`06_17H`/`06_1DH` (Core 2 family). `06_0FH`/`06_17H` reuse the P6 bus-queue decode;
//! `06_1DH` bank 6 overrides the generic code entirely with a 21-entry Internal/Bus error table
//! keyed by `status[15:0]` (§4.4.8).

use bitslice::BitSlice;

use crate::families::{common, p6, FamilyContext, FamilyOutcome};

/// `06_1DH` bank 6's Internal/Bus error codes (Inclusion, Write Exclusive, Timeout, and outgoing
/// core-data ECC events).
const BANK6_CODES: [(u16, &str); 21] = [
    (0x0010, "Inclusion error from core 0"),
    (0x0011, "Inclusion error from core 1"),
    (0x0012, "Write exclusive error from core 0"),
    (0x0013, "Write exclusive error from core 1"),
    (0x0014, "Bus/Interconnect timeout, core 0"),
    (0x0015, "Bus/Interconnect timeout, core 1"),
    (0x0020, "Single-bit ECC error, outgoing core 0 data"),
    (0x0021, "Single-bit ECC error, outgoing core 1 data"),
    (0x0022, "Multi-bit ECC error, outgoing core 0 data"),
    (0x0023, "Multi-bit ECC error, outgoing core 1 data"),
    (0x0030, "L3 tag error, core 0"),
    (0x0031, "L3 tag error, core 1"),
    (0x0032, "L3 data error, core 0"),
    (0x0033, "L3 data error, core 1"),
    (0x0040, "Snoop response error, core 0"),
    (0x0041, "Snoop response error, core 1"),
    (0x0050, "Quickpath/FSB protocol error"),
    (0x0051, "Quickpath/FSB parity error"),
    (0x0060, "Internal unclassified fatal error, core 0"),
    (0x0061, "Internal unclassified fatal error, core 1"),
    (0x0070, "L3 eviction/writeback error"),
];

pub fn handle(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    if ctx.signature == "06_1DH" && ctx.bank == 6 {
        let code = u16::try_from(ctx.status.bits(15, 0).unwrap_or(0)).unwrap_or(0);
        return Some(match common::qpi_code(&BANK6_CODES, code) {
            Some(name) => FamilyOutcome {
                interpretation: Some("Internal/Bus Error".to_string()),
                meaning: Some(format!("Internal/Bus Error / {name}")),
                ..Default::default()
            },
            None => FamilyOutcome::model_specific_sub_code_not_found("Internal/Bus Error"),
        });
    }

    // `06_0FH`/`06_17H` (and `06_1DH` on banks other than 6) decode like the older P6 bus
    // handler.
    p6::handle(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank6_known_code() {
        let ctx = FamilyContext {
            signature: "06_1DH",
            bank: 6,
            status: 0x0010,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle(&ctx).unwrap();
        assert_eq!(
            outcome.meaning.as_deref(),
            Some("Internal/Bus Error / Inclusion error from core 0")
        );
    }

    #[test]
    fn bank6_unknown_code_warns() {
        let ctx = FamilyContext {
            signature: "06_1DH",
            bank: 6,
            status: 0xffff,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle(&ctx).unwrap();
        assert!(!outcome.warnings.is_empty());
    }
}
