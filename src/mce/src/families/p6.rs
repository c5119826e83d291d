// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `06_01H`/`06_03H`/`06_05H`/`06_07H`/`06_08H`/`06_09H`/`06_0AH`/`06_0BH`/`06_0DH`/`06_0EH`
//! (Pentium Pro through Pentium M): Bus and Interconnect Errors decode a bus-queue request type,
//! a bus-queue error type, and the FRC/BERR/BINIT "Other Information" flags (§4.4.8).

use crate::error_code::{self, McaErrorCode};
use crate::families::{common, FamilyContext, FamilyOutcome};

pub fn handle(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    let code = error_code::decode(u16::try_from(ctx.status & 0xffff).unwrap_or(0))?;
    if !matches!(code, McaErrorCode::BusAndInterconnectErrors { .. }) {
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
    fn bus_error_decodes_request_and_error_type() {
        // status[15:0] set to a Bus and Interconnect Errors pattern (`1PPT RRRR IILL`):
        // PP=SRC(00), T=NOTIMEOUT(0), RRRR=RD(0001), II=M(00), LL=L0(00) -> 0x8010.
        let status: u64 = 0x8010 | (0b000_001 << 19);
        let ctx = FamilyContext {
            signature: "06_0DH",
            bank: 0,
            status,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        let outcome = handle(&ctx).expect("bus/interconnect code must dispatch");
        assert!(outcome
            .model_specific_errors
            .iter()
            .any(|(k, v)| k == "Bus_queue_request_type" && v == "BQ_IFU_DEMAND_TYPE"));
    }

    #[test]
    fn non_bus_code_does_not_dispatch() {
        let ctx = FamilyContext {
            signature: "06_0DH",
            bank: 0,
            status: 0x0000_0000_0000_0000,
            misc: 0,
            addr: 0,
            miscv: false,
            addrv: false,
            msr_error_control_bit1: true,
        };
        assert!(handle(&ctx).is_none());
    }
}
