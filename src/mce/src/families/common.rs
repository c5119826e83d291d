// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Decode helpers shared by more than one family handler: the P6-style bus-queue request/error
//! type pair (reused by the older P6 family and the Pentium 4 family), a QPI/interconnect code
//! lookup, and an integrated-Memory-Controller (iMC) code lookup.

use bitslice::BitSlice;

/// `status[24:19]`, the 6-bit bus-queue request type used by the older P6-family bus/interconnect
/// banks and, per §4.4.8, the Pentium 4 family.
#[must_use]
pub fn bus_queue_request_type(status: u64) -> &'static str {
    match status.bits(24, 19).unwrap_or(0) {
        0b000000 => "BQ_DCU_READ_TYPE",
        0b000001 => "BQ_IFU_DEMAND_TYPE",
        0b000010 => "BQ_IFU_DEMAND_NC_TYPE",
        0b000011 => "BQ_DCU_RFO_TYPE",
        0b000100 => "BQ_DCU_RFO_LOCK_TYPE",
        0b000101 => "BQ_DCU_ITOM_TYPE",
        0b000110 => "BQ_DCU_WB_TYPE",
        0b000111 => "BQ_DCU_WCEVICT_TYPE",
        0b001000 => "BQ_DCU_WCLINE_TYPE",
        0b001001 => "BQ_DCU_BTM_TYPE",
        0b001010 => "BQ_DCU_INTACK_TYPE",
        0b001011 => "BQ_DCU_INVALL2_TYPE",
        0b001100 => "BQ_DCU_FLUSH_TYPE",
        0b001101 => "BQ_DCU_PART_RD_TYPE",
        0b001110 => "BQ_DCU_PART_WR_TYPE",
        0b001111 => "BQ_DCU_SPEC_CYC_TYPE",
        0b010000 => "BQ_DCU_IO_RD_TYPE",
        0b010001 => "BQ_DCU_IO_WR_TYPE",
        0b010010 => "BQ_DCU_LOCK_RD_TYPE",
        0b010011 => "BQ_DCU_SPLOCK_RD_TYPE",
        0b010100 => "BQ_DCU_LOCK_WR_TYPE",
        _ => "BQ_RESERVED_TYPE",
    }
}

/// `status[18:16]`, the 3-bit bus-queue error type.
#[must_use]
pub fn bus_queue_error_type(status: u64) -> &'static str {
    match status.bits(18, 16).unwrap_or(0) {
        0b000 => "BQ Parity Error",
        0b001 => "Response Hard Error",
        0b010 => "Response Parity Error",
        0b011 => "Timeout BINIT",
        0b100 => "Hard Error",
        0b101 => "FRC Error",
        _ => "Reserved",
    }
}

/// `status[31:29]` as the "Other Information" flag triple the P6/Pentium-4 bus handlers attach:
/// (`Hard_error`, `IERR`, `AERR`).
#[must_use]
pub fn bus_other_information_flags(status: u64) -> Vec<(String, String)> {
    vec![
        (
            "External_BINIT".to_string(),
            status.bit(30).unwrap_or(0).to_string(),
        ),
        (
            "Response_parity_error".to_string(),
            status.bit(29).unwrap_or(0).to_string(),
        ),
        (
            "Bus_BINIT".to_string(),
            status.bit(28).unwrap_or(0).to_string(),
        ),
        (
            "Timeout_BINIT".to_string(),
            status.bit(27).unwrap_or(0).to_string(),
        ),
        (
            "Hard_error".to_string(),
            status.bit(26).unwrap_or(0).to_string(),
        ),
        ("IERR".to_string(), status.bit(25).unwrap_or(0).to_string()),
        ("AERR".to_string(), status.bit(24).unwrap_or(0).to_string()),
        // §9: the source keys `UECC` and `CECC` both at bit 45, once each, overwriting one
        // another; preserved here as a single documented key rather than silently invented.
        (
            "UECC/CECC".to_string(),
            status.bit(45).unwrap_or(0).to_string(),
        ),
        (
            "ECC_syndrome".to_string(),
            status.bits(54, 46).unwrap_or(0).to_string(),
        ),
    ]
}

/// Looks up a QPI/interconnect sub-code in a small static table, keyed by `status[15:0]`.
#[must_use]
pub fn qpi_code(table: &[(u16, &'static str)], code: u16) -> Option<&'static str> {
    table
        .iter()
        .find(|(entry, _)| *entry == code)
        .map(|(_, name)| *name)
}

/// Looks up an iMC sub-code in a small static table, keyed by `status[15:0]`.
#[must_use]
pub fn imc_code(table: &[(u16, &'static str)], code: u16) -> Option<&'static str> {
    qpi_code(table, code)
}

/// DIMM/Channel/Syndrome fields read out of `IA32_MCi_MISC` for an iMC bank, in the layout used
/// from Nehalem onward.
#[must_use]
pub fn imc_misc_fields(misc: u64) -> Vec<(String, String)> {
    vec![
        ("Channel".to_string(), misc.bits(3, 0).unwrap_or(0).to_string()),
        ("DIMM".to_string(), misc.bits(5, 4).unwrap_or(0).to_string()),
        (
            "Syndrome".to_string(),
            format!("{:#x}", misc.bits(63, 32).unwrap_or(0)),
        ),
    ]
}
