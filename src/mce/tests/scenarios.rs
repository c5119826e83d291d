// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end walkthroughs of the six concrete scenarios, exercised only through the public API
//! (`mce::decode`, `MCGCapability::decode`, `cpuid::decode`).

use cpuid::{CpuidLeaves, RawCpuidLeaf};
use mce::{DecodeInput, MCGCapability, Warning};

#[test]
fn scenario_1_mcg_cap() {
    let cap = MCGCapability::decode(0x1c09);
    assert_eq!(cap.bank_count, 9);
    assert!(!cap.ctl_p);
    assert!(!cap.ext_p);
    assert!(cap.cmci_p);
    assert!(cap.tes_p);
    assert!(!cap.ser_p);
    assert!(!cap.emc_p);
    assert!(!cap.elog_p);
    assert!(!cap.lmce_p);
}

#[test]
fn scenario_2_processor_signature() {
    let leaves = CpuidLeaves {
        leaf_1: Some(RawCpuidLeaf {
            eax: 0x0000_06F6,
            ebx: 0,
            ecx: 0,
            edx: 0,
        }),
        ..Default::default()
    };
    let record = cpuid::decode(leaves);
    assert_eq!(record.processor_signature.as_deref(), Some("06_0FH"));
}

#[test]
fn scenario_3_full_event_walkthrough() {
    // `"2017-07-07T18:25:27.441Z cpu2:36681)MCE: 190: cpu1: bank3: status=0x9020000f0120100e: ...,
    // Addr:0x0 (invalid), Misc:0x0 (invalid)"` with MCG_CAP=0x1c09, PS=06_0FH.
    let input = DecodeInput::new(
        1,
        "2017-07-07T18:25:27.441Z".to_string(),
        1,
        3,
        MCGCapability::decode(0x1c09),
        Some("06_0FH".to_string()),
        0x9020_000f_0120_100e,
        0x0,
        0x0,
    );
    let event = mce::decode(input);

    let validity = event.validity.expect("VAL=1");
    assert!(validity.val);
    assert!(!validity.over);
    assert!(!validity.uc);
    assert!(validity.en);
    assert!(!validity.miscv);
    assert!(!validity.addrv);
    assert!(!validity.pcc);

    let mca = event.mca_error.expect("MCA error code decoded");
    assert_eq!(mca.interpretation, "Generic Cache Hierarchy");
    assert_eq!(mca.meaning, "Generic Cache Hierarchy / Level 2");
    assert_eq!(mca.correction_report_filtering, Some("corrected"));

    let reserved = &event.reserved_error_status_other_information;
    assert!(reserved.iter().any(|(k, _)| k == "Corrected_Error_Count"));
    assert!(reserved
        .iter()
        .any(|(k, _)| k == "Threshold-Based_Error_Status"));

    assert!(!event.incremental_decoded);
}

#[test]
fn scenario_4_status_not_valid() {
    let input = DecodeInput::new(
        1,
        "t".to_string(),
        0,
        0,
        MCGCapability::decode(0x1c09),
        None,
        0x0,
        0x0,
        0x0,
    );
    let event = mce::decode(input);
    assert!(event.validity.is_none());
    assert!(event.mca_error.is_none());
    assert_eq!(event.warnings, vec![Warning::StatusNotValid]);
}

#[test]
fn scenario_5_simple_io_error() {
    let status = (1u64 << 63) | 0x0E0B;
    let input = DecodeInput::new(
        1,
        "t".to_string(),
        0,
        0,
        MCGCapability::decode(0x1c09),
        None,
        status,
        0x0,
        0x0,
    );
    let event = mce::decode(input);
    let mca = event.mca_error.expect("MCA error code decoded");
    assert_eq!(mca.interpretation, "I/O Error");
    assert_eq!(mca.r#type, "Simple");
}

#[test]
fn scenario_6_memory_controller_address_gib() {
    // Memory Controller Errors (`000F 0000 1MMM CCCC`): MMM=RD(001), channel=6.
    let low16: u64 = 0b0000_0000_1001_0110;
    let addr: u64 = 0x1_2345_6789;
    let misc: u64 = (0b010 << 6) | 6; // Address Mode=Physical, Recoverable_Address_LSB=6.
    let status = (1u64 << 63) // VAL
        | (1u64 << 59) // MISCV
        | (1u64 << 58) // ADDRV
        | low16;

    let mut capability = MCGCapability::decode(0x1c09);
    capability.ser_p = true;

    let input = DecodeInput::new(
        1,
        "t".to_string(),
        0,
        9,
        capability,
        None,
        status,
        addr,
        misc,
    );
    let event = mce::decode(input);

    assert_eq!(event.recoverable_address_lsb, Some(6));
    let expected_valid = (addr >> 6) << 6;
    assert_eq!(event.address_valid, Some(expected_valid));
    assert!(event.address_gib.is_some());
}
