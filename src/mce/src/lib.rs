// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
#![warn(missing_docs, clippy::similar_names, clippy::module_name_repetitions)]

//! Decodes a `(IA32_MCi_STATUS, IA32_MCi_ADDR, IA32_MCi_MISC)` triple into a structured,
//! processor-family-aware [`DecodedMcaEvent`] (§4.4).
//!
//! [`decode`] is the only entry point. It never panics and never returns a `Result` — every
//! recoverable interpretation failure is recorded as a [`Warning`] on the returned event rather
//! than propagated to the caller, per §4.4.1's "the decoder never throws" contract. The three
//! leaf-first inputs it needs — [`MCGCapability`] (this crate's own [`mcg_cap`]) and the
//! Processor Signature (the `cpuid` crate) — are supplied already-decoded; this crate does not
//! know how to derive them.

pub mod error_code;
mod event;
mod families;
pub mod mcg_cap;
pub mod msr;

use bitslice::BitSlice;
use log::{debug, warn};

pub use error_code::McaErrorCode;
pub use event::{AddressMode, DecodedMcaEvent, McaError, UcrClass, Validity, Warning};
pub use mcg_cap::MCGCapability;

use families::FamilyContext;

/// Everything [`decode`] needs for one event.
#[derive(Debug, Clone)]
pub struct DecodeInput {
    /// Ascending identifier; the caller is responsible for assigning these so that output
    /// ordering can track input order (§5).
    pub id: u64,
    /// Opaque timestamp token, carried through unparsed.
    pub timestamp: String,
    /// Logical CPU the event was reported on.
    pub cpu: u32,
    /// MCA bank index.
    pub bank: u32,
    /// Decoded `IA32_MCG_CAP`.
    pub capability: MCGCapability,
    /// Canonical `FF_MMH` Processor Signature, if known. Family-specific dispatch (§4.4.8) is
    /// skipped entirely when this is `None`.
    pub processor_signature: Option<String>,
    /// Raw `IA32_MCi_STATUS`.
    pub status: u64,
    /// Raw `IA32_MCi_ADDR`.
    pub addr: u64,
    /// Raw `IA32_MCi_MISC`.
    pub misc: u64,
    /// Stand-in for the otherwise-unreadable `MSR_ERROR_CONTROL[1]` (§9 Design Note). Default
    /// `true` to stay behavior-compatible with the source this was ported from.
    pub msr_error_control_bit1: bool,
}

impl DecodeInput {
    /// Convenience constructor defaulting `msr_error_control_bit1` to `true` (§9).
    #[must_use]
    pub fn new(
        id: u64,
        timestamp: String,
        cpu: u32,
        bank: u32,
        capability: MCGCapability,
        processor_signature: Option<String>,
        status: u64,
        addr: u64,
        misc: u64,
    ) -> Self {
        Self {
            id,
            timestamp,
            cpu,
            bank,
            capability,
            processor_signature,
            status,
            addr,
            misc,
            msr_error_control_bit1: true,
        }
    }
}

fn threshold_status_name(bits: u64) -> &'static str {
    match bits {
        0b00 => "No tracking",
        0b01 => "Green",
        0b10 => "Yellow",
        _ => "Reserved",
    }
}

/// Decodes one MCA bank status triple into a [`DecodedMcaEvent`] (§4.4.1).
#[must_use]
pub fn decode(input: DecodeInput) -> DecodedMcaEvent {
    let DecodeInput {
        id,
        timestamp,
        cpu,
        bank,
        capability,
        processor_signature,
        status,
        addr,
        misc,
        msr_error_control_bit1,
    } = input;

    let mut event =
        DecodedMcaEvent::identity_only(id, timestamp, cpu, bank, status, addr, misc);

    // §4.4.2 validity gate.
    let val = status.bit(63).unwrap() != 0;
    if !val {
        debug!("cpu {cpu} bank {bank}: {}", Warning::StatusNotValid.message());
        event.warnings.push(Warning::StatusNotValid);
        return event;
    }

    let over = status.bit(62).unwrap() != 0;
    let uc = status.bit(61).unwrap() != 0;
    let en = status.bit(60).unwrap() != 0;
    let miscv = status.bit(59).unwrap() != 0;
    let addrv = status.bit(58).unwrap() != 0;
    let pcc = status.bit(57).unwrap() != 0;

    event.validity = Some(Validity {
        val,
        over,
        uc,
        en,
        miscv,
        addrv,
        pcc,
    });

    // §4.4.3 architectural status fields, dependent on MCG_CAP.
    let mut s = false;
    let mut ar = false;
    if capability.tes_p {
        if capability.ser_p {
            s = status.bit(56).unwrap() != 0;
            ar = status.bit(55).unwrap() != 0;
        }
        if !uc {
            let threshold = threshold_status_name(status.bits(54, 53).unwrap());
            event.reserved_error_status_other_information.push((
                "Threshold-Based_Error_Status".to_string(),
                threshold.to_string(),
            ));
        }
    }
    if capability.cmci_p && !uc {
        let count = if status.bit(52).unwrap() == 0 {
            status.bits(51, 38).unwrap().to_string()
        } else {
            "Overflow".to_string()
        };
        event
            .reserved_error_status_other_information
            .push(("Corrected_Error_Count".to_string(), count));
    }
    if capability.emc_p {
        let indicator = status.bit(37).unwrap();
        event.reserved_error_status_other_information.push((
            "Firmware_updated_error_status_indicator".to_string(),
            indicator.to_string(),
        ));
    }

    // §4.4.4 UCR classification.
    if capability.ser_p {
        let code = (u8::from(uc) << 4)
            | (u8::from(en) << 3)
            | (u8::from(pcc) << 2)
            | (u8::from(s) << 1)
            | u8::from(ar);
        event.ucr_classification = classify_ucr(code);
        if event.ucr_classification.is_none() {
            warn!(
                "cpu {cpu} bank {bank}: {}",
                Warning::UcrClassificationCouldNotBeIdentified.message()
            );
            event
                .warnings
                .push(Warning::UcrClassificationCouldNotBeIdentified);
        }
    }

    // §4.4.5 MCA error code grammar.
    let low16 = u16::try_from(status.bits(15, 0).unwrap()).unwrap();
    let decoded_code = error_code::decode(low16);

    // §4.4.7 IA32_MCi_MISC, computed before the §4.4.6 overrides need `address_mode`.
    if miscv && capability.ser_p {
        let mode = AddressMode::decode_field(misc.bits(8, 6).unwrap());
        event.address_mode = Some(mode);
        event.recoverable_address_lsb = Some(u8::try_from(misc.bits(5, 0).unwrap()).unwrap());
    }
    if addrv {
        if let Some(lsb) = event.recoverable_address_lsb {
            if lsb > 0 {
                let cleared = if lsb >= 64 {
                    0
                } else {
                    (addr >> lsb) << lsb
                };
                event.address_valid = Some(cleared);
            }
        }
        if matches!(decoded_code, Some(McaErrorCode::MemoryControllerErrors { .. })) {
            let value = event.address_valid.unwrap_or(addr);
            let gib = value as f64 / f64::from(1u32 << 30);
            event.address_gib = Some(format!("{gib:.2}"));
        }
    }

    match decoded_code {
        None => {
            warn!(
                "cpu {cpu} bank {bank}: {} (status[15:0]={low16:#06x})",
                Warning::McaErrorCodeCouldNotBeIdentified.message()
            );
            event.warnings.push(Warning::McaErrorCodeCouldNotBeIdentified);
            event.mca_error = Some(McaError {
                r#type: "Unrecognized",
                code: None,
                interpretation: "Unrecognized".to_string(),
                meaning: "Unrecognized".to_string(),
                correction_report_filtering: None,
            });
        }
        Some(code) => {
            let kind = if code.is_compound() { "Compound" } else { "Simple" };
            let interpretation = code.name().to_string();
            let mut meaning = code.meaning();
            let mut correction_report_filtering = None;

            // §4.4.6 architectural SRAO/SRAR overrides. These run before F-bit interpretation
            // (§9) and only ever trigger with UC=1, so they can never conflict with the F bit
            // (meaningful only when UC=0).
            let override_applied = apply_architectural_override(
                &code,
                over,
                uc,
                en,
                miscv,
                addrv,
                pcc,
                s,
                ar,
                event.address_mode,
                &mut meaning,
                &mut event.ucr_classification,
                &mut event.warnings,
            );

            if !override_applied && code.is_compound() && !uc {
                let f = status.bit(12).unwrap();
                correction_report_filtering =
                    Some(if f == 1 { "corrected" } else { "uncorrected" });
            }

            event.mca_error = Some(McaError {
                r#type: kind,
                code: Some(code),
                interpretation,
                meaning,
                correction_report_filtering,
            });
        }
    }

    // §4.4.8 family-specific incremental decoding.
    if let Some(signature) = processor_signature.as_deref() {
        let ctx = FamilyContext {
            signature,
            bank,
            status,
            misc,
            addr,
            miscv,
            addrv,
            msr_error_control_bit1,
        };
        if let Some(outcome) = families::dispatch(&ctx) {
            debug!("cpu {cpu} bank {bank}: incremental decode matched {signature}");
            event.incremental_decoded = true;
            for warning in &outcome.warnings {
                warn!("cpu {cpu} bank {bank}: {}", warning.message());
            }
            if let Some(mca_error) = event.mca_error.as_mut() {
                if let Some(interpretation) = outcome.interpretation {
                    mca_error.interpretation = interpretation;
                }
                if let Some(meaning) = outcome.meaning {
                    mca_error.meaning = meaning;
                }
            }
            if !outcome.model_specific_errors.is_empty() {
                event.model_specific_errors = outcome.model_specific_errors;
            }
            if !outcome.reserved_error_status_other_information.is_empty() {
                event.reserved_error_status_other_information =
                    outcome.reserved_error_status_other_information;
            }
            event.warnings.extend(outcome.warnings);
        }
    }

    event
}

fn classify_ucr(code: u8) -> Option<UcrClass> {
    // `code` is `UC|EN|PCC|S|AR`, 5 bits.
    let uc = (code >> 4) & 1;
    let en = (code >> 3) & 1;
    let pcc = (code >> 2) & 1;
    let s = (code >> 1) & 1;
    let ar = code & 1;

    if uc == 1 && en == 1 && pcc == 1 {
        return Some(UcrClass::Uc);
    }
    if code == 0b1_1_0_1_1 {
        return Some(UcrClass::Srar);
    }
    if code == 0b1_1_0_1_0 {
        return Some(UcrClass::Srao);
    }
    if uc == 1 && pcc == 0 && s == 0 && ar == 0 {
        return Some(UcrClass::SraoUcna);
    }
    if uc == 0 {
        return Some(UcrClass::Ce);
    }
    let _ = en;
    None
}

#[allow(clippy::too_many_arguments)]
fn apply_architectural_override(
    code: &McaErrorCode,
    over: bool,
    uc: bool,
    en: bool,
    miscv: bool,
    addrv: bool,
    pcc: bool,
    s: bool,
    ar: bool,
    address_mode: Option<AddressMode>,
    meaning: &mut String,
    ucr_classification: &mut Option<UcrClass>,
    warnings: &mut Vec<Warning>,
) -> bool {
    let check_physical = |warnings: &mut Vec<Warning>| {
        if address_mode != Some(AddressMode::Physical) {
            warnings.push(Warning::PhysicalAddressModeExpectedForSraoSrar);
        }
    };

    match code {
        McaErrorCode::MemoryControllerErrors { mmm, channel } => {
            if !over
                && uc
                && miscv
                && addrv
                && !pcc
                && !ar
                && matches!(mmm, error_code::MemoryTransaction::Scrubbing)
            {
                let channel_str = channel.map_or_else(
                    || "channel not specified".to_string(),
                    |c| c.to_string(),
                );
                *meaning = format!(
                    "Architecturally Defined SRAO Errors / Memory Scrubbing / {channel_str}"
                );
                *ucr_classification = Some(UcrClass::Srao);
                check_physical(warnings);
                return true;
            }
            false
        }
        McaErrorCode::CacheHierarchyErrors { rrrr, tt, ll } => {
            if !over && uc && miscv && addrv && !pcc && !ar
                && matches!(rrrr, error_code::Request::Evict)
                && matches!(tt, error_code::TransactionType::Generic)
                && matches!(ll, error_code::MemoryHierarchyLevel::L2)
            {
                *meaning = "Architecturally Defined SRAO Errors / L3 Explicit Writeback".to_string();
                *ucr_classification = Some(UcrClass::Srao);
                check_physical(warnings);
                return true;
            }
            if !over && uc && en && miscv && addrv && !pcc && s && ar {
                if matches!(rrrr, error_code::Request::DataRead)
                    && matches!(tt, error_code::TransactionType::Data)
                    && matches!(ll, error_code::MemoryHierarchyLevel::L0)
                {
                    *meaning = "Architecturally Defined SRAR Errors / Data Load".to_string();
                    *ucr_classification = Some(UcrClass::Srar);
                    check_physical(warnings);
                    return true;
                }
                if matches!(rrrr, error_code::Request::InstructionRead)
                    && matches!(tt, error_code::TransactionType::Instruction)
                    && matches!(ll, error_code::MemoryHierarchyLevel::L0)
                {
                    *meaning = "Architecturally Defined SRAR Errors / Instruction Fetch".to_string();
                    *ucr_classification = Some(UcrClass::Srar);
                    check_physical(warnings);
                    return true;
                }
                false
            } else {
                false
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input(status: u64) -> DecodeInput {
        DecodeInput::new(
            1,
            "2017-07-07T18:25:27.441Z".to_string(),
            1,
            3,
            MCGCapability::decode(0x1c09),
            Some("06_0FH".to_string()),
            status,
            0,
            0,
        )
    }

    #[test]
    fn scenario_4_status_not_valid() {
        let event = decode(base_input(0x0));
        assert!(event.validity.is_none());
        assert_eq!(event.warnings, vec![Warning::StatusNotValid]);
        assert!(event.mca_error.is_none());
    }

    #[test]
    fn scenario_3_generic_cache_hierarchy() {
        let event = decode(base_input(0x9020_000f_0120_100e));
        let validity = event.validity.unwrap();
        assert!(validity.val);
        assert!(!validity.over);
        assert!(!validity.uc);
        assert!(validity.en);
        assert!(!validity.miscv);
        assert!(!validity.addrv);
        assert!(!validity.pcc);

        let mca = event.mca_error.unwrap();
        assert_eq!(mca.interpretation, "Generic Cache Hierarchy");
        assert_eq!(mca.meaning, "Generic Cache Hierarchy / Level 2");
        assert_eq!(mca.correction_report_filtering.as_deref(), Some("corrected"));

        assert!(event
            .reserved_error_status_other_information
            .iter()
            .any(|(k, _)| k == "Corrected_Error_Count"));
        assert!(event
            .reserved_error_status_other_information
            .iter()
            .any(|(k, _)| k == "Threshold-Based_Error_Status"));
        assert!(!event.incremental_decoded);
    }

    #[test]
    fn scenario_5_io_error_simple() {
        let status: u64 = (1u64 << 63) | 0x0E0B;
        let event = decode(base_input(status));
        let mca = event.mca_error.unwrap();
        assert_eq!(mca.interpretation, "I/O Error");
        assert_eq!(mca.r#type, "Simple");
        assert!(mca.correction_report_filtering.is_none());
    }

    #[test]
    fn scenario_6_memory_controller_address_gib() {
        // Memory Controller Errors: `000F 0000 1MMM CCCC`, MMM=RD(001), channel=6.
        let low16: u64 = 0b0000_0000_1001_0110;
        let addr: u64 = 0x1_2345_6789;
        let misc: u64 = (0b010 << 6) | 6; // Address Mode=Physical, LSB=6.
        let mut input = base_input((1u64 << 63) | (1u64 << 59) | (1u64 << 58) | low16);
        input.misc = misc;
        input.addr = addr;
        input.capability = MCGCapability::decode(0x0100_1c09); // ser_p=1 (bit 24).
        let event = decode(input);

        assert_eq!(event.recoverable_address_lsb, Some(6));
        let expected_valid = (addr >> 6) << 6;
        assert_eq!(event.address_valid, Some(expected_valid));
        assert!(event.address_gib.is_some());
        assert_eq!(event.address_mode, Some(AddressMode::Physical));
    }

    #[test]
    fn address_gib_absent_without_addrv() {
        let low16: u64 = 0b0000_0000_1001_0110;
        let input = base_input((1u64 << 63) | low16);
        let event = decode(input);
        assert!(event.address_gib.is_none());
    }

    #[test]
    fn ucr_classification_uc() {
        // UC=1,EN=1,PCC=1 matches `111..` -> UC, regardless of S/AR.
        let status = (1u64 << 63) | (1u64 << 61) | (1u64 << 60) | (1u64 << 57);
        let mut input = base_input(status);
        input.capability.ser_p = true;
        let event = decode(input);
        assert_eq!(event.ucr_classification, Some(UcrClass::Uc));
    }

    #[test]
    fn ucr_classification_ce() {
        let status = 1u64 << 63; // UC=0.
        let mut input = base_input(status);
        input.capability.ser_p = true;
        let event = decode(input);
        assert_eq!(event.ucr_classification, Some(UcrClass::Ce));
    }

    #[test]
    fn srao_memory_scrubbing_override() {
        // Memory Controller Errors, MMM=Scrubbing(100), channel=0xF (not specified).
        let low16: u64 = 0b0000_0000_1100_1111;
        let status = (1u64 << 63) // VAL
            | (1u64 << 61) // UC
            | (1u64 << 59) // MISCV
            | (1u64 << 58) // ADDRV
            | low16;
        let mut input = base_input(status);
        input.capability.ser_p = true;
        input.misc = 0b010 << 6; // Address Mode=Physical, LSB=0.
        let event = decode(input);
        let mca = event.mca_error.unwrap();
        assert_eq!(
            mca.meaning,
            "Architecturally Defined SRAO Errors / Memory Scrubbing / channel not specified"
        );
        assert_eq!(event.ucr_classification, Some(UcrClass::Srao));
        assert!(mca.correction_report_filtering.is_none());
    }

    #[test]
    fn srao_override_warns_when_address_mode_not_physical() {
        let low16: u64 = 0b0000_0000_1100_1111;
        let status = (1u64 << 63) | (1u64 << 61) | (1u64 << 59) | (1u64 << 58) | low16;
        let mut input = base_input(status);
        input.capability.ser_p = true;
        input.misc = 0b001 << 6; // Address Mode=Linear, not Physical.
        let event = decode(input);
        assert!(event
            .warnings
            .contains(&Warning::PhysicalAddressModeExpectedForSraoSrar));
    }
}
