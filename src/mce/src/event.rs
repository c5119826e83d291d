// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The types that make up a [`DecodedMcaEvent`] (§3 `DecodedMcaEvent`).

use crate::error_code::McaErrorCode;

/// The seven single-bit validity/architectural flags extracted from `IA32_MCi_STATUS[63:57]`
/// once `VAL=1` (§4.4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Validity {
    /// `status[63]`. Always `true` here — [`DecodedMcaEvent::validity`] is `None` when it isn't.
    pub val: bool,
    /// `status[62]`: a machine check error was not reported because of a previous error
    /// overflow.
    pub over: bool,
    /// `status[61]`: uncorrected error.
    pub uc: bool,
    /// `status[60]`: error enabled.
    pub en: bool,
    /// `status[59]`: `IA32_MCi_MISC` register is valid.
    pub miscv: bool,
    /// `status[58]`: `IA32_MCi_ADDR` register is valid.
    pub addrv: bool,
    /// `status[57]`: processor context corrupt.
    pub pcc: bool,
}

/// Uncorrected Recoverable classification (§4.4.4), computed from the 5-bit
/// `UC|EN|PCC|S|AR` code when `ser_p=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UcrClass {
    /// Corrected Error.
    Ce,
    /// Uncorrected (non-recoverable).
    Uc,
    /// Software Recoverable Action Required.
    Srar,
    /// Software Recoverable Action Optional.
    Srao,
    /// Uncorrected No Action (reported as `SRAO/UCNA`, the two are not distinguished by the
    /// 5-bit code alone).
    SraoUcna,
}

impl UcrClass {
    /// The stable name used in rendered output (§3).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ce => "CE",
            Self::Uc => "UC",
            Self::Srar => "SRAR",
            Self::Srao => "SRAO",
            Self::SraoUcna => "SRAO/UCNA",
        }
    }
}

/// `IA32_MCi_MISC[8:6]` Address Mode, decoded when `ser_p=1` and `MISCV=1` (§4.4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AddressMode {
    /// `000`.
    SegmentOffset,
    /// `001`.
    Linear,
    /// `010`.
    Physical,
    /// `011`.
    Memory,
    /// `111`.
    Generic,
    /// Any other encoding.
    Reserved,
}

impl AddressMode {
    fn decode(bits: u64) -> Self {
        match bits {
            0b000 => Self::SegmentOffset,
            0b001 => Self::Linear,
            0b010 => Self::Physical,
            0b011 => Self::Memory,
            0b111 => Self::Generic,
            _ => Self::Reserved,
        }
    }

    pub(crate) fn decode_field(bits: u64) -> Self {
        Self::decode(bits)
    }

    /// `true` iff this is `Physical Address` (§4.4.6, §8 "SRAO/SRAR gating").
    #[must_use]
    pub fn is_physical(self) -> bool {
        matches!(self, Self::Physical)
    }
}

/// The decoded `status[15:0]` error code, plus the rendered interpretation/meaning strings and
/// the Correction Report Filtering flag (§3 `mca_error` block).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct McaError {
    /// `"Simple"` for an exact 16-bit match, `"Compound"` for a bitmask pattern, `"Unrecognized"`
    /// if no pattern matched at all.
    pub r#type: &'static str,
    /// The decoded code, absent if unrecognized.
    pub code: Option<McaErrorCode>,
    /// The stable code name (`McaErrorCode::name`), or `"Unrecognized"`.
    pub interpretation: String,
    /// The fully rendered meaning, including sub-field decoding and any §4.4.6 architectural
    /// override.
    pub meaning: String,
    /// The Correction Report Filtering (`F`, bit 12) flag, present only for compound codes with
    /// `UC=0` that were not overridden to an architectural SRAO/SRAR error (§4.4.5, §4.4.6, §8
    /// "Correction Report Filtering absence").
    pub correction_report_filtering: Option<&'static str>,
}

/// The recognized warning categories of §4.4.9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Warning {
    /// `VAL=0`; decoding stopped immediately.
    StatusNotValid,
    /// A `TT` sub-field encoding had no match.
    TransactionTypeNotFound,
    /// An `RRRR` sub-field encoding had no match.
    RequestCouldNotBeIdentified,
    /// `status[15:0]` matched no simple or compound pattern.
    McaErrorCodeCouldNotBeIdentified,
    /// The 5-bit `UC|EN|PCC|S|AR` code matched no UCR classification pattern.
    UcrClassificationCouldNotBeIdentified,
    /// A family-specific sub-code table had no entry for the observed bits.
    ModelSpecificSubCodeNotFound,
    /// An SRAO/SRAR architectural override fired but `address_mode != Physical Address`.
    PhysicalAddressModeExpectedForSraoSrar,
}

impl Warning {
    /// The stable category name, matching §4.4.9 verbatim.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::StatusNotValid => "status not valid",
            Self::TransactionTypeNotFound => "transaction type not found",
            Self::RequestCouldNotBeIdentified => "request could not be identified",
            Self::McaErrorCodeCouldNotBeIdentified => "MCA error code could not be identified",
            Self::UcrClassificationCouldNotBeIdentified => {
                "UCR error classification could not be identified"
            }
            Self::ModelSpecificSubCodeNotFound => "model-specific sub-code not found",
            Self::PhysicalAddressModeExpectedForSraoSrar => {
                "physical-address-mode expected for SRAO/SRAR"
            }
        }
    }
}

/// A fully decoded machine-check log entry (§3).
///
/// Immutable once returned: [`crate::decode`] builds one of these field-by-field and hands
/// ownership to the caller.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecodedMcaEvent {
    /// Ascending identifier assigned by the caller; output ordering must track this (§5).
    pub id: u64,
    /// Opaque timestamp token, carried through unparsed.
    pub timestamp: String,
    /// Logical CPU the event was reported on.
    pub cpu: u32,
    /// MCA bank index.
    pub bank: u32,
    /// Raw `IA32_MCi_STATUS`.
    pub status: u64,
    /// Raw `IA32_MCi_ADDR`.
    pub addr: u64,
    /// Raw `IA32_MCi_MISC`.
    pub misc: u64,
    /// Validity/architectural flags, absent when `VAL=0` (§3 invariant: "all other fields
    /// (except identity) are absent").
    pub validity: Option<Validity>,
    /// The decoded error code and its rendered interpretation/meaning.
    pub mca_error: Option<McaError>,
    /// Model-specific sub-fields from §4.4.8's family dispatch. Ordered name→value pairs,
    /// because the set of keys genuinely varies by processor family (§9).
    pub model_specific_errors: Vec<(String, String)>,
    /// Generic architectural "Other Information" fields from §4.4.3 plus any family-specific
    /// override of the same block.
    pub reserved_error_status_other_information: Vec<(String, String)>,
    /// UCR classification, present only when `ser_p=1` (§4.4.4).
    pub ucr_classification: Option<UcrClass>,
    /// `IA32_MCi_MISC[8:6]`, present when `ser_p=1` and `MISCV=1`.
    pub address_mode: Option<AddressMode>,
    /// `IA32_MCi_MISC[5:0]`, present under the same condition as `address_mode`.
    pub recoverable_address_lsb: Option<u8>,
    /// `addr` with its low `recoverable_address_lsb` bits cleared, present when `ADDRV=1` and
    /// `recoverable_address_lsb > 0`.
    pub address_valid: Option<u64>,
    /// `address_valid / 2^30` (falling back to `addr / 2^30` when `address_valid` is unset),
    /// formatted to two fractional digits. Present iff the MCA error code is Memory Controller
    /// Errors and `ADDRV=1` (§8 "Address_GiB presence").
    pub address_gib: Option<String>,
    /// `true` once a §4.4.8 family-specific handler matched `(processor_signature, bank)`.
    pub incremental_decoded: bool,
    /// Every warning raised while decoding this event (§4.4.9, §7).
    pub warnings: Vec<Warning>,
}

impl DecodedMcaEvent {
    pub(crate) fn identity_only(
        id: u64,
        timestamp: String,
        cpu: u32,
        bank: u32,
        status: u64,
        addr: u64,
        misc: u64,
    ) -> Self {
        Self {
            id,
            timestamp,
            cpu,
            bank,
            status,
            addr,
            misc,
            validity: None,
            mca_error: None,
            model_specific_errors: Vec::new(),
            reserved_error_status_other_information: Vec::new(),
            ucr_classification: None,
            address_mode: None,
            recoverable_address_lsb: None,
            address_valid: None,
            address_gib: None,
            incremental_decoded: false,
            warnings: Vec::new(),
        }
    }
}
