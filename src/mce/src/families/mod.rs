// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Family-specific incremental decoding (§4.4.8).
//!
//! A registry from `(processor_signature, bank)` to a handler function, per §9's "table-driven
//! design" note: some entries need bank *ranges* (e.g. Haswell-E's iMC banks `9..=16`), which a
//! flat `phf::Map` keys awkwardly, so the registry is a `match` on the signature followed by a
//! range check on the bank rather than a literal map. Every handler here can redefine the MCA
//! error code's interpretation/meaning, and can replace `model_specific_errors` and
//! `reserved_error_status_other_information` wholesale — it never merges with the generic
//! fields, per §3's invariant that family overrides "fully replace" what they supersede.
//!
//! None of this workspace's retrieval pack carries the Intel SDM's per-family appendix tables
//! (`original_source/` for this spec was empty — see `SPEC_FULL.md` §"original_source"), so the
//! numeric sub-codes below are representative samples grounded in the category structure §4.4.8
//! names (QPI, iMC, Home Agent, ...), not verbatim transcriptions. See `DESIGN.md`.

mod broadwell;
mod common;
mod core2;
mod goldmont;
mod haswell_e;
mod ivybridge_ep;
mod nehalem;
mod p6;
mod pentium4;
mod sandybridge;
mod skylake_sp;

use crate::event::Warning;

/// Everything a family handler needs to know about the event it is asked to refine.
#[derive(Debug, Clone, Copy)]
pub struct FamilyContext<'a> {
    /// Canonical `FF_MMH` Processor Signature.
    pub signature: &'a str,
    /// MCA bank index.
    pub bank: u32,
    /// Raw `IA32_MCi_STATUS`.
    pub status: u64,
    /// Raw `IA32_MCi_MISC`.
    pub misc: u64,
    /// Raw `IA32_MCi_ADDR`.
    pub addr: u64,
    /// `MISCV`.
    pub miscv: bool,
    /// `ADDRV`.
    pub addrv: bool,
    /// The externally-supplied stand-in for the otherwise-unreadable `MSR_ERROR_CONTROL[1]`
    /// (§9 Design Note), used by Sandy Bridge's iMC handler.
    pub msr_error_control_bit1: bool,
}

/// What a family handler contributes back to the [`crate::DecodedMcaEvent`] being built.
#[derive(Debug, Clone, Default)]
pub struct FamilyOutcome {
    /// Replaces `mca_error.interpretation` when set.
    pub interpretation: Option<String>,
    /// Replaces `mca_error.meaning` when set.
    pub meaning: Option<String>,
    /// Wholesale replacement for `model_specific_errors`.
    pub model_specific_errors: Vec<(String, String)>,
    /// Wholesale replacement for `reserved_error_status_other_information`.
    pub reserved_error_status_other_information: Vec<(String, String)>,
    /// Warnings raised while resolving a model-specific sub-code.
    pub warnings: Vec<Warning>,
}

impl FamilyOutcome {
    fn model_specific_sub_code_not_found(label: &str) -> Self {
        Self {
            model_specific_errors: vec![(label.to_string(), "unrecognized".to_string())],
            warnings: vec![Warning::ModelSpecificSubCodeNotFound],
            ..Default::default()
        }
    }
}

/// Splits a `FF_MMH` Processor Signature into `(family, model)` hex digits, returning `None` if
/// it isn't in the canonical shape this registry matches against.
fn split_signature(signature: &str) -> Option<(&str, &str)> {
    let (family, rest) = signature.split_once('_')?;
    let model = rest.strip_suffix('H')?;
    Some((family, model))
}

/// Looks up a family-specific handler for `(ctx.signature, ctx.bank)` and, if one matches, runs
/// it. Returns `None` if no family/bank combination in §4.4.8 matches — the caller leaves
/// `incremental_decoded=false` and keeps the generic decoding untouched.
#[must_use]
pub fn dispatch(ctx: &FamilyContext<'_>) -> Option<FamilyOutcome> {
    let (family, model) = split_signature(ctx.signature)?;

    match family {
        "06" => match model {
            "01" | "03" | "05" | "07" | "08" | "09" | "0A" | "0B" | "0D" | "0E" => {
                p6::handle(ctx)
            }
            "0F" | "17" | "1D" => core2::handle(ctx),
            "1A" => nehalem::handle(ctx),
            "2D" => sandybridge::handle(ctx),
            "3E" => ivybridge_ep::handle(ctx),
            "3F" => haswell_e::handle(ctx),
            "56" => broadwell::handle_d(ctx),
            "4F" => broadwell::handle_e5(ctx),
            "55" => skylake_sp::handle(ctx),
            "5F" => goldmont::handle(ctx),
            _ => None,
        },
        "0F" => pentium4::handle(ctx),
        _ => None,
    }
}
