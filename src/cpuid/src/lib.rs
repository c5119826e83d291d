// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
#![warn(missing_docs, clippy::similar_names, clippy::module_name_repetitions)]

//! Decodes Intel CPUID leaves `01H`, `80000000H`, `80000001H` and `80000008H` into a
//! [`CpuidRecord`] carrying the decoded feature bits and the canonical Processor Signature
//! string consumed by the `mce` crate's family-specific dispatch.
//!
//! This crate does not fetch CPUID from a running host, and does not cover the leaves
//! (2, 4, 5, 6, 7, guest normalization, ...) firecracker's own `cpuid` crate uses to build a
//! guest vCPU's CPUID table — those concerns are out of scope for a log decoder.

mod brand;
mod intel_leaves;
mod signature;

pub use brand::brand_string;
pub use intel_leaves::{
    Leaf1Eax, Leaf1Ebx, Leaf1Ecx, Leaf1Edx, Leaf80000000Eax, Leaf80000001Ecx, Leaf80000001Edx,
    Leaf80000008Eax,
};
pub use signature::{processor_type_name, ProcessorSignature};

/// The four raw 32-bit registers returned by one `CPUID` leaf query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RawCpuidLeaf {
    /// EAX.
    pub eax: u32,
    /// EBX.
    pub ebx: u32,
    /// ECX.
    pub ecx: u32,
    /// EDX.
    pub edx: u32,
}

/// The raw CPUID leaves this decoder accepts. Per §4.3, a missing leaf simply leaves the
/// corresponding part of [`CpuidRecord`] unset — it is not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CpuidLeaves {
    /// `CPUID.01H`.
    pub leaf_1: Option<RawCpuidLeaf>,
    /// `CPUID.80000000H`.
    pub leaf_8000_0000: Option<RawCpuidLeaf>,
    /// `CPUID.80000001H`.
    pub leaf_8000_0001: Option<RawCpuidLeaf>,
    /// `CPUID.80000008H`.
    pub leaf_8000_0008: Option<RawCpuidLeaf>,
}

/// Decoded `CPUID.01H` (Model/Family/Stepping, Brand, and feature bits).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Leaf1Record {
    /// Stepping ID.
    pub stepping_id: u32,
    /// Model ID.
    pub model_id: u32,
    /// Family ID.
    pub family_id: u32,
    /// Human-readable Processor Type (`EAX[13:12]`).
    pub processor_type: &'static str,
    /// Extended Model ID.
    pub extended_model_id: u32,
    /// Extended Family ID.
    pub extended_family_id: u32,
    /// Brand string resolved from the Brand Index, if the index is one of the assigned slots.
    pub brand_string: Option<&'static str>,
    /// `CLFLUSH` line size, in 8-byte units.
    pub clflush_line_size: u32,
    /// Maximum number of addressable logical processor IDs, annotated "valid"/"invalid"
    /// depending on `EDX.HTT`.
    pub max_addressable_logical_processor_ids: (u32, &'static str),
    /// Initial APIC ID.
    pub initial_apic_id: u32,
    /// ECX feature bits, rendered "Yes"/"No".
    pub ecx_features: Vec<(&'static str, &'static str)>,
    /// EDX feature bits, rendered "Yes"/"No".
    pub edx_features: Vec<(&'static str, &'static str)>,
}

/// Decoded `CPUID.80000000H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Leaf80000000Record {
    /// Maximum Input Value for Extended Function, as an 8-digit hex value.
    pub max_extended_function_input: u32,
}

/// Decoded `CPUID.80000001H`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Leaf80000001Record {
    /// Boolean feature bits, rendered "Yes"/"No".
    pub features: Vec<(&'static str, &'static str)>,
}

/// Decoded `CPUID.80000008H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Leaf80000008Record {
    /// Physical Address Bits.
    pub physical_address_bits: u32,
    /// Linear Address Bits.
    pub linear_address_bits: u32,
}

/// The full decoded CPUID record: every leaf the decoder understands, plus the derived
/// Processor Signature string consumed by `mce`'s family-specific dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CpuidRecord {
    /// Decoded `CPUID.01H`, if that leaf was supplied.
    pub leaf_1: Option<Leaf1Record>,
    /// Decoded `CPUID.80000000H`, if that leaf was supplied.
    pub leaf_8000_0000: Option<Leaf80000000Record>,
    /// Decoded `CPUID.80000001H`, if that leaf was supplied.
    pub leaf_8000_0001: Option<Leaf80000001Record>,
    /// Decoded `CPUID.80000008H`, if that leaf was supplied.
    pub leaf_8000_0008: Option<Leaf80000008Record>,
    /// `"{DisplayFamily}_{DisplayModel}H"`, derived solely from `CPUID.01H:EAX` (§8
    /// "Processor-signature determinism"). Absent if leaf 01H was not supplied.
    pub processor_signature: Option<String>,
}

fn yes_no(bit: bool) -> &'static str {
    if bit {
        "Yes"
    } else {
        "No"
    }
}

fn decode_leaf_1(raw: RawCpuidLeaf) -> (Leaf1Record, String) {
    let eax = Leaf1Eax::from(raw.eax);
    let ebx = Leaf1Ebx::from(raw.ebx);
    let ecx = Leaf1Ecx::from(raw.ecx);
    let edx = Leaf1Edx::from(raw.edx);

    let signature = ProcessorSignature::from_eax(eax);
    let canonical = signature.canonical();

    let max_ids_validity = if edx.htt() { "valid" } else { "invalid" };

    let record = Leaf1Record {
        stepping_id: eax.stepping_id(),
        model_id: eax.model_id(),
        family_id: eax.family_id(),
        processor_type: processor_type_name(eax.processor_type()),
        extended_model_id: eax.extended_model_id(),
        extended_family_id: eax.extended_family_id(),
        brand_string: brand_string(raw.eax, u8::try_from(ebx.brand_index()).unwrap_or_default()),
        clflush_line_size: ebx.clflush_line_size(),
        max_addressable_logical_processor_ids: (
            ebx.max_addressable_logical_processor_ids(),
            max_ids_validity,
        ),
        initial_apic_id: ebx.initial_apic_id(),
        ecx_features: vec![
            ("SSE3", yes_no(ecx.sse3())),
            ("PCLMULQDQ", yes_no(ecx.pclmulqdq())),
            ("DTES64", yes_no(ecx.dtes64())),
            ("MONITOR", yes_no(ecx.monitor())),
            ("DS-CPL", yes_no(ecx.ds_cpl())),
            ("VMX", yes_no(ecx.vmx())),
            ("SMX", yes_no(ecx.smx())),
            ("EIST", yes_no(ecx.eist())),
            ("TM2", yes_no(ecx.tm2())),
            ("SSSE3", yes_no(ecx.ssse3())),
            ("CNXT-ID", yes_no(ecx.cnxt_id())),
            ("SDBG", yes_no(ecx.sdbg())),
            ("FMA", yes_no(ecx.fma())),
            ("CMPXCHG16B", yes_no(ecx.cmpxchg16b())),
            ("xTPR Update Control", yes_no(ecx.xtpr_update_control())),
            ("PDCM", yes_no(ecx.pdcm())),
            ("PCID", yes_no(ecx.pcid())),
            ("DCA", yes_no(ecx.dca())),
            ("SSE4.1", yes_no(ecx.sse4_1())),
            ("SSE4.2", yes_no(ecx.sse4_2())),
            ("x2APIC", yes_no(ecx.x2apic())),
            ("MOVBE", yes_no(ecx.movbe())),
            ("POPCNT", yes_no(ecx.popcnt())),
            ("TSC-Deadline", yes_no(ecx.tsc_deadline())),
            ("AESNI", yes_no(ecx.aesni())),
            ("XSAVE", yes_no(ecx.xsave())),
            ("OSXSAVE", yes_no(ecx.osxsave())),
            ("AVX", yes_no(ecx.avx())),
            ("F16C", yes_no(ecx.f16c())),
            ("RDRAND", yes_no(ecx.rdrand())),
        ],
        edx_features: vec![
            ("FPU", yes_no(edx.fpu())),
            ("VME", yes_no(edx.vme())),
            ("DE", yes_no(edx.de())),
            ("PSE", yes_no(edx.pse())),
            ("TSC", yes_no(edx.tsc())),
            ("MSR", yes_no(edx.msr())),
            ("PAE", yes_no(edx.pae())),
            ("MCE", yes_no(edx.mce())),
            ("CX8", yes_no(edx.cx8())),
            ("APIC", yes_no(edx.apic())),
            ("SEP", yes_no(edx.sep())),
            ("MTRR", yes_no(edx.mtrr())),
            ("PGE", yes_no(edx.pge())),
            ("MCA", yes_no(edx.mca())),
            ("CMOV", yes_no(edx.cmov())),
            ("PAT", yes_no(edx.pat())),
            ("PSE-36", yes_no(edx.pse_36())),
            ("PSN", yes_no(edx.psn())),
            ("CLFSH", yes_no(edx.clfsh())),
            ("DS", yes_no(edx.ds())),
            ("ACPI", yes_no(edx.acpi())),
            ("MMX", yes_no(edx.mmx())),
            ("FXSR", yes_no(edx.fxsr())),
            ("SSE", yes_no(edx.sse())),
            ("SSE2", yes_no(edx.sse2())),
            ("SS", yes_no(edx.ss())),
            ("HTT", yes_no(edx.htt())),
            ("TM", yes_no(edx.tm())),
            ("PBE", yes_no(edx.pbe())),
        ],
    };

    (record, canonical)
}

fn decode_leaf_8000_0000(raw: RawCpuidLeaf) -> Leaf80000000Record {
    Leaf80000000Record {
        max_extended_function_input: Leaf80000000Eax::from(raw.eax).max_extended_function_input(),
    }
}

fn decode_leaf_8000_0001(raw: RawCpuidLeaf) -> Leaf80000001Record {
    let ecx = Leaf80000001Ecx::from(raw.ecx);
    let edx = Leaf80000001Edx::from(raw.edx);
    Leaf80000001Record {
        features: vec![
            ("LAHF/SAHF", yes_no(ecx.lahf_sahf())),
            ("LZCNT", yes_no(ecx.lzcnt())),
            ("PREFETCHW", yes_no(ecx.prefetchw())),
            ("SYSCALL/SYSRET", yes_no(edx.syscall_sysret())),
            ("XD", yes_no(edx.xd())),
            ("1-GByte pages", yes_no(edx.page_1gb())),
            ("RDTSCP/IA32_TSC_AUX", yes_no(edx.rdtscp())),
            ("Intel 64 Architecture", yes_no(edx.intel64())),
        ],
    }
}

fn decode_leaf_8000_0008(raw: RawCpuidLeaf) -> Leaf80000008Record {
    let eax = Leaf80000008Eax::from(raw.eax);
    Leaf80000008Record {
        physical_address_bits: eax.physical_address_bits(),
        linear_address_bits: eax.linear_address_bits(),
    }
}

/// Decodes the raw [`CpuidLeaves`] this decoder understands into a [`CpuidRecord`].
///
/// Leaves absent from the input are simply absent from the output (§4.3: "no exception is
/// raised"); the decoder never fails.
#[must_use]
pub fn decode(leaves: CpuidLeaves) -> CpuidRecord {
    let (leaf_1, processor_signature) = match leaves.leaf_1 {
        Some(raw) => {
            let (record, signature) = decode_leaf_1(raw);
            (Some(record), Some(signature))
        }
        None => (None, None),
    };

    CpuidRecord {
        leaf_1,
        leaf_8000_0000: leaves.leaf_8000_0000.map(decode_leaf_8000_0000),
        leaf_8000_0001: leaves.leaf_8000_0001.map(decode_leaf_8000_0001),
        leaf_8000_0008: leaves.leaf_8000_0008.map(decode_leaf_8000_0008),
        processor_signature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_core2_signature() {
        let leaves = CpuidLeaves {
            leaf_1: Some(RawCpuidLeaf {
                eax: 0x0000_06F6,
                ebx: 0,
                ecx: 0,
                edx: 0,
            }),
            ..Default::default()
        };
        let record = decode(leaves);
        assert_eq!(record.processor_signature.as_deref(), Some("06_0FH"));
    }

    #[test]
    fn missing_leaf_is_absent_not_error() {
        let record = decode(CpuidLeaves::default());
        assert!(record.leaf_1.is_none());
        assert!(record.processor_signature.is_none());
    }

    #[test]
    fn htt_gates_max_addressable_ids_validity() {
        let leaves = CpuidLeaves {
            leaf_1: Some(RawCpuidLeaf {
                eax: 0x0000_06F6,
                ebx: 0x0001_0000,
                ecx: 0,
                edx: 0,
            }),
            ..Default::default()
        };
        let record = decode(leaves).leaf_1.unwrap();
        assert_eq!(record.max_addressable_logical_processor_ids, (1, "invalid"));

        let leaves_htt = CpuidLeaves {
            leaf_1: Some(RawCpuidLeaf {
                eax: 0x0000_06F6,
                ebx: 0x0001_0000,
                ecx: 0,
                edx: 1 << 28,
            }),
            ..Default::default()
        };
        let record_htt = decode(leaves_htt).leaf_1.unwrap();
        assert_eq!(
            record_htt.max_addressable_logical_processor_ids,
            (1, "valid")
        );
    }

    #[test]
    fn extended_function_and_address_bits() {
        let leaves = CpuidLeaves {
            leaf_8000_0000: Some(RawCpuidLeaf {
                eax: 0x8000_0008,
                ebx: 0,
                ecx: 0,
                edx: 0,
            }),
            leaf_8000_0008: Some(RawCpuidLeaf {
                eax: 0x0000_2824,
                ebx: 0,
                ecx: 0,
                edx: 0,
            }),
            ..Default::default()
        };
        let record = decode(leaves);
        assert_eq!(
            record.leaf_8000_0000.unwrap().max_extended_function_input,
            0x8000_0008
        );
        let leaf8 = record.leaf_8000_0008.unwrap();
        assert_eq!(leaf8.physical_address_bits, 0x24);
        assert_eq!(leaf8.linear_address_bits, 0x28);
    }
}
