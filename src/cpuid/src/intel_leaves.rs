// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
#![allow(clippy::similar_names, clippy::module_name_repetitions)]

//! Register bitfields for the four CPUID leaves this decoder understands.

use bit_fields::bitfield;

// -------------------------------------------------------------------------------------------------
// Leaf 01H
// -------------------------------------------------------------------------------------------------
#[rustfmt::skip]
bitfield!(Leaf1Eax, u32, {
    /// Stepping ID.
    stepping_id: 0..4,
    /// Model.
    model_id: 4..8,
    /// Family.
    family_id: 8..12,
    /// Processor Type.
    processor_type: 12..14,
    /// Extended Model ID.
    extended_model_id: 16..20,
    /// Extended Family ID.
    extended_family_id: 20..28,
});

#[rustfmt::skip]
bitfield!(Leaf1Ebx, u32, {
    /// Brand Index.
    brand_index: 0..8,
    /// `CLFLUSH` line size (value * 8 = cache line size in bytes).
    clflush_line_size: 8..16,
    /// Maximum number of addressable IDs for logical processors in this physical package.
    max_addressable_logical_processor_ids: 16..24,
    /// Initial APIC ID.
    initial_apic_id: 24..32,
});

#[rustfmt::skip]
bitfield!(Leaf1Ecx, u32, {
    /// Streaming SIMD Extensions 3.
    sse3: 0,
    /// PCLMULQDQ.
    pclmulqdq: 1,
    /// 64-bit DS Area.
    dtes64: 2,
    /// MONITOR/MWAIT.
    monitor: 3,
    /// CPL Qualified Debug Store.
    ds_cpl: 4,
    /// Virtual Machine Extensions.
    vmx: 5,
    /// Safer Mode Extensions.
    smx: 6,
    /// Enhanced Intel SpeedStep Technology.
    eist: 7,
    /// Thermal Monitor 2.
    tm2: 8,
    /// Supplemental Streaming SIMD Extensions 3.
    ssse3: 9,
    /// L1 Context ID.
    cnxt_id: 10,
    /// Silicon Debug.
    sdbg: 11,
    /// Fused Multiply Add.
    fma: 12,
    /// CMPXCHG16B.
    cmpxchg16b: 13,
    /// xTPR Update Control.
    xtpr_update_control: 14,
    /// Perfmon and Debug Capability.
    pdcm: 15,
    /// Process-context identifiers.
    pcid: 17,
    /// Direct Cache Access.
    dca: 18,
    /// Streaming SIMD Extensions 4.1.
    sse4_1: 19,
    /// Streaming SIMD Extensions 4.2.
    sse4_2: 20,
    /// Extended xAPIC Support.
    x2apic: 21,
    /// MOVBE.
    movbe: 22,
    /// POPCNT.
    popcnt: 23,
    /// Local APIC timer supports one-shot operation using a TSC deadline value.
    tsc_deadline: 24,
    /// AESNI.
    aesni: 25,
    /// XSAVE/XRSTOR, XSETBV/XGETBV, XCR0.
    xsave: 26,
    /// OSXSAVE.
    osxsave: 27,
    /// AVX.
    avx: 28,
    /// 16-bit floating-point conversion instructions.
    f16c: 29,
    /// RDRAND.
    rdrand: 30,
});

#[rustfmt::skip]
bitfield!(Leaf1Edx, u32, {
    /// Floating Point Unit On-Chip.
    fpu: 0,
    /// Virtual 8086 Mode Enhancements.
    vme: 1,
    /// Debugging Extensions.
    de: 2,
    /// Page Size Extension.
    pse: 3,
    /// Time Stamp Counter.
    tsc: 4,
    /// Model Specific Registers.
    msr: 5,
    /// Physical Address Extension.
    pae: 6,
    /// Machine Check Exception.
    mce: 7,
    /// CMPXCHG8B.
    cx8: 8,
    /// APIC On-Chip.
    apic: 9,
    /// SYSENTER/SYSEXIT.
    sep: 11,
    /// Memory Type Range Registers.
    mtrr: 12,
    /// Page Global Bit.
    pge: 13,
    /// Machine Check Architecture.
    mca: 14,
    /// Conditional Move Instructions.
    cmov: 15,
    /// Page Attribute Table.
    pat: 16,
    /// 36-Bit Page Size Extension.
    pse_36: 17,
    /// Processor Serial Number.
    psn: 18,
    /// CLFLUSH.
    clfsh: 19,
    /// Debug Store.
    ds: 21,
    /// Thermal Monitor and Software Controlled Clock Facilities.
    acpi: 22,
    /// Intel MMX Technology.
    mmx: 23,
    /// FXSAVE and FXRSTOR Instructions.
    fxsr: 24,
    /// Streaming SIMD Extensions.
    sse: 25,
    /// Streaming SIMD Extensions 2.
    sse2: 26,
    /// Self Snoop.
    ss: 27,
    /// Max APIC IDs reserved field is valid (Hyper-Threading Technology).
    htt: 28,
    /// Thermal Monitor.
    tm: 29,
    /// Pending Break Enable.
    pbe: 31,
});

// -------------------------------------------------------------------------------------------------
// Leaf 80000000H
// -------------------------------------------------------------------------------------------------
#[rustfmt::skip]
bitfield!(Leaf80000000Eax, u32, {
    /// Maximum Input Value for Extended Function CPUID Information.
    max_extended_function_input: 0..32,
});

// -------------------------------------------------------------------------------------------------
// Leaf 80000001H
// -------------------------------------------------------------------------------------------------
#[rustfmt::skip]
bitfield!(Leaf80000001Ecx, u32, {
    /// `LAHF`/`SAHF` available in 64-bit mode.
    lahf_sahf: 0,
    /// `LZCNT`.
    lzcnt: 5,
    /// `PREFETCHW`.
    prefetchw: 8,
});

#[rustfmt::skip]
bitfield!(Leaf80000001Edx, u32, {
    /// `SYSCALL`/`SYSRET`.
    syscall_sysret: 11,
    /// Execute Disable Bit.
    xd: 20,
    /// 1-GByte pages.
    page_1gb: 26,
    /// `RDTSCP` and `IA32_TSC_AUX`.
    rdtscp: 27,
    /// Intel 64 Architecture available.
    intel64: 29,
});

// -------------------------------------------------------------------------------------------------
// Leaf 80000008H
// -------------------------------------------------------------------------------------------------
#[rustfmt::skip]
bitfield!(Leaf80000008Eax, u32, {
    /// Physical Address Bits.
    physical_address_bits: 0..8,
    /// Linear Address Bits.
    linear_address_bits: 8..16,
});
