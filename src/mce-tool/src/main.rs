// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Thin CLI around the `mce`/`cpuid` decoders: reads a file of MCE log lines (or stdin), decodes
//! each one against a supplied `IA32_MCG_CAP` value and Processor Signature, and prints the
//! resulting records. This binary is the External Interfaces collaborator of §6 — log-line
//! ingestion, CPUID sourcing and rendering are all out of scope for the `mce`/`cpuid` crates
//! themselves.

mod parser;

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use cpuid::{CpuidLeaves, RawCpuidLeaf};
use mce::{DecodeInput, DecodedMcaEvent, MCGCapability};

/// Decode Intel Machine-Check Exception log lines.
#[derive(Debug, Parser)]
#[command(name = "mce-tool", version, about)]
struct Args {
    /// Path to a file of MCE log lines. Reads stdin when omitted.
    #[arg(long = "log")]
    log: Option<String>,

    /// Raw `IA32_MCG_CAP` value, hex or decimal (e.g. `0x1c09`).
    #[arg(long = "mcg-cap")]
    mcg_cap: String,

    /// A `CPUID` leaf as `N=eax,ebx,ecx,edx`, all hex. Repeatable; only leaves `1`,
    /// `2147483648` (`0x80000000`), `2147483649` (`0x80000001`) and `2147483656` (`0x80000008`)
    /// are consumed.
    #[arg(long = "cpuid-leaf", value_parser = parse_cpuid_leaf)]
    cpuid_leaf: Vec<(u32, RawCpuidLeaf)>,

    /// Stand-in for `MSR_ERROR_CONTROL[1]`, consumed by Sandy Bridge-family iMC dispatch (§9
    /// Design Note). The bit is not otherwise observable from a log line.
    #[arg(long = "msr-error-control-bit1", default_value_t = true)]
    msr_error_control_bit1: bool,

    /// Print each record as a JSON object instead of a human-readable summary.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
enum ToolError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid --mcg-cap value `{0}`")]
    InvalidMcgCap(String),
}

fn parse_hex_or_decimal(value: &str) -> Result<u64, std::num::ParseIntError> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

fn parse_cpuid_leaf(value: &str) -> Result<(u32, RawCpuidLeaf), String> {
    let (leaf, registers) = value
        .split_once('=')
        .ok_or_else(|| format!("expected `N=eax,ebx,ecx,edx`, got `{value}`"))?;
    let leaf: u32 = parse_hex_or_decimal(leaf)
        .map_err(|e| e.to_string())?
        .try_into()
        .map_err(|_| format!("leaf index out of range: `{leaf}`"))?;

    let parts: Vec<&str> = registers.split(',').collect();
    let [eax, ebx, ecx, edx] = parts
        .as_slice()
        .try_into()
        .map_err(|_| format!("expected 4 comma-separated registers, got `{registers}`"))?;

    let reg = |s: &str| -> Result<u32, String> {
        parse_hex_or_decimal(s)
            .map_err(|e| e.to_string())?
            .try_into()
            .map_err(|_| format!("register value out of range: `{s}`"))
    };

    Ok((
        leaf,
        RawCpuidLeaf {
            eax: reg(eax)?,
            ebx: reg(ebx)?,
            ecx: reg(ecx)?,
            edx: reg(edx)?,
        },
    ))
}

fn build_leaves(raw: &[(u32, RawCpuidLeaf)]) -> CpuidLeaves {
    let mut leaves = CpuidLeaves::default();
    for (index, leaf) in raw {
        match *index {
            0x0000_0001 => leaves.leaf_1 = Some(*leaf),
            0x8000_0000 => leaves.leaf_8000_0000 = Some(*leaf),
            0x8000_0001 => leaves.leaf_8000_0001 = Some(*leaf),
            0x8000_0008 => leaves.leaf_8000_0008 = Some(*leaf),
            other => log::warn!("ignoring unsupported CPUID leaf {other:#x}"),
        }
    }
    leaves
}

fn print_human(event: &DecodedMcaEvent) {
    println!("--- event {} (cpu {} bank {}) ---", event.id, event.cpu, event.bank);
    let Some(validity) = &event.validity else {
        println!("  status not valid; warnings: {:?}", event.warnings);
        return;
    };
    println!(
        "  VAL={} OVER={} UC={} EN={} MISCV={} ADDRV={} PCC={}",
        validity.val,
        validity.over,
        validity.uc,
        validity.en,
        validity.miscv,
        validity.addrv,
        validity.pcc
    );
    if let Some(mca) = &event.mca_error {
        println!("  {}: {} ({})", mca.r#type, mca.interpretation, mca.meaning);
        if let Some(f) = mca.correction_report_filtering {
            println!("  Correction Report Filtering: {f}");
        }
    }
    if let Some(ucr) = event.ucr_classification {
        println!("  UCR classification: {}", ucr.name());
    }
    if let Some(gib) = &event.address_gib {
        println!("  Address_GiB: {gib}");
    }
    if event.incremental_decoded {
        println!("  (incremental decoding applied)");
    }
    for (key, value) in &event.model_specific_errors {
        println!("  {key}: {value}");
    }
    for (key, value) in &event.reserved_error_status_other_information {
        println!("  {key}: {value}");
    }
    if !event.warnings.is_empty() {
        println!("  warnings: {:?}", event.warnings);
    }
}

fn run(args: Args) -> Result<(), ToolError> {
    let mcg_cap_raw = parse_hex_or_decimal(&args.mcg_cap)
        .map_err(|_| ToolError::InvalidMcgCap(args.mcg_cap.clone()))?;
    let capability = MCGCapability::decode(mcg_cap_raw);

    let leaves = build_leaves(&args.cpuid_leaf);
    let cpuid_record = cpuid::decode(leaves);
    let processor_signature = cpuid_record.processor_signature;
    log::debug!("processor signature: {processor_signature:?}");

    let contents = match &args.log {
        Some(path) => fs::read_to_string(path).map_err(|source| ToolError::Io {
            path: path.clone(),
            source,
        })?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|source| ToolError::Io {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            buffer
        }
    };

    let mut id = 0u64;
    for line in contents.lines() {
        let event = match parser::parse_line(line) {
            Ok(event) => event,
            Err(parser::ParseError::NotAnMceLine) => continue,
            Err(e) => {
                log::warn!("skipping unparseable MCE line: {e}");
                continue;
            }
        };

        id += 1;
        let decoded = mce::decode(DecodeInput {
            id,
            timestamp: event.timestamp,
            cpu: event.cpu,
            bank: event.bank,
            capability,
            processor_signature: processor_signature.clone(),
            status: event.status,
            addr: event.addr,
            misc: event.misc,
            msr_error_control_bit1: args.msr_error_control_bit1,
        });

        if args.json {
            match serde_json::to_string(&decoded) {
                Ok(json) => println!("{json}"),
                Err(e) => log::warn!("failed to serialize event {id}: {e}"),
            }
        } else {
            print_human(&decoded);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mce-tool: {e}");
            ExitCode::FAILURE
        }
    }
}
