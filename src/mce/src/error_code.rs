// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The MCA error code grammar, `IA32_MCi_STATUS[15:0]` (§4.4.5).
//!
//! Simple codes are an exact 16-bit match; compound codes are bitmask patterns whose sub-fields
//! (`TT`, `LL`, `MMM`, `RRRR`, `PP`, `T`, `II`) decode via the fixed enumerations in the
//! Glossary. Bit 12 (the Correction Report Filtering flag, `F`) is excluded from every compound
//! pattern match — its own interpretation is conditional on validity flags the caller supplies
//! (§4.4.5, §9: "the pattern-matching for SRAO/SRAR overrides MUST run before F-bit
//! interpretation").

use bitslice::BitSlice;

/// Transaction Type (`TT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TransactionType {
    /// `I`: Instruction.
    Instruction,
    /// `D`: Data.
    Data,
    /// `G`: Generic.
    Generic,
}

/// Memory Hierarchy Level (`LL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MemoryHierarchyLevel {
    /// `L0`.
    L0,
    /// `L1`.
    L1,
    /// `L2`.
    L2,
    /// `LG`: Generic.
    Generic,
}

/// Memory Transaction (`MMM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MemoryTransaction {
    /// `GEN`: Generic.
    Generic,
    /// `RD`: Read.
    Read,
    /// `WR`: Write.
    Write,
    /// `AC`: Address/Command.
    AddressCommand,
    /// `MS`: Scrubbing.
    Scrubbing,
    /// Reserved encoding.
    Reserved,
}

/// Request (`RRRR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Request {
    /// `ERR`.
    Err,
    /// `RD`: Read.
    Read,
    /// `WR`: Write.
    Write,
    /// `DRD`: Data Read.
    DataRead,
    /// `DWR`: Data Write.
    DataWrite,
    /// `IRD`: Instruction Read.
    InstructionRead,
    /// `PREFETCH`.
    Prefetch,
    /// `EVICT`.
    Evict,
    /// `SNOOP`.
    Snoop,
    /// Reserved encoding.
    Reserved,
}

/// Participation Processor (`PP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ParticipationProcessor {
    /// `SRC`: local processor originated request.
    LocalOriginated,
    /// `RES`: local processor responded to request.
    LocalResponded,
    /// `OBS`: local processor observed request as third party.
    Observed,
    /// `GEN`: generic.
    Generic,
}

/// Timeout (`T`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Timeout {
    /// `NOTIMEOUT`.
    NoTimeout,
    /// `TIMEOUT`.
    Timeout,
}

/// Memory/IO (`II`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MemoryOrIo {
    /// `M`: Memory.
    Memory,
    /// Reserved encoding.
    Reserved,
    /// `IO`.
    Io,
    /// `OTR`: Other.
    Other,
}

impl TransactionType {
    /// Stable short name (`I`/`D`/`G`), used when rendering a compound error's meaning.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Instruction => "Instruction",
            Self::Data => "Data",
            Self::Generic => "Generic",
        }
    }
}

impl MemoryHierarchyLevel {
    /// Stable short name, used when rendering a compound error's meaning.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::L0 => "Level 0",
            Self::L1 => "Level 1",
            Self::L2 => "Level 2",
            Self::Generic => "Generic",
        }
    }
}

impl MemoryTransaction {
    /// Stable short name, used when rendering a compound error's meaning.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "Generic",
            Self::Read => "Read",
            Self::Write => "Write",
            Self::AddressCommand => "Address/Command",
            Self::Scrubbing => "Memory Scrubbing",
            Self::Reserved => "Reserved",
        }
    }
}

impl Request {
    /// Stable short name, used when rendering a compound error's meaning.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Err => "Generic Error",
            Self::Read => "Read",
            Self::Write => "Write",
            Self::DataRead => "Data Read",
            Self::DataWrite => "Data Write",
            Self::InstructionRead => "Instruction Read",
            Self::Prefetch => "Prefetch",
            Self::Evict => "Eviction",
            Self::Snoop => "Snoop",
            Self::Reserved => "Reserved",
        }
    }
}

impl ParticipationProcessor {
    /// Stable short name, used when rendering a compound error's meaning.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LocalOriginated => "Local processor originated request",
            Self::LocalResponded => "Local processor responded to request",
            Self::Observed => "Local processor observed error as third party",
            Self::Generic => "Generic",
        }
    }
}

impl Timeout {
    /// Stable short name, used when rendering a compound error's meaning.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::NoTimeout => "No Timeout",
            Self::Timeout => "Timeout",
        }
    }
}

impl MemoryOrIo {
    /// Stable short name, used when rendering a compound error's meaning.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Memory => "Memory Access",
            Self::Reserved => "Reserved",
            Self::Io => "I/O",
            Self::Other => "Other Transaction",
        }
    }
}

fn transaction_type(bits: u16) -> Option<TransactionType> {
    match bits {
        0b00 => Some(TransactionType::Instruction),
        0b01 => Some(TransactionType::Data),
        0b10 => Some(TransactionType::Generic),
        _ => None,
    }
}

fn memory_hierarchy_level(bits: u16) -> MemoryHierarchyLevel {
    match bits {
        0b00 => MemoryHierarchyLevel::L0,
        0b01 => MemoryHierarchyLevel::L1,
        0b10 => MemoryHierarchyLevel::L2,
        _ => MemoryHierarchyLevel::Generic,
    }
}

fn memory_transaction(bits: u16) -> MemoryTransaction {
    match bits {
        0b000 => MemoryTransaction::Generic,
        0b001 => MemoryTransaction::Read,
        0b010 => MemoryTransaction::Write,
        0b011 => MemoryTransaction::AddressCommand,
        0b100 => MemoryTransaction::Scrubbing,
        _ => MemoryTransaction::Reserved,
    }
}

fn request(bits: u16) -> Request {
    match bits {
        0b0000 => Request::Err,
        0b0001 => Request::Read,
        0b0010 => Request::Write,
        0b0011 => Request::DataRead,
        0b0100 => Request::DataWrite,
        0b0101 => Request::InstructionRead,
        0b0110 => Request::Prefetch,
        0b0111 => Request::Evict,
        0b1000 => Request::Snoop,
        _ => Request::Reserved,
    }
}

fn participation_processor(bits: u16) -> ParticipationProcessor {
    match bits {
        0b00 => ParticipationProcessor::LocalOriginated,
        0b01 => ParticipationProcessor::LocalResponded,
        0b10 => ParticipationProcessor::Observed,
        _ => ParticipationProcessor::Generic,
    }
}

fn timeout(bit: u16) -> Timeout {
    if bit == 0 {
        Timeout::NoTimeout
    } else {
        Timeout::Timeout
    }
}

fn memory_or_io(bits: u16) -> MemoryOrIo {
    match bits {
        0b00 => MemoryOrIo::Memory,
        0b10 => MemoryOrIo::Io,
        0b11 => MemoryOrIo::Other,
        _ => MemoryOrIo::Reserved,
    }
}

/// A decoded MCA error code, simple or compound.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum McaErrorCode {
    /// `0000000000000000`.
    NoError,
    /// `0000000000000001`.
    Unclassified,
    /// `0000000000000010`.
    MicrocodeRomParityError,
    /// `0000000000000011`.
    ExternalError,
    /// `0000000000000100`.
    FrcError,
    /// `0000000000000101`.
    InternalParityError,
    /// `0000000000000110`.
    SmmHandlerCodeAccessViolation,
    /// `0000010000000000`.
    InternalTimerError,
    /// `0000111000001011`.
    IoError,
    /// `000001xxxxxxxxxx` with at least one `1` in `[9:0]`.
    InternalUnclassified,
    /// `000F 0000 0000 11LL`.
    GenericCacheHierarchy {
        /// `LL`.
        ll: MemoryHierarchyLevel,
    },
    /// `000F 0000 0001 TTLL`.
    TlbErrors {
        /// `TT`.
        tt: TransactionType,
        /// `LL`.
        ll: MemoryHierarchyLevel,
    },
    /// `000F 0000 1MMM CCCC`.
    MemoryControllerErrors {
        /// `MMM`.
        mmm: MemoryTransaction,
        /// The channel number, `CCCC`. `None` when the nibble is `1111` ("channel not
        /// specified").
        channel: Option<u8>,
    },
    /// `000F 0001 RRRR TTLL`.
    CacheHierarchyErrors {
        /// `RRRR`.
        rrrr: Request,
        /// `TT`.
        tt: TransactionType,
        /// `LL`.
        ll: MemoryHierarchyLevel,
    },
    /// `000F 1PPT RRRR IILL`.
    BusAndInterconnectErrors {
        /// `PP`.
        pp: ParticipationProcessor,
        /// `T`.
        t: Timeout,
        /// `RRRR`.
        rrrr: Request,
        /// `II`.
        ii: MemoryOrIo,
        /// `LL`.
        ll: MemoryHierarchyLevel,
    },
}

impl McaErrorCode {
    /// Stable category name, used both for display and as the key family-specific dispatch
    /// tables match against.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoError => "No Error",
            Self::Unclassified => "Unclassified",
            Self::MicrocodeRomParityError => "Microcode ROM Parity Error",
            Self::ExternalError => "External Error",
            Self::FrcError => "FRC Error",
            Self::InternalParityError => "Internal Parity Error",
            Self::SmmHandlerCodeAccessViolation => "SMM Handler Code Access Violation",
            Self::InternalTimerError => "Internal Timer Error",
            Self::IoError => "I/O Error",
            Self::InternalUnclassified => "Internal Unclassified",
            Self::GenericCacheHierarchy { .. } => "Generic Cache Hierarchy",
            Self::TlbErrors { .. } => "TLB Errors",
            Self::MemoryControllerErrors { .. } => "Memory Controller Errors",
            Self::CacheHierarchyErrors { .. } => "Cache Hierarchy Errors",
            Self::BusAndInterconnectErrors { .. } => "Bus and Interconnect Errors",
        }
    }

    /// Renders the full "meaning" string: the code name plus its decoded sub-fields, joined with
    /// `" / "`. Simple codes render as just their name. Family-specific dispatch (§4.4.8) and
    /// the architectural SRAO/SRAR overrides (§4.4.6) may replace this wholesale.
    #[must_use]
    pub fn meaning(&self) -> String {
        match self {
            Self::GenericCacheHierarchy { ll } => {
                format!("{} / {}", self.name(), ll.name())
            }
            Self::TlbErrors { tt, ll } => {
                format!("{} / {} / {}", self.name(), tt.name(), ll.name())
            }
            Self::MemoryControllerErrors { mmm, channel } => {
                let channel = channel.map_or_else(
                    || "channel not specified".to_string(),
                    |c| format!("Channel {c}"),
                );
                format!("{} / {} / {channel}", self.name(), mmm.name())
            }
            Self::CacheHierarchyErrors { rrrr, tt, ll } => {
                format!("{} / {} / {} / {}", self.name(), rrrr.name(), tt.name(), ll.name())
            }
            Self::BusAndInterconnectErrors { pp, t, rrrr, ii, ll } => {
                format!(
                    "{} / {} / {} / {} / {} / {}",
                    self.name(),
                    pp.name(),
                    t.name(),
                    rrrr.name(),
                    ii.name(),
                    ll.name()
                )
            }
            _ => self.name().to_string(),
        }
    }

    /// `true` for any of the five bitmask-pattern (as opposed to exact-match) codes.
    #[must_use]
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Self::GenericCacheHierarchy { .. }
                | Self::TlbErrors { .. }
                | Self::MemoryControllerErrors { .. }
                | Self::CacheHierarchyErrors { .. }
                | Self::BusAndInterconnectErrors { .. }
        )
    }
}

/// Decodes `status[15:0]` per the simple/compound grammar of §4.4.5.
///
/// Returns `None` if no simple or compound pattern matches (§4.4.9 "MCA error code could not be
/// identified").
#[must_use]
pub fn decode(code: u16) -> Option<McaErrorCode> {
    match code {
        0x0000 => return Some(McaErrorCode::NoError),
        0x0001 => return Some(McaErrorCode::Unclassified),
        0x0002 => return Some(McaErrorCode::MicrocodeRomParityError),
        0x0003 => return Some(McaErrorCode::ExternalError),
        0x0004 => return Some(McaErrorCode::FrcError),
        0x0005 => return Some(McaErrorCode::InternalParityError),
        0x0006 => return Some(McaErrorCode::SmmHandlerCodeAccessViolation),
        0x0400 => return Some(McaErrorCode::InternalTimerError),
        0x0E0B => return Some(McaErrorCode::IoError),
        _ => {}
    }

    // `000001xxxxxxxxxx` with at least one 1 in [9:0].
    if code.bits(15, 10).unwrap() == 0b0000_01 && code.bits(9, 0).unwrap() != 0 {
        return Some(McaErrorCode::InternalUnclassified);
    }

    // Every compound pattern shares `[15:13] == 0`; bit 12 (`F`) is a wildcard.
    if code.bits(15, 13).unwrap() != 0 {
        return None;
    }

    // `1PPT RRRR IILL` vs `0001 RRRR TTLL` vs `0000 1MMM CCCC` vs `0000 0001 TTLL` vs
    // `0000 0000 11LL` are distinguished by bits [11:8].
    let high_nibble = code.bits(11, 8).unwrap();

    if high_nibble & 0b1000 != 0 {
        // Bus and Interconnect Errors: `1PPT RRRR IILL`.
        let pp = participation_processor(code.bits(10, 9).unwrap());
        let t = timeout(code.bit(8).unwrap());
        let rrrr = request(code.bits(7, 4).unwrap());
        let ii = memory_or_io(code.bits(3, 2).unwrap());
        let ll = memory_hierarchy_level(code.bits(1, 0).unwrap());
        return Some(McaErrorCode::BusAndInterconnectErrors { pp, t, rrrr, ii, ll });
    }

    if high_nibble == 0b0001 {
        // Cache Hierarchy Errors: `0001 RRRR TTLL`.
        let rrrr = request(code.bits(7, 4).unwrap());
        let tt = transaction_type(code.bits(3, 2).unwrap())?;
        let ll = memory_hierarchy_level(code.bits(1, 0).unwrap());
        return Some(McaErrorCode::CacheHierarchyErrors { rrrr, tt, ll });
    }

    if high_nibble == 0b0000 {
        let low_byte = code.bits(7, 0).unwrap();
        if low_byte & 0b1000_0000 != 0 {
            // Memory Controller Errors: `0000 1MMM CCCC`.
            let mmm = memory_transaction(code.bits(6, 4).unwrap());
            let channel_nibble = code.bits(3, 0).unwrap();
            let channel = if channel_nibble == 0b1111 {
                None
            } else {
                Some(channel_nibble as u8)
            };
            return Some(McaErrorCode::MemoryControllerErrors { mmm, channel });
        }
        if code.bits(7, 4).unwrap() == 0b0001 {
            // TLB Errors: `0000 0001 TTLL`.
            let tt = transaction_type(code.bits(3, 2).unwrap())?;
            let ll = memory_hierarchy_level(code.bits(1, 0).unwrap());
            return Some(McaErrorCode::TlbErrors { tt, ll });
        }
        if code.bits(7, 2).unwrap() == 0b0000_11 {
            // Generic Cache Hierarchy: `0000 0000 11LL`. Bits [7:2] are fixed (`0000 11`); `LL`
            // occupies [1:0].
            let ll = memory_hierarchy_level(code.bits(1, 0).unwrap());
            return Some(McaErrorCode::GenericCacheHierarchy { ll });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_io_error() {
        assert_eq!(decode(0x0E0B), Some(McaErrorCode::IoError));
    }

    #[test]
    fn generic_cache_hierarchy_level_2() {
        // §8 scenario 3's status word's low 16 bits: 0x100e = 0001 0000 0000 1110. Bit 12 (`F`)
        // is a wildcard; excluding it leaves 0000 0000 1110, matching `0000 11LL` with LL=10
        // (L2).
        let code = decode(0x100e).unwrap();
        assert_eq!(
            code,
            McaErrorCode::GenericCacheHierarchy {
                ll: MemoryHierarchyLevel::L2
            }
        );
        assert_eq!(code.name(), "Generic Cache Hierarchy");
    }

    #[test]
    fn memory_controller_channel_not_specified() {
        let code = decode(0b0000_0000_1001_1111).unwrap();
        assert_eq!(
            code,
            McaErrorCode::MemoryControllerErrors {
                mmm: MemoryTransaction::Read,
                channel: None,
            }
        );
    }

    #[test]
    fn memory_controller_scrubbing() {
        let code = decode(0b0000_0000_1100_1111).unwrap();
        assert_eq!(
            code,
            McaErrorCode::MemoryControllerErrors {
                mmm: MemoryTransaction::Scrubbing,
                channel: None,
            }
        );
    }

    #[test]
    fn unrecognized_code_is_none() {
        assert_eq!(decode(0b0010_0000_0000_0000), None);
    }

    #[test]
    fn internal_unclassified_requires_nonzero_low_bits() {
        assert_eq!(decode(0b0000_0100_0000_0000), Some(McaErrorCode::InternalTimerError));
        assert_eq!(decode(0b0000_0100_0000_0001), Some(McaErrorCode::InternalUnclassified));
    }
}
