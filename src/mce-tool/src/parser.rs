// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The log-line parser collaborator (§6): extracts `timestamp`, `cpu`, `bank`, `status`, `addr`
//! and `misc` out of a kernel-log MCE line such as:
//!
//! ```text
//! 2017-07-07T18:25:27.441Z cpu2:36681)MCE: 190: cpu1: bank3: status=0x9020000f0120100e: \
//!     ..., Addr:0x0 (invalid), Misc:0x0 (invalid)
//! ```
//!
//! Only lines containing all of `MCE:`, `cpu`, `bank` and `status=` are candidates; everything
//! else is skipped rather than treated as an error, since a real log interleaves MCE lines with
//! unrelated kernel output.

use thiserror::Error;

/// The six tokens the decoder's core consumes, still as raw text/numbers (§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// First whitespace-separated token on the line.
    pub timestamp: String,
    /// Integer following the `cpu` prefix that appears after `MCE:`.
    pub cpu: u32,
    /// Integer following the `bank` prefix.
    pub bank: u32,
    /// Hex value following `status=`.
    pub status: u64,
    /// Hex value following `Addr:`.
    pub addr: u64,
    /// Hex value following `Misc:`.
    pub misc: u64,
}

/// Why a line was not a valid MCE event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The line didn't contain the required `MCE:`/`cpu`/`bank`/`status=` markers at all — the
    /// caller should silently skip it, not treat it as malformed.
    #[error("not an MCE line")]
    NotAnMceLine,
    /// An `MCE:` line was found but one of the six required tokens could not be extracted.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    /// A numeric token (`cpu`, `bank`, `status`, `Addr`, `Misc`) failed to parse.
    #[error("invalid numeric value for `{0}`: {1}")]
    InvalidNumber(&'static str, String),
}

/// `true` iff the line matches the candidate pattern `MCE:*cpu*bank*status*[Addr|Misc]:*` (§6).
#[must_use]
pub fn is_candidate(line: &str) -> bool {
    line.contains("MCE:")
        && line.contains("cpu")
        && line.contains("bank")
        && line.contains("status")
        && (line.contains("Addr:") || line.contains("Misc:"))
}

fn token_after<'a>(line: &'a str, needle: &str) -> Option<&'a str> {
    let start = line.find(needle)? + needle.len();
    Some(&line[start..])
}

fn integer_after(line: &str, prefix: &str, field: &'static str) -> Result<u32, ParseError> {
    let rest = token_after(line, prefix).ok_or(ParseError::MissingField(field))?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ParseError::MissingField(field));
    }
    digits
        .parse()
        .map_err(|_| ParseError::InvalidNumber(field, digits))
}

fn hex_after(line: &str, prefix: &str, field: &'static str) -> Result<u64, ParseError> {
    let rest = token_after(line, prefix).ok_or(ParseError::MissingField(field))?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix("0x").unwrap_or(rest);
    let digits: String = rest
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect();
    if digits.is_empty() {
        return Err(ParseError::MissingField(field));
    }
    u64::from_str_radix(&digits, 16).map_err(|_| ParseError::InvalidNumber(field, digits))
}

/// Parses one log line into a [`LogEvent`], per §6's collaborator contract.
///
/// Returns [`ParseError::NotAnMceLine`] for lines that are plainly not MCE output (the caller
/// should skip these quietly); any other [`ParseError`] means the line looked like an MCE line
/// but a required field could not be extracted.
pub fn parse_line(line: &str) -> Result<LogEvent, ParseError> {
    if !is_candidate(line) {
        return Err(ParseError::NotAnMceLine);
    }

    let timestamp = line
        .split_whitespace()
        .next()
        .ok_or(ParseError::MissingField("timestamp"))?
        .to_string();

    // The `cpu`/`bank`/`status=` tokens that matter are the ones following `MCE:`; a line may
    // carry an unrelated `cpuN:` kernel-ring-buffer prefix before that marker.
    let after_marker = token_after(line, "MCE:").ok_or(ParseError::MissingField("MCE:"))?;

    let cpu = integer_after(after_marker, "cpu", "cpu")?;
    let bank = integer_after(after_marker, "bank", "bank")?;
    let status = hex_after(after_marker, "status=", "status")?;
    let addr = hex_after(line, "Addr:", "addr").unwrap_or(0);
    let misc = hex_after(line, "Misc:", "misc").unwrap_or(0);

    Ok(LogEvent {
        timestamp,
        cpu,
        bank,
        status,
        addr,
        misc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scenario_3_line() {
        let line = "2017-07-07T18:25:27.441Z cpu2:36681)MCE: 190: cpu1: bank3: \
            status=0x9020000f0120100e: ..., Addr:0x0 (invalid), Misc:0x0 (invalid)";
        let event = parse_line(line).unwrap();
        assert_eq!(event.timestamp, "2017-07-07T18:25:27.441Z");
        assert_eq!(event.cpu, 1);
        assert_eq!(event.bank, 3);
        assert_eq!(event.status, 0x9020_000f_0120_100e);
        assert_eq!(event.addr, 0);
        assert_eq!(event.misc, 0);
    }

    #[test]
    fn unrelated_line_is_not_a_candidate() {
        assert!(!is_candidate("2017-07-07T18:25:27.441Z kernel: usb 1-1: new device"));
        assert_eq!(
            parse_line("2017-07-07T18:25:27.441Z kernel: usb 1-1: new device"),
            Err(ParseError::NotAnMceLine)
        );
    }

    #[test]
    fn hex_addr_with_real_value() {
        let line = "t0 MCE: cpu0: bank1: status=0x1 Addr:0x123456789 Misc:0xabc";
        let event = parse_line(line).unwrap();
        assert_eq!(event.addr, 0x1_2345_6789);
        assert_eq!(event.misc, 0xabc);
    }
}
