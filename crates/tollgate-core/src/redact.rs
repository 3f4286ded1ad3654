// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Address redaction for error text shown to untrusted callers.
//!
//! Candidate tokens are found with a permissive pattern and then confirmed by
//! parsing, so hostnames and ordinary words survive untouched.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Runs of characters that could form an IP literal, optionally bracketed
/// and followed by a port.
static ADDRESS_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[\]0-9A-Fa-f:.%]+").unwrap());

/// The redaction placeholder.
const REDACTED: &str = "[REDACTED]";

/// Replace every IPv4/IPv6 literal (with or without a port) by `[REDACTED]`.
pub fn redact_addresses(input: &str) -> String {
    ADDRESS_CANDIDATE
        .replace_all(input, |caps: &Captures<'_>| {
            let token = &caps[0];
            let trimmed = token.trim_end_matches(['.', ':']);
            if is_address(trimmed) {
                format!("{REDACTED}{}", &token[trimmed.len()..])
            } else {
                token.to_string()
            }
        })
        .into_owned()
}

fn is_address(token: &str) -> bool {
    // "add::" and friends parse as IPv6 but are far more likely to be prose.
    if !token.bytes().any(|b| b.is_ascii_digit()) {
        return false;
    }
    if token.parse::<IpAddr>().is_ok() || token.parse::<SocketAddr>().is_ok() {
        return true;
    }
    let unbracketed = token.trim_start_matches('[').trim_end_matches(']');
    let without_zone = unbracketed.split('%').next().unwrap_or(unbracketed);
    without_zone.parse::<Ipv6Addr>().is_ok()
}
