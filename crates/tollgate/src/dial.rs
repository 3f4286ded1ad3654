// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate dial` command implementation.
//!
//! Runs the safe dial strategy against `host:port` and reports which
//! candidate was chosen and why the others were skipped.

use std::time::Duration;

use tollgate_core::TollgateError;
use tollgate_egress::{AddressPolicy, DialAttempt, SafeDialer};

/// One line per resolved candidate, marking the chosen one.
pub fn describe_attempt(attempt: &DialAttempt, policy: &AddressPolicy) -> Vec<String> {
    attempt
        .candidates
        .iter()
        .map(|ip| {
            if *ip == attempt.chosen {
                format!("  * {ip} (chosen)")
            } else {
                match policy.check(*ip) {
                    Some(reason) => format!("    {ip} (skipped: {reason})"),
                    None => format!("    {ip}"),
                }
            }
        })
        .collect()
}

/// Run `tollgate dial`.
pub async fn run_dial(
    target: &str,
    timeout: Duration,
    policy: AddressPolicy,
) -> Result<(), TollgateError> {
    let dialer = SafeDialer::new(timeout).with_policy(policy);
    let attempt = dialer.plan(target).await?;

    println!(
        "{} resolved to {} candidate(s):",
        attempt.host,
        attempt.candidates.len()
    );
    for line in describe_attempt(&attempt, dialer.policy()) {
        println!("{line}");
    }

    let stream = dialer.connect(&attempt).await?;
    let peer = stream
        .peer_addr()
        .map_err(|e| TollgateError::Internal(format!("connected socket has no peer: {e}")))?;
    println!("connected to {peer}");
    Ok(())
}
