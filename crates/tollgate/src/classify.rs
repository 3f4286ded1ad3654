// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate classify` command implementation.

use std::net::IpAddr;

use tollgate_core::{EgressError, TollgateError};
use tollgate_egress::{AddressPolicy, NonPublicReason, parse_literal};

/// Outcome for one command-line argument.
#[derive(Debug)]
pub struct Verdict {
    pub input: String,
    pub outcome: Result<(IpAddr, Option<NonPublicReason>), EgressError>,
}

impl Verdict {
    /// `<input>  public`, `<input>  non-public (<reason>)` or the parse error.
    pub fn render(&self, use_color: bool) -> String {
        use colored::Colorize;

        let label = match &self.outcome {
            Ok((_, None)) if use_color => "public".green().to_string(),
            Ok((_, None)) => "public".to_string(),
            Ok((_, Some(reason))) if use_color => {
                format!("non-public ({reason})").yellow().to_string()
            }
            Ok((_, Some(reason))) => format!("non-public ({reason})"),
            Err(e) if use_color => e.to_string().red().to_string(),
            Err(e) => e.to_string(),
        };
        format!("{:<40} {label}", self.input)
    }
}

/// Classify every input under `policy`.
pub fn classify_all(inputs: &[String], policy: &AddressPolicy) -> Vec<Verdict> {
    inputs
        .iter()
        .map(|input| Verdict {
            input: input.clone(),
            outcome: parse_literal(input).map(|ip| (ip, policy.check(ip))),
        })
        .collect()
}

/// Run `tollgate classify`. Fails when any input is not an IP literal.
pub fn run_classify(
    inputs: &[String],
    policy: &AddressPolicy,
    use_color: bool,
) -> Result<(), TollgateError> {
    let verdicts = classify_all(inputs, policy);
    for verdict in &verdicts {
        println!("{}", verdict.render(use_color));
    }
    match verdicts.into_iter().find_map(|v| v.outcome.err()) {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
