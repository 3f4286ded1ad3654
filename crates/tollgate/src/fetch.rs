// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate fetch` command implementation.

use reqwest::header::USER_AGENT;
use tollgate_core::{EgressError, TollgateError};
use tollgate_egress::{ClientConfig, Request, build_client};
use tracing::debug;

/// Summary of a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub status: u16,
    pub reason: Option<&'static str>,
    pub bytes: usize,
}

impl FetchReport {
    pub fn render(&self) -> String {
        match self.reason {
            Some(reason) => format!("{} {reason} ({} bytes)", self.status, self.bytes),
            None => format!("{} ({} bytes)", self.status, self.bytes),
        }
    }
}

/// GET `url` through the client factory.
///
/// `allow_private` overrides the configured blocking flag for this call only.
pub async fn fetch(
    url: &str,
    mut config: ClientConfig,
    allow_private: bool,
) -> Result<FetchReport, TollgateError> {
    if allow_private {
        config.block_private_networks = false;
    }
    let client = build_client(&config)?;
    debug!(url, guarded = client.is_guarded(), "fetching");

    let request = Request::get(url)?.header(USER_AGENT, tollgate_integration::USER_AGENT);
    let response = client.execute(request).await?;
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| TollgateError::from(EgressError::from_transport(e)))?;

    Ok(FetchReport {
        status: status.as_u16(),
        reason: status.canonical_reason(),
        bytes: body.len(),
    })
}

/// Run `tollgate fetch`.
pub async fn run_fetch(
    url: &str,
    config: ClientConfig,
    allow_private: bool,
) -> Result<(), TollgateError> {
    let report = fetch(url, config, allow_private).await?;
    println!("{}", report.render());
    Ok(())
}
