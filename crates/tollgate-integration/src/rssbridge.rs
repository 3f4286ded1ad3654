// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RSS-Bridge feed discovery.
//!
//! RSS-Bridge instances are commonly self-hosted on the LAN, which is the
//! main reason `integration.allow_private_networks` exists.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use tollgate_core::TollgateError;
use tollgate_egress::{AddressPolicy, ClientConfig, Request, build_client};
use tracing::debug;
use url::Url;

use crate::{USER_AGENT as TOLLGATE_USER_AGENT, body_error};

const INTEGRATION: &str = "rssbridge";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A feed an RSS-Bridge instance can produce for a website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    pub url: String,
    #[serde(rename = "bridgeMeta")]
    pub bridge_meta: BridgeMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeMeta {
    #[serde(default)]
    pub name: String,
}

/// Ask the bridge at `bridge_url` which feeds it can build for `website_url`.
///
/// A 404 means the instance has no matching bridge and yields an empty list.
/// `policy` carries the deployment's extra blocked ranges and exemptions.
pub async fn detect_bridges(
    bridge_url: &str,
    token: &str,
    website_url: &str,
    block_private_networks: bool,
    policy: &AddressPolicy,
) -> Result<Vec<Bridge>, TollgateError> {
    let endpoint = findfeed_url(bridge_url, token, website_url)?;
    debug!(url = %endpoint, "detecting RSS bridges");

    let config =
        ClientConfig::new(DEFAULT_TIMEOUT, block_private_networks).with_policy(policy.clone());
    let client = build_client(&config)?;
    let request =
        Request::from_url(reqwest::Method::GET, endpoint).header(USER_AGENT, TOLLGATE_USER_AGENT);
    let response = client.execute(request).await?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(Vec::new());
    }
    if status.as_u16() >= 400 {
        return Err(TollgateError::integration(
            INTEGRATION,
            format!("unexpected status code {}", status.as_u16()),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| body_error(INTEGRATION, "read bridge response", e))?;
    let mut bridges: Vec<Bridge> = serde_json::from_slice(&body)
        .map_err(|e| body_error(INTEGRATION, "decode bridge response", e))?;

    for bridge in &mut bridges {
        debug!(name = %bridge.bridge_meta.name, url = %bridge.url, "found RSS bridge");
        bridge.url = resolve_bridge_url(bridge_url, token, &bridge.url);
    }
    Ok(bridges)
}

fn findfeed_url(bridge_url: &str, token: &str, website_url: &str) -> Result<Url, TollgateError> {
    let mut endpoint = Url::parse(bridge_url).map_err(|e| {
        TollgateError::integration(INTEGRATION, format!("unable to parse bridge URL: {e}"))
    })?;
    {
        let mut query = endpoint.query_pairs_mut();
        if !token.is_empty() {
            query.append_pair("token", token);
        }
        query
            .append_pair("action", "findfeed")
            .append_pair("format", "atom")
            .append_pair("url", website_url);
    }
    Ok(endpoint)
}

/// Make `./`-relative feed URLs absolute and carry the access token.
fn resolve_bridge_url(bridge_url: &str, token: &str, feed_url: &str) -> String {
    let mut url = match feed_url.strip_prefix("./") {
        Some(relative) => format!("{bridge_url}{relative}"),
        None => feed_url.to_string(),
    };
    if !token.is_empty() {
        url.push_str("&token=");
        url.push_str(token);
    }
    url
}
