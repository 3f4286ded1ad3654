// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pushover notifications, one message per entry.

use std::time::Duration;

use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use tollgate_core::TollgateError;
use tollgate_egress::{AddressPolicy, ClientConfig, Request, build_client};
use tracing::debug;

use crate::{Entry, Feed, USER_AGENT as TOLLGATE_USER_AGENT, status_line};

const INTEGRATION: &str = "pushover";

const DEFAULT_URL_PREFIX: &str = "https://api.pushover.net";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const MIN_PRIORITY: i32 = -2;
const MAX_PRIORITY: i32 = 2;

#[derive(Debug, Serialize)]
struct Message<'a> {
    token: &'a str,
    user: &'a str,
    title: &'a str,
    message: &'a str,
    priority: i32,
    url: &'a str,
    url_title: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    device: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

/// Sends entry notifications through the Pushover Messages API.
#[derive(Debug, Clone)]
pub struct PushoverClient {
    user: String,
    token: String,
    priority: i32,
    device: String,
    url_prefix: String,
    block_private_networks: bool,
    policy: AddressPolicy,
}

impl PushoverClient {
    /// `priority` is clamped to `-2..=2`; an empty `url_prefix` means the
    /// public Pushover API.
    pub fn new(
        user: impl Into<String>,
        token: impl Into<String>,
        priority: i32,
        device: impl Into<String>,
        url_prefix: &str,
    ) -> Self {
        let url_prefix = if url_prefix.is_empty() {
            DEFAULT_URL_PREFIX
        } else {
            url_prefix
        };
        Self {
            user: user.into(),
            token: token.into(),
            priority: priority.clamp(MIN_PRIORITY, MAX_PRIORITY),
            device: device.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            block_private_networks: true,
            policy: AddressPolicy::default(),
        }
    }

    /// Set the egress policy flag for this integration's requests.
    pub fn block_private_networks(mut self, block: bool) -> Self {
        self.block_private_networks = block;
        self
    }

    /// Apply the deployment's extra blocked ranges and exemptions.
    pub fn with_policy(mut self, policy: AddressPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Send one message per entry, stopping at the first failure.
    pub async fn send_messages(&self, feed: &Feed, entries: &[Entry]) -> Result<(), TollgateError> {
        if self.token.is_empty() || self.user.is_empty() {
            return Err(TollgateError::integration(
                INTEGRATION,
                "token and user are required",
            ));
        }

        let config = ClientConfig::new(DEFAULT_TIMEOUT, self.block_private_networks)
            .with_policy(self.policy.clone());
        let client = build_client(&config)?;
        let endpoint = format!("{}/1/messages.json", self.url_prefix);

        for entry in entries {
            let message = Message {
                token: &self.token,
                user: &self.user,
                title: &feed.title,
                message: &entry.title,
                priority: self.priority,
                url: &entry.url,
                url_title: "",
                device: &self.device,
            };
            debug!(
                priority = message.priority,
                entry_title = message.message,
                entry_url = message.url,
                "sending Pushover message"
            );

            let request = Request::post(&endpoint)?
                .header(USER_AGENT, TOLLGATE_USER_AGENT)
                .json(&message);
            let response = client.execute(request).await?;

            let status = response.status();
            if status.as_u16() >= 400 {
                let detail = match response.json::<ErrorResponse>().await {
                    Ok(body) if !body.errors.is_empty() => body.errors.join(","),
                    _ => status_line(status),
                };
                return Err(TollgateError::integration(
                    INTEGRATION,
                    format!("API error: status={} {detail}", status.as_u16()),
                ));
            }
        }
        Ok(())
    }
}
