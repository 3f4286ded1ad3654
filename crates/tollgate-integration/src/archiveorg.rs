// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wayback Machine "Save Page Now" integration.

use std::time::Duration;

use reqwest::header::USER_AGENT;
use tollgate_core::TollgateError;
use tollgate_egress::{ClientConfig, Request, build_client};
use tracing::debug;

use crate::USER_AGENT as TOLLGATE_USER_AGENT;

const INTEGRATION: &str = "archiveorg";

const DEFAULT_BASE_URL: &str = "https://web.archive.org";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Skip the availability wait and re-archive at most every 15 days.
const SAVE_OPTIONS: &str = "delay_wb_availability=1&if_not_archived_within=15d";

/// Submits entry URLs to the Wayback Machine.
///
/// The endpoint is a fixed, trusted host, so requests go through an
/// unguarded client.
#[derive(Debug, Clone)]
pub struct ArchiveOrgClient {
    base_url: String,
}

impl Default for ArchiveOrgClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveOrgClient {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at another Wayback-compatible host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The save request URL for `entry_url`.
    pub fn save_url(&self, entry_url: &str) -> String {
        let escaped: String = url::form_urlencoded::byte_serialize(entry_url.as_bytes()).collect();
        format!("{}/save/{escaped}?{SAVE_OPTIONS}", self.base_url)
    }

    /// Ask the Wayback Machine to archive `entry_url`.
    pub async fn send_url(&self, entry_url: &str) -> Result<(), TollgateError> {
        let request_url = self.save_url(entry_url);
        let request = Request::get(&request_url)?.header(USER_AGENT, TOLLGATE_USER_AGENT);

        let client = build_client(&ClientConfig::new(DEFAULT_TIMEOUT, false))?;
        let response = client.execute(request).await?;

        let status = response.status();
        debug!(status = %status, "archive.org save request answered");
        if status.as_u16() >= 400 {
            return Err(TollgateError::integration(
                INTEGRATION,
                format!(
                    "unexpected status code: url={request_url} status={}",
                    status.as_u16()
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn save_url_escapes_entry_url() {
        let client = ArchiveOrgClient::new();
        assert_eq!(
            client.save_url("https://example.org/a b?x=1&y=2"),
            "https://web.archive.org/save/https%3A%2F%2Fexample.org%2Fa+b%3Fx%3D1%26y%3D2\
             ?delay_wb_availability=1&if_not_archived_within=15d"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ArchiveOrgClient::new().with_base_url("http://wayback.local/");
        assert!(client.save_url("x").starts_with("http://wayback.local/save/x?"));
    }

    #[tokio::test]
    async fn send_url_succeeds_on_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/save/https%3A%2F%2Fexample.org%2Fpost"))
            .and(query_param("delay_wb_availability", "1"))
            .and(query_param("if_not_archived_within", "15d"))
            .and(header("user-agent", TOLLGATE_USER_AGENT))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        ArchiveOrgClient::new()
            .with_base_url(server.uri())
            .send_url("https://example.org/post")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn send_url_reports_status_and_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = ArchiveOrgClient::new()
            .with_base_url(server.uri())
            .send_url("https://example.org/post")
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("archiveorg: unexpected status code"));
        assert!(message.ends_with(" status=429"), "{message}");
        assert!(message.contains("/save/https%3A%2F%2Fexample.org%2Fpost"));
        assert!(!err.is_blocked());
    }
}
