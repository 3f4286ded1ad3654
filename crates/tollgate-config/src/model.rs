// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Tollgate.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tollgate_egress::{AddressPolicy, ClientConfig, EgressError};

/// Top-level Tollgate configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TollgateConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Outbound connection policy.
    #[serde(default)]
    pub egress: EgressConfig,

    /// Settings shared by the integration consumers.
    #[serde(default)]
    pub integration: IntegrationConfig,
}

impl TollgateConfig {
    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Outbound connection policy.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EgressConfig {
    /// Overall request timeout in seconds. Also bounds resolution and connect.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Refuse connections to non-public addresses.
    #[serde(default = "default_true")]
    pub block_private_networks: bool,

    /// Additional CIDR blocks treated as internal, e.g. a corporate range.
    #[serde(default)]
    pub extra_blocked_ranges: Vec<String>,

    /// Exact private addresses exempted from blocking.
    #[serde(default)]
    pub allowed_private_ips: Vec<String>,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            block_private_networks: true,
            extra_blocked_ranges: Vec::new(),
            allowed_private_ips: Vec::new(),
        }
    }
}

impl EgressConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the address policy from the configured ranges and exemptions.
    pub fn policy(&self) -> Result<AddressPolicy, EgressError> {
        AddressPolicy::from_strings(&self.extra_blocked_ranges, &self.allowed_private_ips)
    }

    /// The explicit client configuration handed to the client factory.
    pub fn client_config(&self) -> Result<ClientConfig, EgressError> {
        Ok(ClientConfig::new(self.timeout(), self.block_private_networks)
            .with_policy(self.policy()?))
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Integration consumer settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntegrationConfig {
    /// Let integrations reach private network addresses, e.g. a self-hosted
    /// RSS-Bridge on the LAN.
    #[serde(default)]
    pub allow_private_networks: bool,
}

impl IntegrationConfig {
    /// The blocking flag integrations pass to the client factory.
    pub fn block_private_networks(&self) -> bool {
        !self.allow_private_networks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_block_private_networks() {
        let config = TollgateConfig::default();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.egress.timeout_secs, 30);
        assert!(config.egress.block_private_networks);
        assert!(!config.integration.allow_private_networks);
        assert!(config.integration.block_private_networks());
    }

    #[test]
    fn allow_private_networks_inverts_block_flag() {
        let integration = IntegrationConfig {
            allow_private_networks: true,
        };
        assert!(!integration.block_private_networks());
    }

    #[test]
    fn client_config_carries_timeout_flag_and_policy() {
        let egress = EgressConfig {
            timeout_secs: 5,
            block_private_networks: true,
            extra_blocked_ranges: vec!["203.0.113.0/24".into()],
            allowed_private_ips: vec!["10.0.0.7".into()],
        };
        let client = egress.client_config().unwrap();
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert!(client.block_private_networks);
        assert!(!client.policy.is_default());
        assert!(client.policy.is_public("10.0.0.7".parse().unwrap()));
        assert!(!client.policy.is_public("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn to_toml_round_trips_through_parser() {
        let mut config = TollgateConfig::default();
        config.egress.allowed_private_ips = vec!["10.0.0.7".into()];
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[egress]"));
        let parsed: TollgateConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn client_config_rejects_bad_range() {
        let egress = EgressConfig {
            extra_blocked_ranges: vec!["not-a-cidr".into()],
            ..EgressConfig::default()
        };
        assert!(egress.client_config().is_err());
    }
}
