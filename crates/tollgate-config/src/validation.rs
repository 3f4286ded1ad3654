// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: known log levels, positive timeouts, parseable CIDR ranges and
//! IP literals.

use std::net::IpAddr;

use ipnet::IpNet;

use crate::diagnostic::ConfigError;
use crate::model::TollgateConfig;

/// Log levels accepted in `[log] level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TollgateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.egress.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "egress.timeout_secs must be greater than 0".to_string(),
        });
    }

    for range in &config.egress.extra_blocked_ranges {
        if range.trim().parse::<IpNet>().is_err() {
            errors.push(ConfigError::Validation {
                message: format!(
                    "egress.extra_blocked_ranges entry `{range}` is not a valid CIDR range"
                ),
            });
        }
    }

    for ip in &config.egress.allowed_private_ips {
        if ip.trim().parse::<IpAddr>().is_err() {
            errors.push(ConfigError::Validation {
                message: format!(
                    "egress.allowed_private_ips entry `{ip}` is not a valid IP address"
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
