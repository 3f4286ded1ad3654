// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Tollgate.
//!
//! TOML parsing with strict validation (`deny_unknown_fields`), XDG file
//! hierarchy lookup, `TOLLGATE_*` environment overrides and miette
//! diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use tollgate_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! let client_config = config.egress.client_config().expect("validated");
//! assert_eq!(client_config.block_private_networks, config.egress.block_private_networks);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{EgressConfig, IntegrationConfig, LogConfig, TollgateConfig};

use std::path::Path;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Figment errors are converted into diagnostics with source spans; a config
/// that parses is then validated, collecting every problem at once.
pub fn load_and_validate() -> Result<TollgateConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from one explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<TollgateConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<TollgateConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<TollgateConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<TollgateConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Contents of every config file that exists, for span lookup.
fn collect_toml_sources() -> Vec<(String, String)> {
    loader::config_paths()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let name = if path.is_relative() {
                std::env::current_dir()
                    .map(|d| d.join(&path))
                    .unwrap_or_else(|_| path.clone())
            } else {
                path
            };
            Some((name.display().to_string(), content))
        })
        .collect()
}
