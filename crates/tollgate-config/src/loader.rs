// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./tollgate.toml` > `~/.config/tollgate/tollgate.toml` >
//! `/etc/tollgate/tollgate.toml`, with `TOLLGATE_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TollgateConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tollgate/tollgate.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "tollgate.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TOLLGATE_";

const SECTIONS: &[&str] = &["log", "egress", "integration"];

/// `~/.config/tollgate/tollgate.toml`, when a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tollgate/tollgate.toml"))
}

/// Every file location consulted, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    paths.extend(user_config_path());
    paths.push(PathBuf::from(LOCAL_CONFIG_PATH));
    paths
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tollgate/tollgate.toml`
/// 3. `~/.config/tollgate/tollgate.toml`
/// 4. `./tollgate.toml`
/// 5. `TOLLGATE_*` environment variables
///
/// Missing files are skipped.
pub fn load_config() -> Result<TollgateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<TollgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TollgateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TollgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TollgateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered figment, before extraction.
pub fn build_figment() -> Figment {
    config_paths().into_iter().fold(
        Figment::new().merge(Serialized::defaults(TollgateConfig::default())),
        |figment, path| figment.merge(Toml::file(path)),
    )
    .merge(env_provider())
}

/// `TOLLGATE_<SECTION>_<KEY>` maps to `<section>.<key>`.
///
/// Only the section prefix is split, so `TOLLGATE_EGRESS_BLOCK_PRIVATE_NETWORKS`
/// becomes `egress.block_private_networks`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
