// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Tollgate configuration system.

use std::io::Write;
use std::time::Duration;

use serial_test::serial;
use tollgate_config::diagnostic::ConfigError;
use tollgate_config::model::TollgateConfig;
use tollgate_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_tollgate_config() {
    let toml = r#"
[log]
level = "debug"

[egress]
timeout_secs = 12
block_private_networks = false
extra_blocked_ranges = ["100.100.0.0/16"]
allowed_private_ips = ["10.0.0.7"]

[integration]
allow_private_networks = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.egress.timeout_secs, 12);
    assert!(!config.egress.block_private_networks);
    assert_eq!(config.egress.extra_blocked_ranges, vec!["100.100.0.0/16"]);
    assert_eq!(config.egress.allowed_private_ips, vec!["10.0.0.7"]);
    assert!(config.integration.allow_private_networks);
    assert!(!config.integration.block_private_networks());
}

#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("[log]\nlevel = \"warn\"\n").unwrap();
    assert_eq!(config.log.level, "warn");
    assert_eq!(config.egress, TollgateConfig::default().egress);
    assert_eq!(config.integration, TollgateConfig::default().integration);
}

#[test]
fn empty_file_is_the_default_config() {
    assert_eq!(load_config_from_str("").unwrap(), TollgateConfig::default());
}

#[test]
fn unknown_field_in_egress_produces_error() {
    let err = load_config_from_str("[egress]\nblock_private_network = true\n")
        .expect_err("should reject unknown field");
    let rendered = err.to_string();
    assert!(
        rendered.contains("unknown field") || rendered.contains("block_private_network"),
        "got: {rendered}"
    );
}

#[test]
fn deny_unknown_fields_at_top_level() {
    assert!(load_config_from_str("[proxy]\nurl = \"http://proxy:3128\"\n").is_err());
}

#[test]
fn diagnostic_suggests_closest_key() {
    let errors = load_and_validate_str("[egress]\ntimeout_sec = 5\n").unwrap_err();
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("an unknown-key diagnostic");
    assert_eq!(unknown.0, "timeout_sec");
    assert_eq!(unknown.1.as_deref(), Some("timeout_secs"));
}

#[test]
fn diagnostic_lists_valid_keys() {
    let errors = load_and_validate_str("[log]\nverbosity = \"high\"\n").unwrap_err();
    let listed = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { valid_keys, .. } if valid_keys.contains("level"))
    });
    assert!(listed, "got: {errors:?}");
}

#[test]
fn diagnostic_invalid_type_names_key() {
    let errors = load_and_validate_str("[egress]\ntimeout_secs = \"soon\"\n").unwrap_err();
    let message = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    assert!(message.contains("timeout_secs"), "got: {message}");
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "levle".to_string(),
        section: "[log]".to_string(),
        suggestion: Some("level".to_string()),
        valid_keys: "level".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `level`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("levle"));
}

#[test]
fn load_and_validate_collects_every_problem() {
    let toml = r#"
[log]
level = "chatty"

[egress]
timeout_secs = 0
extra_blocked_ranges = ["10.0.0.0/33"]
allowed_private_ips = ["localhost"]
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 4, "got: {errors:?}");
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

#[test]
fn load_and_validate_defaults() {
    let config = load_and_validate_str("").unwrap();
    let client = config.egress.client_config().unwrap();
    assert_eq!(client.timeout, Duration::from_secs(30));
    assert!(client.block_private_networks);
    assert!(client.policy.is_default());
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn file_values_are_loaded() {
    let file = write_config("[egress]\ntimeout_secs = 9\n");
    let config = load_and_validate_path(file.path()).unwrap();
    assert_eq!(config.egress.timeout_secs, 9);
}

#[test]
#[serial]
fn env_var_overrides_file_value() {
    let file = write_config("[egress]\ntimeout_secs = 9\n");
    // SAFETY: test-only env mutation, serialized with #[serial].
    unsafe { std::env::set_var("TOLLGATE_EGRESS_TIMEOUT_SECS", "3") };
    let result = load_and_validate_path(file.path());
    unsafe { std::env::remove_var("TOLLGATE_EGRESS_TIMEOUT_SECS") };

    assert_eq!(result.unwrap().egress.timeout_secs, 3);
}

#[test]
#[serial]
fn env_var_maps_underscored_keys() {
    let file = write_config("");
    unsafe { std::env::set_var("TOLLGATE_INTEGRATION_ALLOW_PRIVATE_NETWORKS", "true") };
    unsafe { std::env::set_var("TOLLGATE_EGRESS_BLOCK_PRIVATE_NETWORKS", "false") };
    let result = load_and_validate_path(file.path());
    unsafe { std::env::remove_var("TOLLGATE_INTEGRATION_ALLOW_PRIVATE_NETWORKS") };
    unsafe { std::env::remove_var("TOLLGATE_EGRESS_BLOCK_PRIVATE_NETWORKS") };

    let config = result.unwrap();
    assert!(config.integration.allow_private_networks);
    assert!(!config.egress.block_private_networks);
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_and_validate_path(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, TollgateConfig::default());
}
