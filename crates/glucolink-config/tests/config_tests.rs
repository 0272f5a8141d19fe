// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the glucolink configuration system.

use glucolink_config::diagnostic::ConfigError;
use glucolink_config::model::GlucolinkConfig;
use glucolink_config::{load_and_validate_str, load_config_from_str};

#[test]
fn valid_toml_deserializes() {
    let toml = r#"
[agent]
log_level = "debug"

[freshness]
placeholder_value = 39.0
cutoff_secs = 600
default_source = "llu"

[llu]
base_url_template = "http://127.0.0.1:9000/{region}"
default_region = "us"
default_poll_interval_secs = 30
max_redirects = 3
token_refresh_threshold_days = 2
request_timeout_secs = 10

[storage]
settings_dir = "/tmp/glucolink"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.freshness.placeholder_value, 39.0);
    assert_eq!(config.freshness.cutoff_secs, 600);
    assert_eq!(config.freshness.default_source.as_deref(), Some("llu"));
    assert_eq!(config.llu.base_url("de"), "http://127.0.0.1:9000/de");
    assert_eq!(config.llu.default_region, "us");
    assert_eq!(config.llu.default_poll_interval_secs, 30);
    assert_eq!(config.llu.max_redirects, 3);
    assert_eq!(config.llu.token_refresh_threshold_days, 2);
    assert_eq!(config.llu.request_timeout_secs, 10);
    assert_eq!(config.storage.settings_dir, "/tmp/glucolink");
    // Unset keys keep their defaults.
    assert_eq!(config.llu.product, "llu.ios");
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    let defaults = GlucolinkConfig::default();
    assert_eq!(config.freshness.cutoff_secs, defaults.freshness.cutoff_secs);
    assert_eq!(config.llu.base_url_template, defaults.llu.base_url_template);
}

#[test]
fn unknown_field_is_rejected_with_suggestion() {
    let toml = r#"
[freshness]
cutof_secs = 10
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("cutoff_secs"));
}

#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[nightscout]\nurl = \"x\"\n").expect_err("unknown section");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "nightscout"))
    );
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[freshness]\ncutoff_secs = \"soon\"\n")
        .expect_err("string for integer");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_parsing() {
    let errors = load_and_validate_str("[freshness]\ncutoff_secs = 0\n").expect_err("zero cutoff");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("cutoff_secs")))
    );
}
