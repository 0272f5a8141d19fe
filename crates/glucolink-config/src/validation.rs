// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Covers constraints serde attributes cannot express. All problems are
//! collected rather than failing on the first.

use crate::diagnostic::ConfigError;
use crate::model::GlucolinkConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &GlucolinkConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        fail(format!(
            "agent.log_level `{}` is not one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.freshness.cutoff_secs == 0 {
        fail("freshness.cutoff_secs must be greater than zero".to_string());
    }

    if !config.freshness.placeholder_value.is_finite() {
        fail("freshness.placeholder_value must be a finite number".to_string());
    }

    if let Some(source) = &config.freshness.default_source {
        if source.trim().is_empty() {
            fail("freshness.default_source must not be empty when set".to_string());
        }
    }

    if !config.llu.base_url_template.contains("{region}") {
        fail(format!(
            "llu.base_url_template `{}` must contain a `{{region}}` placeholder",
            config.llu.base_url_template
        ));
    }

    if config.llu.default_region.trim().is_empty() {
        fail("llu.default_region must not be empty".to_string());
    }

    if config.llu.default_poll_interval_secs == 0 {
        fail("llu.default_poll_interval_secs must be greater than zero".to_string());
    }

    if config.llu.max_redirects == 0 {
        fail("llu.max_redirects must be at least 1".to_string());
    }

    if config.llu.request_timeout_secs == 0 {
        fail("llu.request_timeout_secs must be greater than zero".to_string());
    }

    if config.storage.settings_dir.trim().is_empty() {
        fail("storage.settings_dir must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&GlucolinkConfig::default()).is_ok());
    }

    #[test]
    fn zero_cutoff_fails_validation() {
        let mut config = GlucolinkConfig::default();
        config.freshness.cutoff_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "cutoff_secs"));
    }

    #[test]
    fn template_without_region_fails_validation() {
        let mut config = GlucolinkConfig::default();
        config.llu.base_url_template = "https://api.libreview.io".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "base_url_template"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = GlucolinkConfig::default();
        config.agent.log_level = "loud".to_string();
        config.llu.default_region = " ".to_string();
        config.llu.max_redirects = 0;
        config.storage.settings_dir = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(has_error(&errors, "log_level"));
        assert!(has_error(&errors, "default_region"));
        assert!(has_error(&errors, "max_redirects"));
        assert!(has_error(&errors, "settings_dir"));
    }

    #[test]
    fn non_finite_placeholder_fails_validation() {
        let mut config = GlucolinkConfig::default();
        config.freshness.placeholder_value = f64::NAN;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "placeholder_value"));
    }
}
