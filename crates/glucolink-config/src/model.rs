// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for glucolink.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelt key is
//! reported at startup instead of silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level glucolink configuration.
///
/// Every section is optional and falls back to defaults that talk to the
/// production LibreLinkUp API.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GlucolinkConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Initial freshness policy, used until the user changes it at runtime.
    #[serde(default)]
    pub freshness: FreshnessConfig,

    /// LibreLinkUp API settings.
    #[serde(default)]
    pub llu: LluConfig,

    /// Settings persistence.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Defaults for the persisted plugin settings.
///
/// These seed the `GeneralSettings` blob on first run; afterwards the
/// persisted values win.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FreshnessConfig {
    /// Value published when no fresh reading exists.
    #[serde(default)]
    pub placeholder_value: f64,

    /// Maximum age in seconds before a reading is replaced by the placeholder.
    #[serde(default = "default_cutoff_secs")]
    pub cutoff_secs: u64,

    /// Source id activated on first run.
    #[serde(default)]
    pub default_source: Option<String>,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            placeholder_value: 0.0,
            cutoff_secs: default_cutoff_secs(),
            default_source: None,
        }
    }
}

fn default_cutoff_secs() -> u64 {
    300
}

/// LibreLinkUp API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LluConfig {
    /// Base URL with a `{region}` placeholder.
    #[serde(default = "default_base_url_template")]
    pub base_url_template: String,

    /// Region tried before the API redirects us to the right one.
    #[serde(default = "default_region")]
    pub default_region: String,

    /// Poll interval used when none has been stored.
    #[serde(default = "default_poll_interval_secs")]
    pub default_poll_interval_secs: u64,

    /// Region redirects followed per request before giving up.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    /// Re-login at startup when the token expires within this many days.
    #[serde(default = "default_token_refresh_threshold_days")]
    pub token_refresh_threshold_days: i64,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// `product` header expected by the API.
    #[serde(default = "default_product")]
    pub product: String,

    /// `version` header expected by the API.
    #[serde(default = "default_version")]
    pub version: String,

    /// `user-agent` header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for LluConfig {
    fn default() -> Self {
        Self {
            base_url_template: default_base_url_template(),
            default_region: default_region(),
            default_poll_interval_secs: default_poll_interval_secs(),
            max_redirects: default_max_redirects(),
            token_refresh_threshold_days: default_token_refresh_threshold_days(),
            request_timeout_secs: default_request_timeout_secs(),
            product: default_product(),
            version: default_version(),
            user_agent: default_user_agent(),
        }
    }
}

impl LluConfig {
    /// Base URL for `region`.
    pub fn base_url(&self, region: &str) -> String {
        self.base_url_template.replace("{region}", region)
    }
}

fn default_base_url_template() -> String {
    "https://api-{region}.libreview.io".to_string()
}

fn default_region() -> String {
    "eu".to_string()
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_max_redirects() -> u32 {
    5
}

fn default_token_refresh_threshold_days() -> i64 {
    7
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_product() -> String {
    "llu.ios".to_string()
}

fn default_version() -> String {
    "4.12.0".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; rv:129.0) Gecko/20100101 Firefox/129.0".to_string()
}

/// Settings persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding one JSON file per settings group.
    #[serde(default = "default_settings_dir")]
    pub settings_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            settings_dir: default_settings_dir(),
        }
    }
}

fn default_settings_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("glucolink").join("settings"))
        .unwrap_or_else(|| std::path::PathBuf::from("glucolink-settings"))
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_substitutes_region() {
        let llu = LluConfig::default();
        assert_eq!(llu.base_url("us"), "https://api-us.libreview.io");
    }

    #[test]
    fn defaults_match_upstream_expectations() {
        let config = GlucolinkConfig::default();
        assert_eq!(config.freshness.cutoff_secs, 300);
        assert_eq!(config.freshness.placeholder_value, 0.0);
        assert_eq!(config.llu.default_region, "eu");
        assert_eq!(config.llu.default_poll_interval_secs, 60);
        assert_eq!(config.llu.max_redirects, 5);
        assert_eq!(config.llu.token_refresh_threshold_days, 7);
        assert!(config.storage.settings_dir.ends_with("settings"));
    }
}
