// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered config loading with Figment.
//!
//! Lookup order: `./glucolink.toml` > `~/.config/glucolink/glucolink.toml` >
//! `/etc/glucolink/glucolink.toml`, with `GLUCOLINK_` environment overrides
//! on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::GlucolinkConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/glucolink/glucolink.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "glucolink.toml";

/// Per-user config file under the XDG config dir.
pub fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("glucolink").join(LOCAL_CONFIG_FILE))
        .unwrap_or_default()
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/glucolink/glucolink.toml`
/// 3. `~/.config/glucolink/glucolink.toml`
/// 4. `./glucolink.toml`
/// 5. `GLUCOLINK_*` environment variables
pub fn load_config() -> Result<GlucolinkConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<GlucolinkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GlucolinkConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file, still honouring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<GlucolinkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GlucolinkConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(GlucolinkConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Maps `GLUCOLINK_<SECTION>_<KEY>` onto `section.key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `GLUCOLINK_LLU_MAX_REDIRECTS` lands on `llu.max_redirects`.
fn env_provider() -> Env {
    Env::prefixed("GLUCOLINK_").map(|key| {
        let key_str = key.as_str();
        let mapped = ["agent", "freshness", "llu", "storage"]
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key_str.to_string());
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GLUCOLINK_LLU_MAX_REDIRECTS", "3");
            jail.set_env("GLUCOLINK_FRESHNESS_CUTOFF_SECS", "600");
            jail.set_env("GLUCOLINK_AGENT_LOG_LEVEL", "debug");
            let config = load_config()?;
            assert_eq!(config.llu.max_redirects, 3);
            assert_eq!(config.freshness.cutoff_secs, 600);
            assert_eq!(config.agent.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn local_file_is_picked_up() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG_FILE,
                r#"
[freshness]
placeholder_value = 39.0
default_source = "llu"
"#,
            )?;
            let config = load_config()?;
            assert_eq!(config.freshness.placeholder_value, 39.0);
            assert_eq!(config.freshness.default_source.as_deref(), Some("llu"));
            Ok(())
        });
    }

    #[test]
    fn explicit_path_loads() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[llu]\ndefault_region = \"us\"\n")?;
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.llu.default_region, "us");
            Ok(())
        });
    }
}
