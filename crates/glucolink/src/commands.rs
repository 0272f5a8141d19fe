// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot CLI commands.
//!
//! Each command starts a monitor against the persisted settings, performs
//! one action, and stops the monitor so everything it changed is saved.

use std::sync::Arc;
use std::time::Duration;

use glucolink_agent::{GENERAL_SETTINGS, GeneralSettings, GlucoseMonitor};
use glucolink_config::GlucolinkConfig;
use glucolink_core::{GlucolinkError, PublishedState, SettingsStore, SettingsStoreExt, SystemClock};
use glucolink_plugin::builtin_registry;
use glucolink_storage::JsonFileStore;
use serde::Serialize;
use tracing::debug;

use crate::prompt;

/// Opens the settings directory and starts a monitor on it.
pub async fn open_monitor(config: &GlucolinkConfig) -> Result<GlucoseMonitor, GlucolinkError> {
    let store = open_store(config)?;
    Ok(GlucoseMonitor::start(config, store, builtin_registry(), Arc::new(SystemClock)).await)
}

fn open_store(config: &GlucolinkConfig) -> Result<Arc<dyn SettingsStore>, GlucolinkError> {
    let store = JsonFileStore::open(config.storage.settings_dir.as_str())?;
    debug!(dir = %store.dir().display(), "settings directory opened");
    Ok(Arc::new(store))
}

/// Stops the monitor, preferring the action's error over a shutdown error.
async fn finish<T>(
    monitor: GlucoseMonitor,
    result: Result<T, GlucolinkError>,
) -> Result<T, GlucolinkError> {
    let stopped = monitor.stop().await;
    let value = result?;
    stopped?;
    Ok(value)
}

/// `glucolink sources`
pub async fn run_sources(config: &GlucolinkConfig) -> Result<(), GlucolinkError> {
    let store = open_store(config)?;
    let settings: GeneralSettings =
        store.load(GENERAL_SETTINGS, || GeneralSettings::from_config(&config.freshness));
    let registry = builtin_registry();

    for entry in registry.list() {
        let marker = if settings.selected_source() == Some(entry.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {:<8} {}", entry.id, entry.display_name);
    }
    Ok(())
}

/// `glucolink source <id>`
pub async fn run_select_source(config: &GlucolinkConfig, id: &str) -> Result<(), GlucolinkError> {
    let monitor = open_monitor(config).await?;
    let result = monitor.select_source(id).await;
    finish(monitor, result).await?;
    println!("active source: {id}");
    Ok(())
}

/// `glucolink login --email <email>`
pub async fn run_login(
    config: &GlucolinkConfig,
    email: &str,
    password: Option<String>,
) -> Result<(), GlucolinkError> {
    let password = prompt::login_password(password)?;
    let monitor = open_monitor(config).await?;
    let result = monitor.login(email, &password).await;
    finish(monitor, result).await?;
    println!("logged in as {email}");
    Ok(())
}

/// `glucolink patients`
pub async fn run_patients(config: &GlucolinkConfig) -> Result<(), GlucolinkError> {
    let monitor = open_monitor(config).await?;
    let result = monitor.list_selectable().await;
    let patients = finish(monitor, result).await?;

    if patients.is_empty() {
        println!("no patients available; log in first");
    }
    for patient in patients {
        println!("{}  {}", patient.id, patient.display_name());
    }
    Ok(())
}

/// `glucolink select <patient-id>`
pub async fn run_select_patient(
    config: &GlucolinkConfig,
    patient_id: &str,
) -> Result<(), GlucolinkError> {
    let monitor = open_monitor(config).await?;
    let result = select_patient(&monitor, patient_id).await;
    let name = finish(monitor, result).await?;
    println!("following {name}");
    Ok(())
}

async fn select_patient(
    monitor: &GlucoseMonitor,
    patient_id: &str,
) -> Result<String, GlucolinkError> {
    let patients = monitor.list_selectable().await?;
    let patient = patients
        .iter()
        .find(|p| p.id == patient_id)
        .ok_or_else(|| GlucolinkError::Config(format!("unknown patient id `{patient_id}`")))?;
    monitor.select_active(patient).await?;
    Ok(patient.display_name())
}

/// `glucolink cutoff <secs>`
pub async fn run_cutoff(config: &GlucolinkConfig, secs: u64) -> Result<(), GlucolinkError> {
    let monitor = open_monitor(config).await?;
    let result = monitor.set_freshness_cutoff(secs).await;
    finish(monitor, result).await?;
    println!("freshness cutoff: {secs}s");
    Ok(())
}

/// `glucolink placeholder <value>`
pub async fn run_placeholder(config: &GlucolinkConfig, value: f64) -> Result<(), GlucolinkError> {
    let monitor = open_monitor(config).await?;
    let result = monitor.set_placeholder(value).await;
    finish(monitor, result).await?;
    println!("placeholder value: {value}");
    Ok(())
}

/// `glucolink interval <secs>`
pub async fn run_interval(config: &GlucolinkConfig, secs: u64) -> Result<(), GlucolinkError> {
    let monitor = open_monitor(config).await?;
    let result = monitor.set_poll_interval(Duration::from_secs(secs)).await;
    finish(monitor, result).await?;
    println!("poll interval: {}s", secs.max(1));
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    source: Option<String>,
    #[serde(flatten)]
    state: PublishedState,
    settings: GeneralSettings,
}

/// `glucolink status`
///
/// Waits up to `wait_secs` for the first reading so the value shown is
/// current rather than the startup placeholder.
pub async fn run_status(
    config: &GlucolinkConfig,
    json: bool,
    wait_secs: u64,
) -> Result<(), GlucolinkError> {
    let monitor = open_monitor(config).await?;
    let source = monitor.active_source_id().await;

    if source.is_some() && wait_secs > 0 {
        let mut updates = monitor.subscribe();
        let started = updates.borrow().timestamp;
        let waited = tokio::time::timeout(
            Duration::from_secs(wait_secs),
            updates.wait_for(|s| s.timestamp != started),
        )
        .await;
        if waited.is_err() {
            debug!(wait_secs, "no reading arrived before the wait elapsed");
        }
    }

    let report = StatusReport {
        source,
        state: monitor.state(),
        settings: monitor.settings().await,
    };
    finish(monitor, Ok(())).await?;

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| GlucolinkError::Internal(format!("failed to render status: {e}")))?;
        println!("{out}");
    } else {
        print!("{}", render_status(&report));
    }
    Ok(())
}

fn render_status(report: &StatusReport) -> String {
    format!(
        "source:       {}\n\
         status:       {}\n\
         value:        {} at {}\n\
         cutoff:       {}s\n\
         placeholder:  {}\n",
        report.source.as_deref().unwrap_or("none"),
        report.state.status,
        report.state.value,
        report.state.local_timestamp().format("%Y-%m-%d %H:%M:%S"),
        report.settings.fresh_value_cutoff,
        report.settings.placeholder_value,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glucolink_core::SourceStatus;

    fn config_in(dir: &std::path::Path) -> GlucolinkConfig {
        let mut config = GlucolinkConfig::default();
        config.storage.settings_dir = dir.display().to_string();
        config
    }

    fn stored(dir: &std::path::Path) -> GeneralSettings {
        let store = JsonFileStore::open(dir).unwrap();
        let value = store.load_value(GENERAL_SETTINGS).unwrap().unwrap();
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn cutoff_and_placeholder_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        run_cutoff(&config, 900).await.unwrap();
        run_placeholder(&config, -1.0).await.unwrap();

        let settings = stored(dir.path());
        assert_eq!(settings.fresh_value_cutoff, 900);
        assert_eq!(settings.placeholder_value, -1.0);
    }

    #[tokio::test]
    async fn invalid_cutoff_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let err = run_cutoff(&config, 0).await.unwrap_err();
        assert!(matches!(err, GlucolinkError::Config(_)));
    }

    #[tokio::test]
    async fn source_commands_need_an_active_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let err = run_patients(&config).await.unwrap_err();
        assert!(matches!(err, GlucolinkError::NoActiveSource));
        let err = run_interval(&config, 30).await.unwrap_err();
        assert!(matches!(err, GlucolinkError::NoActiveSource));
    }

    #[tokio::test]
    async fn unknown_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let err = run_select_source(&config, "dexcom").await.unwrap_err();
        assert!(matches!(err, GlucolinkError::SourceNotFound { .. }));
    }

    #[test]
    fn status_report_lists_settings() {
        let report = StatusReport {
            source: Some("llu".into()),
            state: PublishedState {
                value: 123.0,
                timestamp: chrono::Utc::now(),
                status: SourceStatus::LoggedInNoSelection.to_string(),
                sequence: 4,
            },
            settings: GeneralSettings {
                placeholder_value: 0.0,
                fresh_value_cutoff: 300,
                selected_source_id: "llu".into(),
            },
        };

        let text = render_status(&report);
        assert!(text.contains("source:       llu"));
        assert!(text.contains("status:       logged in, no resource selected"));
        assert!(text.contains("value:        123 at "));
        assert!(text.contains("cutoff:       300s"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["source"], "llu");
        assert_eq!(json["value"], 123.0);
        assert_eq!(json["settings"]["freshValueCutoff"], 300);
    }
}
