// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The host-facing facade.
//!
//! [`GlucoseMonitor`] owns the freshness controller, the active source and
//! its scheduler, and the persisted `GeneralSettings` (placeholder value,
//! freshness cutoff, selected source). Hosts read the published value,
//! subscribe to updates, and route UI actions through it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use glucolink_config::{FreshnessConfig, GlucolinkConfig};
use glucolink_core::{
    Clock, GlucolinkError, MeasurementSource, PublishedState, SelectableResource, SettingsStore,
    SettingsStoreExt, SourceStatus,
};
use glucolink_plugin::{SourceContext, SourceRegistry};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::freshness::{FreshnessController, FreshnessHandle, FreshnessState};
use crate::scheduler::PollScheduler;

/// Settings group holding [`GeneralSettings`].
pub const GENERAL_SETTINGS: &str = "GeneralSettings";

/// User-facing settings persisted across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    #[serde(default)]
    pub placeholder_value: f64,
    /// Seconds.
    #[serde(default = "default_cutoff")]
    pub fresh_value_cutoff: u64,
    /// Empty when no source is selected.
    #[serde(default)]
    pub selected_source_id: String,
}

fn default_cutoff() -> u64 {
    300
}

impl GeneralSettings {
    /// First-run settings seeded from the config file.
    pub fn from_config(config: &FreshnessConfig) -> Self {
        Self {
            placeholder_value: config.placeholder_value,
            fresh_value_cutoff: config.cutoff_secs,
            selected_source_id: config.default_source.clone().unwrap_or_default(),
        }
    }

    pub fn selected_source(&self) -> Option<&str> {
        Some(self.selected_source_id.as_str()).filter(|id| !id.is_empty())
    }
}

struct ActiveSource {
    id: String,
    source: Arc<dyn MeasurementSource>,
    scheduler: PollScheduler,
    status_task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ActiveSource {
    /// Persists the source's state, then stops its scheduler and status forwarding.
    async fn shutdown(self) -> Result<(), GlucolinkError> {
        info!(source = %self.id, "stopping measurement source");
        let saved = self.source.shutdown().await;
        if let Err(e) = &saved {
            error!(source = %self.id, error = %e, "failed to persist source state");
        }
        self.cancel.cancel();
        self.scheduler.stop().await;
        if let Err(e) = self.status_task.await {
            debug!(error = %e, "status forwarder ended abnormally");
        }
        saved
    }
}

/// Acquisition and freshness engine behind one host.
pub struct GlucoseMonitor {
    registry: SourceRegistry,
    ctx: SourceContext,
    settings: Mutex<GeneralSettings>,
    freshness: FreshnessController,
    handle: FreshnessHandle,
    active: Mutex<Option<ActiveSource>>,
}

impl std::fmt::Debug for GlucoseMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlucoseMonitor")
            .field("published", &self.handle.current())
            .finish_non_exhaustive()
    }
}

impl GlucoseMonitor {
    /// Loads `GeneralSettings`, starts the freshness controller and, if one
    /// is selected, the source.
    ///
    /// A selected source that cannot be started is logged and left
    /// inactive; the monitor keeps publishing the placeholder.
    pub async fn start(
        config: &GlucolinkConfig,
        store: Arc<dyn SettingsStore>,
        registry: SourceRegistry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings: GeneralSettings =
            store.load(GENERAL_SETTINGS, || GeneralSettings::from_config(&config.freshness));

        let freshness = FreshnessController::spawn(
            FreshnessState::new(
                Duration::from_secs(settings.fresh_value_cutoff),
                settings.placeholder_value,
            ),
            Arc::clone(&clock),
        );
        let handle = freshness.handle();

        info!(
            cutoff_secs = settings.fresh_value_cutoff,
            placeholder = settings.placeholder_value,
            source = settings.selected_source().unwrap_or("none"),
            "glucose monitor starting"
        );

        let ctx = SourceContext {
            store,
            llu: config.llu.clone(),
            clock,
        };
        let selected = settings.selected_source().map(str::to_string);

        let monitor = Self {
            registry,
            ctx,
            settings: Mutex::new(settings),
            freshness,
            handle,
            active: Mutex::new(None),
        };

        if let Some(id) = selected {
            match monitor.activate(&id) {
                Ok(active) => *monitor.active.lock().await = Some(active),
                Err(e) => warn!(source = %id, error = %e, "selected source could not be started"),
            }
        }

        monitor
    }

    /// Latest published value: a real reading or the placeholder.
    pub fn current_value(&self) -> f64 {
        self.handle.current().value
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.handle.current().timestamp
    }

    pub fn status(&self) -> String {
        self.handle.current().status
    }

    /// The whole published state, read atomically.
    pub fn state(&self) -> PublishedState {
        self.handle.current()
    }

    /// Notified on every publish ("value updated").
    pub fn subscribe(&self) -> watch::Receiver<PublishedState> {
        self.handle.subscribe()
    }

    pub async fn settings(&self) -> GeneralSettings {
        self.settings.lock().await.clone()
    }

    pub async fn active_source_id(&self) -> Option<String> {
        self.active.lock().await.as_ref().map(|a| a.id.clone())
    }

    /// Requests an immediate poll of the active source. No-op without one.
    pub async fn force_update(&self) {
        match self.active.lock().await.as_ref() {
            Some(active) => active.scheduler.force(),
            None => debug!("force update ignored, no active source"),
        }
    }

    /// Replaces the active source with a new one built from the registry.
    ///
    /// The old source persists its state before the new one starts. An
    /// unknown id leaves everything untouched.
    pub async fn select_source(&self, id: &str) -> Result<(), GlucolinkError> {
        if self.registry.get(id).is_none() {
            return Err(GlucolinkError::SourceNotFound { id: id.to_string() });
        }

        let mut active = self.active.lock().await;
        if let Some(old) = active.take()
            && let Err(e) = old.shutdown().await
        {
            debug!(error = %e, "previous source did not shut down cleanly, switching anyway");
        }
        match self.activate(id) {
            Ok(new) => *active = Some(new),
            Err(e) => {
                self.handle.set_status(SourceStatus::NoSource.to_string()).await;
                return Err(e);
            }
        }
        drop(active);

        let mut settings = self.settings.lock().await;
        settings.selected_source_id = id.to_string();
        self.persist(&settings)
    }

    /// Changes the freshness window. The staleness timer restarts from now.
    pub async fn set_freshness_cutoff(&self, cutoff_secs: u64) -> Result<(), GlucolinkError> {
        if cutoff_secs == 0 {
            return Err(GlucolinkError::Config(
                "freshness cutoff must be greater than zero".into(),
            ));
        }
        self.handle
            .set_cutoff(Duration::from_secs(cutoff_secs))
            .await;
        let mut settings = self.settings.lock().await;
        settings.fresh_value_cutoff = cutoff_secs;
        self.persist(&settings)
    }

    /// Changes the value published when no fresh reading exists.
    pub async fn set_placeholder(&self, value: f64) -> Result<(), GlucolinkError> {
        if !value.is_finite() {
            return Err(GlucolinkError::Config(
                "placeholder value must be a finite number".into(),
            ));
        }
        self.handle.set_placeholder(value).await;
        let mut settings = self.settings.lock().await;
        settings.placeholder_value = value;
        self.persist(&settings)
    }

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), GlucolinkError> {
        self.active_source().await?.login(email, password).await
    }

    pub async fn list_selectable(&self) -> Result<Vec<SelectableResource>, GlucolinkError> {
        self.active_source().await?.list_selectable().await
    }

    pub async fn select_active(&self, resource: &SelectableResource) -> Result<(), GlucolinkError> {
        self.active_source().await?.select_active(resource).await;
        Ok(())
    }

    /// Changes how often the active source is polled.
    pub async fn set_poll_interval(&self, interval: Duration) -> Result<(), GlucolinkError> {
        let active = self.active.lock().await;
        let active = active.as_ref().ok_or(GlucolinkError::NoActiveSource)?;
        active.source.set_poll_interval(interval).await;
        active.scheduler.set_interval(interval);
        Ok(())
    }

    /// Persists settings, shuts the active source down (persisting its
    /// state), then stops the controller.
    pub async fn stop(self) -> Result<(), GlucolinkError> {
        let saved = {
            let settings = self.settings.lock().await;
            self.persist(&settings)
        };

        let active = self.active.lock().await.take();
        let source_saved = match active {
            Some(active) => active.shutdown().await,
            None => Ok(()),
        };

        self.freshness.stop().await;
        info!("glucose monitor stopped");
        saved.and(source_saved)
    }

    fn activate(&self, id: &str) -> Result<ActiveSource, GlucolinkError> {
        let source = self.registry.create(id, self.ctx.clone())?;
        let cancel = CancellationToken::new();

        let status_task = spawn_status_forwarder(
            source.subscribe_status(),
            self.handle.clone(),
            cancel.clone(),
        );
        let scheduler = PollScheduler::spawn(
            Arc::clone(&source),
            self.handle.clone(),
            source.poll_interval(),
            cancel.child_token(),
        );

        info!(source = id, "measurement source started");
        Ok(ActiveSource {
            id: id.to_string(),
            source,
            scheduler,
            status_task,
            cancel,
        })
    }

    async fn active_source(&self) -> Result<Arc<dyn MeasurementSource>, GlucolinkError> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|a| Arc::clone(&a.source))
            .ok_or(GlucolinkError::NoActiveSource)
    }

    fn persist(&self, settings: &GeneralSettings) -> Result<(), GlucolinkError> {
        self.ctx.store.save(GENERAL_SETTINGS, settings)?;
        debug!("general settings saved");
        Ok(())
    }
}

/// Publishes the source's current status and every later change.
fn spawn_status_forwarder(
    mut status: watch::Receiver<SourceStatus>,
    sink: FreshnessHandle,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let text = status.borrow_and_update().to_string();
            sink.set_status(text).await;
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    })
}
