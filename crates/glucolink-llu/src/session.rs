// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The LibreLinkUp measurement session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;
use glucolink_config::LluConfig;
use glucolink_core::{
    Clock, GlucolinkError, MeasurementEvent, MeasurementSource, SelectableResource,
    SettingsStore, SettingsStoreExt, SourceStatus,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::SOURCE_ID;
use crate::client::{
    ApiRequest, CONNECTIONS_PATH, LOGIN_PATH, RequestSnapshot, graph_path, hash_account_id,
};
use crate::credentials::{Credentials, SETTINGS_NAME, StoredCredentials};
use crate::types::{ApiEnvelope, GraphData, LoginData, Patient};

/// An authenticated connection to one LibreLinkUp account.
///
/// Credentials are loaded from the settings store on [`start`](Self::start)
/// and written back on [`shutdown`](MeasurementSource::shutdown).
pub struct LibreLinkUpSession {
    config: LluConfig,
    store: Arc<dyn SettingsStore>,
    credentials: Mutex<Credentials>,
    /// Lock order: `snapshot` before `credentials`.
    snapshot: RwLock<RequestSnapshot>,
    status: watch::Sender<SourceStatus>,
    /// Background token refresh spawned by `start`, if any.
    refresh: Mutex<Option<JoinHandle<()>>>,
    /// Bumped by every explicit login; a login whose generation is stale
    /// does not apply its result.
    login_generation: AtomicU64,
}

impl std::fmt::Debug for LibreLinkUpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibreLinkUpSession")
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

impl LibreLinkUpSession {
    /// Loads stored credentials and prepares the session.
    ///
    /// Missing or unreadable credentials leave the session logged out. When
    /// the stored token is close to expiry and a login is on file, a
    /// background re-login is spawned on the current Tokio runtime.
    ///
    /// Fails only if the HTTP client cannot be built.
    pub fn start(
        store: Arc<dyn SettingsStore>,
        config: LluConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<Self>, GlucolinkError> {
        let stored: StoredCredentials = store.load(SETTINGS_NAME, StoredCredentials::default);
        let credentials = Credentials::decode(&stored, &config.default_region);
        let snapshot = RequestSnapshot::build(&config, &credentials)?;
        let (status, _) = watch::channel(credentials.status());

        let refresh = should_refresh(&config, clock.as_ref(), &credentials);
        let relogin = refresh.then(|| {
            (
                credentials.email.clone(),
                SecretString::from(credentials.password.expose_secret().to_string()),
            )
        });

        info!(
            region = %credentials.region,
            status = %credentials.status(),
            interval_secs = credentials.interval_secs,
            "LibreLinkUp session started"
        );

        let session = Arc::new(Self {
            config,
            store,
            credentials: Mutex::new(credentials),
            snapshot: RwLock::new(snapshot),
            status,
            refresh: Mutex::new(None),
            login_generation: AtomicU64::new(0),
        });

        if let Some((email, password)) = relogin {
            session.spawn_relogin(email, password);
        }

        Ok(session)
    }

    fn spawn_relogin(self: &Arc<Self>, email: String, password: SecretString) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime available, skipping token refresh");
            return;
        };
        info!("LibreLinkUp token expires soon, refreshing the login");
        let session = Arc::clone(self);
        let generation = self.login_generation.load(Ordering::SeqCst);
        let task = handle.spawn(async move {
            if let Err(e) = session.perform_login(&email, &password, generation).await {
                error!(error = %e, "background LibreLinkUp re-login failed");
            }
        });
        *self.refresh.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    fn take_refresh(&self) -> Option<JoinHandle<()>> {
        self.refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Waits for a pending background refresh so its token is not lost.
    async fn finish_refresh(&self) {
        let Some(mut task) = self.take_refresh() else {
            return;
        };
        let limit = self.refresh_wait();
        if tokio::time::timeout(limit, &mut task).await.is_err() {
            warn!(wait_secs = limit.as_secs(), "LibreLinkUp token refresh still running, abandoning it");
            task.abort();
        }
    }

    /// Upper bound for one login including its redirects.
    fn refresh_wait(&self) -> Duration {
        let attempts = u64::from(self.config.max_redirects) + 1;
        Duration::from_secs(self.config.request_timeout_secs.saturating_mul(attempts))
    }

    /// True when a token is held.
    pub fn is_logged_in(&self) -> bool {
        self.lock_credentials()
            .map(|c| c.has_token())
            .unwrap_or(false)
    }

    /// Region requests are currently sent to.
    pub fn region(&self) -> Result<String, GlucolinkError> {
        Ok(self.lock_credentials()?.region.clone())
    }

    /// Display name of the selected patient, empty when none.
    pub fn active_resource_name(&self) -> Result<String, GlucolinkError> {
        Ok(self.lock_credentials()?.patient_name.clone())
    }

    fn lock_credentials(&self) -> Result<MutexGuard<'_, Credentials>, GlucolinkError> {
        self.credentials
            .lock()
            .map_err(|_| GlucolinkError::Internal("credentials lock poisoned".into()))
    }

    /// Sends `request`, following region redirects up to the configured limit.
    ///
    /// On a redirect the stored region changes and the request snapshot is
    /// rebuilt before the same request is re-issued.
    async fn exchange(&self, request: ApiRequest) -> Result<ApiEnvelope, GlucolinkError> {
        let limit = self.config.max_redirects;
        for _ in 0..=limit {
            let snapshot = self.snapshot.read().await.clone();
            let envelope = snapshot.send(&request).await?;

            match envelope.redirect_region()? {
                None => return Ok(envelope),
                Some(region) => {
                    info!(region = %region, path = request.path(), "wrong LibreLinkUp region, retrying");
                    self.switch_region(region).await?;
                }
            }
        }
        warn!(limit, path = request.path(), "too many LibreLinkUp region redirects");
        Err(GlucolinkError::TooManyRedirects { limit })
    }

    async fn switch_region(&self, region: String) -> Result<(), GlucolinkError> {
        let mut snapshot = self.snapshot.write().await;
        let rebuilt = {
            let mut credentials = self.lock_credentials()?;
            credentials.region = region;
            RequestSnapshot::build(&self.config, &credentials)?
        };
        *snapshot = rebuilt;
        Ok(())
    }

    /// Logs in and applies the result unless a newer explicit login has
    /// started since `generation` was taken.
    async fn perform_login(
        &self,
        email: &str,
        password: &SecretString,
        generation: u64,
    ) -> Result<(), GlucolinkError> {
        info!("logging in to LibreLinkUp");
        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let envelope = self.exchange(ApiRequest::post(LOGIN_PATH, body)).await?;

        if envelope.status != 0 {
            let message = envelope.error_message();
            warn!(status = envelope.status, message = %message, "LibreLinkUp login rejected");
            return Err(GlucolinkError::LoginRejected(message));
        }

        let data: LoginData = envelope.parse_data()?;
        let account_hash = hash_account_id(&data.user.id);

        let mut snapshot = self.snapshot.write().await;
        let rebuilt = {
            let mut credentials = self.lock_credentials()?;
            if self.login_generation.load(Ordering::SeqCst) != generation {
                debug!("LibreLinkUp login superseded, discarding its token");
                return Err(GlucolinkError::Internal(
                    "login superseded by a newer login".into(),
                ));
            }
            credentials.apply_login(
                email,
                password,
                account_hash,
                data.auth_ticket.token,
                data.auth_ticket.expires,
            );
            RequestSnapshot::build(&self.config, &credentials)?
        };
        *snapshot = rebuilt;
        drop(snapshot);

        self.status.send_replace(SourceStatus::LoggedInNoSelection);
        info!("LibreLinkUp login successful");
        Ok(())
    }

    async fn try_fetch(&self) -> Result<Option<MeasurementEvent>, GlucolinkError> {
        let patient_id = {
            let credentials = self.lock_credentials()?;
            if !credentials.is_authenticated() || credentials.patient_id.is_empty() {
                debug!("LibreLinkUp fetch skipped, not logged in or no patient selected");
                return Ok(None);
            }
            credentials.patient_id.clone()
        };

        debug!("fetching latest LibreLinkUp measurement");
        let envelope = self.exchange(ApiRequest::get(graph_path(&patient_id))).await?;
        if envelope.status != 0 {
            warn!(status = envelope.status, message = %envelope.error_message(), "LibreLinkUp graph request failed");
            return Ok(None);
        }

        let graph: GraphData = envelope.parse_data()?;
        let measurement = graph.connection.glucose_measurement;
        let measured_at = measurement.measured_at()?;
        Ok(Some(MeasurementEvent::fresh(measurement.value, measured_at)))
    }
}

fn should_refresh(config: &LluConfig, clock: &dyn Clock, credentials: &Credentials) -> bool {
    !credentials.email.is_empty()
        && credentials.token_expires_within(
            clock.now(),
            TimeDelta::days(config.token_refresh_threshold_days),
        )
}

#[async_trait]
impl MeasurementSource for LibreLinkUpSession {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    fn subscribe_status(&self) -> watch::Receiver<SourceStatus> {
        self.status.subscribe()
    }

    fn poll_interval(&self) -> Duration {
        let secs = self
            .lock_credentials()
            .map(|c| c.interval_secs)
            .unwrap_or(crate::credentials::DEFAULT_INTERVAL_SECS);
        Duration::from_secs(secs.max(1) as u64)
    }

    async fn set_poll_interval(&self, interval: Duration) {
        let secs = i64::try_from(interval.as_secs()).unwrap_or(i64::MAX).max(1);
        match self.lock_credentials() {
            Ok(mut credentials) => {
                credentials.interval_secs = secs;
                info!(interval_secs = secs, "LibreLinkUp poll interval changed");
            }
            Err(e) => error!(error = %e, "failed to update poll interval"),
        }
    }

    async fn login(&self, email: &str, password: &SecretString) -> Result<(), GlucolinkError> {
        let generation = self.login_generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(task) = self.take_refresh()
            && !task.is_finished()
        {
            debug!("explicit login replaces the pending token refresh");
            task.abort();
        }
        self.perform_login(email, password, generation).await
    }

    async fn list_selectable(&self) -> Result<Vec<SelectableResource>, GlucolinkError> {
        if !self.lock_credentials()?.is_authenticated() {
            return Ok(Vec::new());
        }

        info!("querying LibreLinkUp patients");
        let envelope = self.exchange(ApiRequest::get(CONNECTIONS_PATH)).await?;
        if envelope.status != 0 {
            warn!(status = envelope.status, message = %envelope.error_message(), "LibreLinkUp connections request failed");
            return Ok(Vec::new());
        }

        let patients: Vec<Patient> = envelope.parse_data()?;
        Ok(patients.into_iter().map(SelectableResource::from).collect())
    }

    async fn select_active(&self, resource: &SelectableResource) {
        let name = resource.display_name();
        match self.lock_credentials() {
            Ok(mut credentials) => {
                credentials.patient_id = resource.id.clone();
                credentials.patient_name = name.clone();
            }
            Err(e) => {
                error!(error = %e, "failed to select patient");
                return;
            }
        }
        info!(patient = %name, "LibreLinkUp patient selected");
        self.status.send_replace(SourceStatus::Active { name });
    }

    async fn fetch_latest(&self) -> MeasurementEvent {
        match self.try_fetch().await {
            Ok(Some(event)) => event,
            Ok(None) => MeasurementEvent::Failed,
            Err(e) => {
                warn!(error = %e, "failed to fetch LibreLinkUp measurement");
                MeasurementEvent::Failed
            }
        }
    }

    async fn shutdown(&self) -> Result<(), GlucolinkError> {
        self.finish_refresh().await;
        let stored = self.lock_credentials()?.encode();
        self.store.save(SETTINGS_NAME, &stored)?;
        debug!("LibreLinkUp credentials saved");
        Ok(())
    }
}
