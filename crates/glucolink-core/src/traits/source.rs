// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The measurement-acquisition contract every backend implements.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::watch;

use crate::error::GlucolinkError;
use crate::types::{MeasurementEvent, SelectableResource, SourceStatus};

/// A pluggable backend that produces glucose readings from a remote account.
///
/// The polling scheduler and freshness controller only ever talk to this
/// trait, so adding a backend means implementing it and registering a
/// factory.
#[async_trait]
pub trait MeasurementSource: Send + Sync + 'static {
    /// Registry id of the backend (e.g. "llu").
    fn id(&self) -> &str;

    /// Subscribes to status changes. The receiver starts at the current status.
    fn subscribe_status(&self) -> watch::Receiver<SourceStatus>;

    /// Current status.
    fn status(&self) -> SourceStatus {
        self.subscribe_status().borrow().clone()
    }

    /// How often the scheduler should call [`fetch_latest`](Self::fetch_latest).
    fn poll_interval(&self) -> Duration;

    /// Changes the poll interval; persisted on shutdown.
    async fn set_poll_interval(&self, interval: Duration);

    /// Authenticates against the remote account.
    ///
    /// Returns [`GlucolinkError::LoginRejected`] with the server's message when
    /// the credentials are refused.
    async fn login(&self, email: &str, password: &SecretString) -> Result<(), GlucolinkError>;

    /// Lists the resources the logged-in account may poll.
    ///
    /// Empty when not logged in or when the API reports a failure status.
    async fn list_selectable(&self) -> Result<Vec<SelectableResource>, GlucolinkError>;

    /// Makes `resource` the one polled by [`fetch_latest`](Self::fetch_latest). No network call.
    async fn select_active(&self, resource: &SelectableResource);

    /// Fetches the latest reading. Never fails; problems become [`MeasurementEvent::Failed`].
    async fn fetch_latest(&self) -> MeasurementEvent;

    /// Persists session state. Must complete before the source counts as stopped.
    async fn shutdown(&self) -> Result<(), GlucolinkError>;
}
