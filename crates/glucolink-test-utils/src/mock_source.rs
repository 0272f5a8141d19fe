// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock measurement source for deterministic testing.
//!
//! `MockSource` returns scripted events from a FIFO queue and counts every
//! call, so scheduler and monitor tests run without a network.

use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use glucolink_core::{
    GlucolinkError, MeasurementEvent, MeasurementSource, SelectableResource, SourceStatus,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, watch};

/// A scripted measurement source.
///
/// Events are popped from a queue; an empty queue yields
/// [`MeasurementEvent::Failed`].
pub struct MockSource {
    id: String,
    events: Mutex<VecDeque<MeasurementEvent>>,
    status: watch::Sender<SourceStatus>,
    interval: StdMutex<Duration>,
    password: String,
    resources: Vec<SelectableResource>,
    fetch_delay: Option<Duration>,
    fail_shutdown: bool,
    fetches: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl MockSource {
    /// A logged-out source with a 60 s poll interval and password `secret`.
    pub fn new(id: &str) -> Self {
        let (status, _) = watch::channel(SourceStatus::NotLoggedIn);
        Self {
            id: id.to_string(),
            events: Mutex::new(VecDeque::new()),
            status,
            interval: StdMutex::new(Duration::from_secs(60)),
            password: "secret".to_string(),
            resources: Vec::new(),
            fetch_delay: None,
            fail_shutdown: false,
            fetches: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
        }
    }

    pub fn with_interval(self, interval: Duration) -> Self {
        if let Ok(mut current) = self.interval.lock() {
            *current = interval;
        }
        self
    }

    pub fn with_resources(mut self, resources: Vec<SelectableResource>) -> Self {
        self.resources = resources;
        self
    }

    /// Makes every fetch sleep first, simulating a slow upstream.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Makes `shutdown` report a storage failure after counting the call.
    pub fn with_failing_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }

    /// Queues an event for a future fetch.
    pub async fn push_event(&self, event: MeasurementEvent) {
        self.events.lock().await.push_back(event);
    }

    pub fn set_status(&self, status: SourceStatus) {
        self.status.send_replace(status);
    }

    /// Number of fetches started.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MeasurementSource for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn subscribe_status(&self) -> watch::Receiver<SourceStatus> {
        self.status.subscribe()
    }

    fn poll_interval(&self) -> Duration {
        self.interval
            .lock()
            .map(|d| *d)
            .unwrap_or(Duration::from_secs(60))
    }

    async fn set_poll_interval(&self, interval: Duration) {
        if let Ok(mut current) = self.interval.lock() {
            *current = interval;
        }
    }

    async fn login(&self, _email: &str, password: &SecretString) -> Result<(), GlucolinkError> {
        if password.expose_secret() != self.password {
            return Err(GlucolinkError::LoginRejected("incorrect password".into()));
        }
        self.status.send_replace(SourceStatus::LoggedInNoSelection);
        Ok(())
    }

    async fn list_selectable(&self) -> Result<Vec<SelectableResource>, GlucolinkError> {
        if *self.status.borrow() == SourceStatus::NotLoggedIn {
            return Ok(Vec::new());
        }
        Ok(self.resources.clone())
    }

    async fn select_active(&self, resource: &SelectableResource) {
        self.status.send_replace(SourceStatus::Active {
            name: resource.display_name(),
        });
    }

    async fn fetch_latest(&self) -> MeasurementEvent {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        self.events
            .lock()
            .await
            .pop_front()
            .unwrap_or(MeasurementEvent::Failed)
    }

    async fn shutdown(&self) -> Result<(), GlucolinkError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.fail_shutdown {
            return Err(GlucolinkError::storage(std::io::Error::other(
                "settings store unavailable",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn pops_events_then_fails() {
        let source = MockSource::new("mock");
        let at = Utc::now();
        source.push_event(MeasurementEvent::fresh(5.5, at)).await;

        assert_eq!(source.fetch_latest().await, MeasurementEvent::fresh(5.5, at));
        assert_eq!(source.fetch_latest().await, MeasurementEvent::Failed);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn login_checks_password() {
        let source = MockSource::new("mock");
        let wrong = SecretString::from("nope".to_string());
        assert!(source.login("a@b.c", &wrong).await.is_err());
        assert_eq!(source.status(), SourceStatus::NotLoggedIn);

        let right = SecretString::from("secret".to_string());
        source.login("a@b.c", &right).await.unwrap();
        assert_eq!(source.status(), SourceStatus::LoggedInNoSelection);
    }
}
