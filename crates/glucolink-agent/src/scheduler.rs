// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling scheduler.
//!
//! Fires the source's `fetch_latest` once at start and then every poll
//! interval. Each fetch runs in its own task and feeds the freshness
//! controller, so a hung request never delays the next tick.

use std::sync::Arc;
use std::time::Duration;

use glucolink_core::MeasurementSource;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::freshness::FreshnessHandle;

/// Shortest accepted poll interval.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to a running polling loop.
#[derive(Debug)]
pub struct PollScheduler {
    interval: watch::Sender<Duration>,
    force: Arc<Notify>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollScheduler {
    /// Starts polling `source` and forwarding results to `sink`.
    pub fn spawn(
        source: Arc<dyn MeasurementSource>,
        sink: FreshnessHandle,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let (interval_tx, interval_rx) = watch::channel(interval.max(MIN_INTERVAL));
        let force = Arc::new(Notify::new());
        let poller = Poller {
            source,
            sink,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(poller.run(interval_rx, Arc::clone(&force)));

        Self {
            interval: interval_tx,
            force,
            cancel,
            task,
        }
    }

    /// Changes the interval. The next fire is at `last fire + interval`, or
    /// immediately if that moment has already passed.
    pub fn set_interval(&self, interval: Duration) {
        self.interval.send_replace(interval.max(MIN_INTERVAL));
    }

    pub fn interval(&self) -> Duration {
        *self.interval.borrow()
    }

    /// Requests an extra fetch now without moving the periodic deadline.
    pub fn force(&self) {
        self.force.notify_one();
    }

    /// Stops polling and abandons in-flight fetches.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            debug!(error = %e, "poll scheduler task ended abnormally");
        }
    }
}

struct Poller {
    source: Arc<dyn MeasurementSource>,
    sink: FreshnessHandle,
    cancel: CancellationToken,
}

impl Poller {
    async fn run(self, mut interval_rx: watch::Receiver<Duration>, force: Arc<Notify>) {
        let mut interval = *interval_rx.borrow_and_update();
        info!(
            source = self.source.id(),
            interval_secs = interval.as_secs(),
            "polling started"
        );

        let mut last_fire = Instant::now();
        self.fire();
        let next = tokio::time::sleep_until(last_fire + interval);
        tokio::pin!(next);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                () = &mut next => {
                    last_fire = Instant::now();
                    self.fire();
                    next.as_mut().reset(last_fire + interval);
                }
                changed = interval_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    interval = *interval_rx.borrow_and_update();
                    info!(interval_secs = interval.as_secs(), "poll interval changed");
                    // A deadline already in the past completes on the next poll.
                    next.as_mut().reset(last_fire + interval);
                }
                () = force.notified() => {
                    debug!("forced poll");
                    self.fire();
                }
            }
        }
        debug!(source = self.source.id(), "polling stopped");
    }

    fn fire(&self) {
        let source = Arc::clone(&self.source);
        let sink = self.sink.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                event = source.fetch_latest() => sink.submit(event).await,
            }
        });
    }
}
