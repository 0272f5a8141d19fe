// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Freshness controller: the single state machine a consumer observes.
//!
//! [`FreshnessState`] is the pure transition function. [`FreshnessController`]
//! runs it inside one actor task that also owns the staleness deadline, so
//! events, reconfiguration and expiry are applied strictly one at a time and
//! every publish replaces the whole [`PublishedState`] at once.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use glucolink_core::{Clock, MeasurementEvent, PublishedState, SourceStatus};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const COMMAND_BUFFER: usize = 64;

/// Shortest accepted freshness window. A zero window would expire continuously.
const MIN_CUTOFF: Duration = Duration::from_secs(1);

/// Outcome of feeding the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Publish `value` stamped `timestamp` and rearm the staleness timer.
    Publish {
        value: f64,
        timestamp: DateTime<Utc>,
    },
    /// Leave the published state and the timer alone.
    Ignore,
}

/// Freshness policy: how old a reading may be and what replaces it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreshnessState {
    pub cutoff: Duration,
    pub placeholder: f64,
}

impl FreshnessState {
    pub fn new(cutoff: Duration, placeholder: f64) -> Self {
        Self {
            cutoff: cutoff.max(MIN_CUTOFF),
            placeholder,
        }
    }

    /// A reading younger than the cutoff is published as is. One at or past
    /// the cutoff is replaced by the placeholder stamped `now`.
    pub fn on_event(&self, event: &MeasurementEvent, now: DateTime<Utc>) -> Transition {
        match event {
            MeasurementEvent::Failed => Transition::Ignore,
            MeasurementEvent::Fresh(m) => {
                let age = now - m.measured_at;
                if age < self.cutoff_delta() {
                    Transition::Publish {
                        value: m.value,
                        timestamp: m.measured_at,
                    }
                } else {
                    self.on_expiry(now)
                }
            }
        }
    }

    /// The staleness timer fired.
    pub fn on_expiry(&self, now: DateTime<Utc>) -> Transition {
        Transition::Publish {
            value: self.placeholder,
            timestamp: now,
        }
    }

    fn cutoff_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.cutoff).unwrap_or(TimeDelta::MAX)
    }
}

#[derive(Debug)]
enum Command {
    Event(MeasurementEvent),
    SetCutoff(Duration),
    SetPlaceholder(f64),
    SetStatus(String),
}

/// Cloneable access to a running controller.
#[derive(Debug, Clone)]
pub struct FreshnessHandle {
    commands: mpsc::Sender<Command>,
    published: watch::Receiver<PublishedState>,
}

impl FreshnessHandle {
    /// Feeds a measurement event to the controller.
    pub async fn submit(&self, event: MeasurementEvent) {
        self.send(Command::Event(event)).await;
    }

    /// Changes the freshness window and restarts it from now.
    pub async fn set_cutoff(&self, cutoff: Duration) {
        self.send(Command::SetCutoff(cutoff)).await;
    }

    /// Changes the value used for future placeholder publishes.
    pub async fn set_placeholder(&self, placeholder: f64) {
        self.send(Command::SetPlaceholder(placeholder)).await;
    }

    /// Publishes a new status string, keeping value and timestamp.
    pub async fn set_status(&self, status: impl Into<String>) {
        self.send(Command::SetStatus(status.into())).await;
    }

    /// Snapshot of the published state.
    pub fn current(&self) -> PublishedState {
        self.published.borrow().clone()
    }

    /// Receiver notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<PublishedState> {
        self.published.clone()
    }

    async fn send(&self, command: Command) {
        if self.commands.send(command).await.is_err() {
            debug!("freshness controller stopped, command dropped");
        }
    }
}

/// Owns the controller task.
#[derive(Debug)]
pub struct FreshnessController {
    handle: FreshnessHandle,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl FreshnessController {
    /// Starts the controller with the placeholder published and the
    /// staleness timer armed.
    pub fn spawn(state: FreshnessState, clock: Arc<dyn Clock>) -> Self {
        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let initial = PublishedState {
            value: state.placeholder,
            timestamp: clock.now(),
            status: SourceStatus::NoSource.to_string(),
            sequence: 0,
        };
        let (publisher, published) = watch::channel(initial);
        let cancel = CancellationToken::new();

        let actor = Actor {
            state,
            clock,
            publisher,
        };
        let task = tokio::spawn(actor.run(receiver, cancel.clone()));

        Self {
            handle: FreshnessHandle {
                commands,
                published,
            },
            cancel,
            task,
        }
    }

    pub fn handle(&self) -> FreshnessHandle {
        self.handle.clone()
    }

    /// Stops the actor and waits for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            debug!(error = %e, "freshness controller task ended abnormally");
        }
    }
}

struct Actor {
    state: FreshnessState,
    clock: Arc<dyn Clock>,
    publisher: watch::Sender<PublishedState>,
}

impl Actor {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        let expiry = tokio::time::sleep(self.state.cutoff);
        tokio::pin!(expiry);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => {
                        if self.apply(command) {
                            expiry.as_mut().reset(Instant::now() + self.state.cutoff);
                        }
                    }
                    None => break,
                },
                () = &mut expiry => {
                    debug!(cutoff_secs = self.state.cutoff.as_secs(), "freshness window elapsed");
                    let transition = self.state.on_expiry(self.clock.now());
                    self.publish(transition);
                    expiry.as_mut().reset(Instant::now() + self.state.cutoff);
                }
            }
        }
        debug!("freshness controller stopped");
    }

    /// Applies one command. Returns true when the staleness timer must be rearmed.
    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Event(event) => {
                let transition = self.state.on_event(&event, self.clock.now());
                self.publish(transition)
            }
            Command::SetCutoff(cutoff) => {
                self.state.cutoff = cutoff.max(MIN_CUTOFF);
                info!(cutoff_secs = self.state.cutoff.as_secs(), "freshness cutoff changed");
                true
            }
            Command::SetPlaceholder(placeholder) => {
                self.state.placeholder = placeholder;
                false
            }
            Command::SetStatus(status) => {
                self.publisher.send_modify(|s| {
                    s.status = status;
                    s.sequence += 1;
                });
                false
            }
        }
    }

    fn publish(&self, transition: Transition) -> bool {
        match transition {
            Transition::Ignore => false,
            Transition::Publish { value, timestamp } => {
                self.publisher.send_modify(|s| {
                    s.value = value;
                    s.timestamp = timestamp;
                    s.sequence += 1;
                });
                debug!(value, timestamp = %timestamp, "glucose value published");
                true
            }
        }
    }
}
