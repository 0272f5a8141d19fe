// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `glucolink serve` command implementation.
//!
//! Starts the monitor on the persisted settings and prints every published
//! value until SIGINT or SIGTERM, then shuts down so credentials and
//! settings are saved.

use glucolink_agent::install_signal_handler;
use glucolink_config::GlucolinkConfig;
use glucolink_core::{GlucolinkError, PublishedState};
use tracing::{info, warn};

use crate::commands::open_monitor;

/// Run the `glucolink serve` command.
pub async fn run_serve(config: GlucolinkConfig) -> Result<(), GlucolinkError> {
    info!("starting glucolink serve");

    let monitor = open_monitor(&config).await?;
    match monitor.active_source_id().await {
        Some(id) => info!(source = %id, "monitoring"),
        None => warn!("no source selected; run `glucolink source <id>` to choose one"),
    }

    let cancel = install_signal_handler();
    let mut updates = monitor.subscribe();
    let mut last = updates.borrow_and_update().clone();
    println!("{}", format_update(&last));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if state.value != last.value || state.timestamp != last.timestamp {
                    info!(value = state.value, timestamp = %state.timestamp, "value updated");
                }
                println!("{}", format_update(&state));
                last = state;
            }
        }
    }

    info!("shutting down");
    monitor.stop().await
}

fn format_update(state: &PublishedState) -> String {
    format!(
        "{}  {:>6}  {}",
        state.local_timestamp().format("%Y-%m-%d %H:%M:%S"),
        state.value,
        state.status
    )
}
