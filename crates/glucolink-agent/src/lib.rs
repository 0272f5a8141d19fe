// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Acquisition and freshness engine for glucolink.
//!
//! - [`scheduler::PollScheduler`] drives a source's `fetch_latest` on an interval.
//! - [`freshness::FreshnessController`] turns measurement events into the
//!   single published value, expiring it to a placeholder when stale.
//! - [`GlucoseMonitor`] wires a registry-built source to both and persists
//!   the user-facing settings.

pub mod freshness;
pub mod monitor;
pub mod scheduler;
pub mod shutdown;

pub use freshness::{FreshnessController, FreshnessHandle, FreshnessState, Transition};
pub use monitor::{GENERAL_SETTINGS, GeneralSettings, GlucoseMonitor};
pub use scheduler::PollScheduler;
pub use shutdown::install_signal_handler;
