// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [`Clock`] driven by Tokio's timer.
//!
//! Under `#[tokio::test(start_paused = true)]` wall-clock readings advance
//! exactly with `tokio::time::advance` and auto-advance, so measurement ages
//! and staleness deadlines agree.

use chrono::{DateTime, TimeDelta, Utc};
use glucolink_core::Clock;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin_wall: DateTime<Utc>,
    origin: Instant,
}

impl TokioClock {
    /// A clock reading `start` right now.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            origin_wall: start,
            origin: Instant::now(),
        }
    }

    /// Wall time `secs` seconds after the clock's origin.
    pub fn at(&self, secs: i64) -> DateTime<Utc> {
        self.origin_wall + TimeDelta::seconds(secs)
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Instant::now().duration_since(self.origin);
        self.origin_wall + TimeDelta::from_std(elapsed).unwrap_or(TimeDelta::MAX)
    }
}
