// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by sources, the freshness controller, and the host.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// A single glucose reading as reported by a source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// The reading.
    pub value: f64,
    /// When the sensor took the reading.
    pub measured_at: DateTime<Utc>,
}

/// The outcome of one poll cycle.
///
/// Sources never surface errors from a poll; every failure collapses into
/// [`MeasurementEvent::Failed`] so consumers have a single failure channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasurementEvent {
    /// A reading was retrieved.
    Fresh(Measurement),
    /// The fetch failed or was skipped; carries no reading.
    Failed,
}

impl MeasurementEvent {
    /// Shorthand for a fresh event.
    pub fn fresh(value: f64, measured_at: DateTime<Utc>) -> Self {
        MeasurementEvent::Fresh(Measurement { value, measured_at })
    }
}

/// A sub-account (patient) whose readings can be polled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableResource {
    /// Opaque identifier passed back when fetching readings.
    pub id: String,
    /// Given name as reported by the source.
    pub first_name: String,
    /// Family name as reported by the source.
    pub last_name: String,
}

impl SelectableResource {
    /// `"first last"`, used as the stored display name.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Human-readable status of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// No source has been configured yet.
    NoSource,
    /// The source has no token.
    NotLoggedIn,
    /// A token is held but no patient has been chosen.
    LoggedInNoSelection,
    /// Readings are polled for the named patient.
    Active {
        /// Display name of the selected patient.
        name: String,
    },
}

impl std::fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceStatus::NoSource => write!(f, "no source selected"),
            SourceStatus::NotLoggedIn => write!(f, "not logged in"),
            SourceStatus::LoggedInNoSelection => write!(f, "logged in, no resource selected"),
            SourceStatus::Active { name } => write!(f, "logged in, active: {name}"),
        }
    }
}

/// The value a host observes.
///
/// Replaced as a whole on every publish, so `value`, `timestamp` and
/// `status` are always mutually consistent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedState {
    /// A real reading, or the configured placeholder.
    pub value: f64,
    /// When `value` was measured, or when the placeholder was substituted.
    pub timestamp: DateTime<Utc>,
    /// Status string of the active source.
    pub status: String,
    /// Incremented on every publish, including status-only updates.
    pub sequence: u64,
}

impl PublishedState {
    /// The timestamp in the host's local time zone.
    pub fn local_timestamp(&self) -> DateTime<Local> {
        self.timestamp.with_timezone(&Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_strings() {
        assert_eq!(SourceStatus::NoSource.to_string(), "no source selected");
        assert_eq!(SourceStatus::NotLoggedIn.to_string(), "not logged in");
        assert_eq!(
            SourceStatus::LoggedInNoSelection.to_string(),
            "logged in, no resource selected"
        );
        assert_eq!(
            SourceStatus::Active {
                name: "Jane Doe".into()
            }
            .to_string(),
            "logged in, active: Jane Doe"
        );
    }

    #[test]
    fn display_name_joins_first_and_last() {
        let r = SelectableResource {
            id: "p-1".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
        };
        assert_eq!(r.display_name(), "Jane Doe");
    }

    #[test]
    fn local_timestamp_is_same_instant() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let state = PublishedState {
            value: 5.4,
            timestamp: ts,
            status: String::new(),
            sequence: 0,
        };
        assert_eq!(state.local_timestamp().with_timezone(&Utc), ts);
    }
}
