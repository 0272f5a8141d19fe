// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LibreLinkUp measurement source for glucolink.
//!
//! [`LibreLinkUpSession`] implements
//! [`MeasurementSource`](glucolink_core::MeasurementSource) against the
//! LibreLinkUp follower API: login, patient discovery, region redirects,
//! and fetching the latest glucose reading.

pub mod client;
pub mod credentials;
pub mod session;
pub mod types;

pub use credentials::{Credentials, SETTINGS_NAME, StoredCredentials};
pub use session::LibreLinkUpSession;

/// Registry id of this source.
pub const SOURCE_ID: &str = "llu";

/// Human-readable name of this source.
pub const SOURCE_NAME: &str = "Libre Link Up";
