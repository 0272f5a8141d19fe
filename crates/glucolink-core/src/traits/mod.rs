// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seams between sources, storage, and the host.

pub mod source;
pub mod store;

pub use source::MeasurementSource;
pub use store::{SettingsStore, SettingsStoreExt};
