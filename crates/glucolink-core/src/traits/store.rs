// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named settings persistence.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::GlucolinkError;

/// Key-value store of named settings blobs.
///
/// Implementations work with raw JSON values so the trait stays object-safe;
/// [`SettingsStoreExt`] layers typed access on top.
pub trait SettingsStore: Send + Sync + 'static {
    /// Returns the blob stored under `name`, if any.
    fn load_value(&self, name: &str) -> Result<Option<serde_json::Value>, GlucolinkError>;

    /// Stores `value` under `name`, replacing any previous blob.
    fn save_value(&self, name: &str, value: serde_json::Value) -> Result<(), GlucolinkError>;
}

/// Typed helpers over any [`SettingsStore`].
pub trait SettingsStoreExt {
    /// Loads `name`, falling back to `default` when missing or unreadable.
    fn load<T, F>(&self, name: &str, default: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T;

    /// Serializes and stores `value` under `name`.
    fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), GlucolinkError>;
}

impl<S: SettingsStore + ?Sized> SettingsStoreExt for S {
    fn load<T, F>(&self, name: &str, default: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.load_value(name) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(settings = name, error = %e, "stored settings have unexpected shape, using defaults");
                    default()
                }
            },
            Ok(None) => default(),
            Err(e) => {
                warn!(settings = name, error = %e, "failed to read settings, using defaults");
                default()
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), GlucolinkError> {
        let value = serde_json::to_value(value).map_err(GlucolinkError::storage)?;
        self.save_value(name, value)
    }
}
