// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process settings store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use glucolink_core::{GlucolinkError, SettingsStore};

/// Settings kept in memory only; lost when dropped.
///
/// Used by tests and by hosts that persist settings themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every stored blob, sorted.
    pub fn names(&self) -> Result<Vec<String>, GlucolinkError> {
        let mut names: Vec<String> = self.lock()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, serde_json::Value>>, GlucolinkError> {
        self.blobs
            .lock()
            .map_err(|_| GlucolinkError::Internal("settings store lock poisoned".into()))
    }
}

impl SettingsStore for MemoryStore {
    fn load_value(&self, name: &str) -> Result<Option<serde_json::Value>, GlucolinkError> {
        Ok(self.lock()?.get(name).cloned())
    }

    fn save_value(&self, name: &str, value: serde_json::Value) -> Result<(), GlucolinkError> {
        self.lock()?.insert(name.to_string(), value);
        Ok(())
    }
}
