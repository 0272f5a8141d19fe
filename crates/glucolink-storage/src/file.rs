// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory-backed settings store: one pretty-printed JSON file per group.

use std::io::Write;
use std::path::{Path, PathBuf};

use glucolink_core::{GlucolinkError, SettingsStore};
use tracing::{debug, warn};

/// Stores each settings group as `<dir>/<name>.json`.
///
/// Writes go through a temporary file in the same directory that is then
/// renamed over the target, so a crash mid-write leaves the old file intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Opens (and creates if needed) the settings directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, GlucolinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(GlucolinkError::storage)?;
        debug!(dir = %dir.display(), "settings store opened");
        Ok(Self { dir })
    }

    /// Directory holding the settings files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, GlucolinkError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(GlucolinkError::Config(format!(
                "invalid settings name `{name}`"
            )));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl SettingsStore for JsonFileStore {
    fn load_value(&self, name: &str) -> Result<Option<serde_json::Value>, GlucolinkError> {
        let path = self.path_for(name)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(GlucolinkError::storage(e)),
        };
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt settings file ignored");
                Ok(None)
            }
        }
    }

    fn save_value(&self, name: &str, value: serde_json::Value) -> Result<(), GlucolinkError> {
        let path = self.path_for(name)?;
        let body = serde_json::to_vec_pretty(&value).map_err(GlucolinkError::storage)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(GlucolinkError::storage)?;
        tmp.write_all(&body).map_err(GlucolinkError::storage)?;
        tmp.as_file().sync_all().map_err(GlucolinkError::storage)?;
        tmp.persist(&path)
            .map_err(|e| GlucolinkError::storage(e.error))?;

        debug!(settings = name, path = %path.display(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glucolink_core::SettingsStoreExt;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct General {
        #[serde(rename = "freshValueCutoff")]
        cutoff: u64,
    }

    #[test]
    fn save_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonFileStore::open(dir.path()).unwrap();
            store.save("GeneralSettings", &General { cutoff: 120 }).unwrap();
        }
        let store = JsonFileStore::open(dir.path()).unwrap();
        let loaded: General = store.load("GeneralSettings", || General { cutoff: 0 });
        assert_eq!(loaded, General { cutoff: 120 });
        assert!(dir.path().join("GeneralSettings.json").exists());
    }

    #[test]
    fn missing_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        let loaded: General = store.load("GeneralSettings", || General { cutoff: 300 });
        assert_eq!(loaded.cutoff, 300);
    }

    #[test]
    fn corrupt_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("GeneralSettings.json"), "{not json").unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(store.load_value("GeneralSettings").unwrap().is_none());
    }

    #[test]
    fn overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.save("GeneralSettings", &General { cutoff: 1 }).unwrap();
        store.save("GeneralSettings", &General { cutoff: 2 }).unwrap();
        let loaded: General = store.load("GeneralSettings", || General { cutoff: 0 });
        assert_eq!(loaded.cutoff, 2);
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(store.save_value("../escape", serde_json::json!({})).is_err());
        assert!(store.load_value("").is_err());
    }
}
