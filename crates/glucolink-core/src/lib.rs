// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for glucolink.
//!
//! Defines the contract shared by every crate in the workspace: the error
//! type, measurement and published-state types, and the traits for
//! measurement sources, settings persistence, and time.

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use error::GlucolinkError;
pub use traits::{MeasurementSource, SettingsStore, SettingsStoreExt};
pub use types::{Measurement, MeasurementEvent, PublishedState, SelectableResource, SourceStatus};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use serde::{Deserialize, Serialize};

    #[derive(Default)]
    struct MapStore {
        inner: Mutex<HashMap<String, serde_json::Value>>,
        fail_reads: bool,
    }

    impl SettingsStore for MapStore {
        fn load_value(&self, name: &str) -> Result<Option<serde_json::Value>, GlucolinkError> {
            if self.fail_reads {
                return Err(GlucolinkError::Internal("read failed".into()));
            }
            Ok(self.inner.lock().unwrap().get(name).cloned())
        }

        fn save_value(&self, name: &str, value: serde_json::Value) -> Result<(), GlucolinkError> {
            self.inner.lock().unwrap().insert(name.to_string(), value);
            Ok(())
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        cutoff: u64,
        label: String,
    }

    #[test]
    fn error_variants_render() {
        let errors = [
            GlucolinkError::Config("bad".into()),
            GlucolinkError::storage(std::io::Error::other("disk")),
            GlucolinkError::Transport {
                message: "refused".into(),
                source: None,
            },
            GlucolinkError::Api {
                status: 2,
                message: "nope".into(),
            },
            GlucolinkError::LoginRejected("wrong password".into()),
            GlucolinkError::TooManyRedirects { limit: 5 },
            GlucolinkError::NotLoggedIn,
            GlucolinkError::SourceNotFound { id: "x".into() },
            GlucolinkError::NoActiveSource,
        ];
        for e in &errors {
            assert!(!e.to_string().is_empty());
        }
        assert_eq!(
            GlucolinkError::LoginRejected("wrong password".into()).to_string(),
            "login rejected: wrong password"
        );
    }

    #[test]
    fn typed_load_falls_back_to_default_when_missing() {
        let store = MapStore::default();
        let loaded: Sample = store.load("GeneralSettings", || Sample {
            cutoff: 300,
            label: "default".into(),
        });
        assert_eq!(loaded.cutoff, 300);
    }

    #[test]
    fn typed_save_then_load() {
        let store = MapStore::default();
        let sample = Sample {
            cutoff: 120,
            label: "saved".into(),
        };
        store.save("GeneralSettings", &sample).unwrap();
        let loaded: Sample = store.load("GeneralSettings", || Sample {
            cutoff: 0,
            label: String::new(),
        });
        assert_eq!(loaded, sample);
    }

    #[test]
    fn typed_load_survives_wrong_shape_and_read_errors() {
        let store = MapStore::default();
        store
            .save_value("GeneralSettings", serde_json::json!([1, 2, 3]))
            .unwrap();
        let loaded: Sample = store.load("GeneralSettings", || Sample {
            cutoff: 7,
            label: String::new(),
        });
        assert_eq!(loaded.cutoff, 7);

        let failing = MapStore {
            fail_reads: true,
            ..Default::default()
        };
        let loaded: Sample = failing.load("GeneralSettings", || Sample {
            cutoff: 9,
            label: String::new(),
        });
        assert_eq!(loaded.cutoff, 9);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_source<T: MeasurementSource>() {}
        fn _assert_store<T: SettingsStore>() {}
        fn _assert_clock<T: Clock>() {}
        _assert_clock::<SystemClock>();
    }
}
