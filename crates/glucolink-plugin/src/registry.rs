// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered registry of measurement source factories.
//!
//! Entries keep their registration order for listing and are also indexed
//! by id for direct lookup.

use std::collections::HashMap;
use std::sync::Arc;

use glucolink_config::LluConfig;
use glucolink_core::{Clock, GlucolinkError, MeasurementSource, SettingsStore};
use tracing::debug;

/// Everything a factory may need to build a source.
#[derive(Clone)]
pub struct SourceContext {
    pub store: Arc<dyn SettingsStore>,
    pub llu: LluConfig,
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SourceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceContext")
            .field("llu", &self.llu)
            .finish_non_exhaustive()
    }
}

/// Builds a concrete measurement source.
pub trait SourceFactory: Send + Sync {
    fn create(&self, ctx: SourceContext) -> Result<Arc<dyn MeasurementSource>, GlucolinkError>;
}

/// A registered source.
pub struct SourceEntry {
    pub id: String,
    pub display_name: String,
    pub factory: Box<dyn SourceFactory>,
}

impl std::fmt::Debug for SourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEntry")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: Vec<SourceEntry>,
    index: HashMap<String, usize>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source. Re-registering an id replaces its name and
    /// factory but keeps its position.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        display_name: impl Into<String>,
        factory: Box<dyn SourceFactory>,
    ) {
        let entry = SourceEntry {
            id: id.into(),
            display_name: display_name.into(),
            factory,
        };
        match self.index.get(&entry.id) {
            Some(&pos) => {
                debug!(source = %entry.id, "replacing registered source");
                self.entries[pos] = entry;
            }
            None => {
                self.index.insert(entry.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&SourceEntry> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    /// All entries in registration order.
    pub fn list(&self) -> &[SourceEntry] {
        &self.entries
    }

    /// Builds the source registered under `id`.
    pub fn create(
        &self,
        id: &str,
        ctx: SourceContext,
    ) -> Result<Arc<dyn MeasurementSource>, GlucolinkError> {
        let entry = self.get(id).ok_or_else(|| GlucolinkError::SourceNotFound {
            id: id.to_string(),
        })?;
        debug!(source = %entry.id, "creating measurement source");
        entry.factory.create(ctx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glucolink_core::SystemClock;
    use glucolink_storage::MemoryStore;
    use glucolink_test_utils::MockSource;

    struct MockFactory(&'static str);

    impl SourceFactory for MockFactory {
        fn create(&self, _ctx: SourceContext) -> Result<Arc<dyn MeasurementSource>, GlucolinkError> {
            Ok(Arc::new(MockSource::new(self.0)))
        }
    }

    fn ctx() -> SourceContext {
        SourceContext {
            store: Arc::new(MemoryStore::new()),
            llu: LluConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    #[test]
    fn keeps_registration_order() {
        let mut registry = SourceRegistry::new();
        registry.register("zeta", "Zeta", Box::new(MockFactory("zeta")));
        registry.register("alpha", "Alpha", Box::new(MockFactory("alpha")));
        let ids: Vec<&str> = registry.list().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_id_replaces_in_place() {
        let mut registry = SourceRegistry::new();
        registry.register("a", "First", Box::new(MockFactory("a")));
        registry.register("b", "B", Box::new(MockFactory("b")));
        registry.register("a", "Second", Box::new(MockFactory("a2")));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list()[0].display_name, "Second");
        assert_eq!(registry.get("a").unwrap().display_name, "Second");
    }

    #[tokio::test]
    async fn create_uses_the_registered_factory() {
        let mut registry = SourceRegistry::new();
        registry.register("mock", "Mock", Box::new(MockFactory("mock")));
        let source = registry.create("mock", ctx()).unwrap();
        assert_eq!(source.id(), "mock");
    }

    #[test]
    fn unknown_id_is_source_not_found() {
        let registry = SourceRegistry::new();
        assert!(registry.is_empty());
        let err = registry.create("nope", ctx()).err().unwrap();
        assert!(matches!(err, GlucolinkError::SourceNotFound { id } if id == "nope"));
    }
}
