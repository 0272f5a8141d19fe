// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in measurement sources.

use std::sync::Arc;

use glucolink_core::{GlucolinkError, MeasurementSource};
use glucolink_llu::LibreLinkUpSession;

use crate::registry::{SourceContext, SourceFactory, SourceRegistry};

/// Creates [`LibreLinkUpSession`]s.
#[derive(Debug, Default)]
pub struct LluFactory;

impl SourceFactory for LluFactory {
    fn create(&self, ctx: SourceContext) -> Result<Arc<dyn MeasurementSource>, GlucolinkError> {
        let session = LibreLinkUpSession::start(ctx.store, ctx.llu, ctx.clock)?;
        Ok(session)
    }
}

/// Registry holding every source compiled into glucolink.
pub fn builtin_registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register(
        glucolink_llu::SOURCE_ID,
        glucolink_llu::SOURCE_NAME,
        Box::new(LluFactory),
    );
    registry
}
