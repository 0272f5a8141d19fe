// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Measurement source registry and built-in catalog.
//!
//! Backends are compiled in and listed explicitly. Adding one means
//! implementing [`MeasurementSource`](glucolink_core::MeasurementSource),
//! writing a [`SourceFactory`], and registering it in
//! [`builtin_registry`].

pub mod catalog;
pub mod registry;

pub use catalog::{LluFactory, builtin_registry};
pub use registry::{SourceContext, SourceEntry, SourceFactory, SourceRegistry};
