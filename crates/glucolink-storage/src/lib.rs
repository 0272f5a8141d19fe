// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings persistence for glucolink.
//!
//! Provides the [`SettingsStore`](glucolink_core::SettingsStore)
//! implementations used by the host and the reversible obfuscation applied
//! to stored credentials.

pub mod file;
pub mod memory;
pub mod obfuscation;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use obfuscation::{obfuscate_i64, obfuscate_str};
