// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for glucolink integration tests.
//!
//! # Components
//!
//! - [`MockSource`] - Scripted measurement source that records calls
//! - [`TokioClock`] - Wall clock that follows Tokio's (possibly paused) time

pub mod clock;
pub mod mock_source;

pub use clock::TokioClock;
pub use mock_source::MockSource;
