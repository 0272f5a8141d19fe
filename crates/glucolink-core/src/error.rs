// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for glucolink.

use thiserror::Error;

/// The primary error type used across all glucolink crates.
#[derive(Debug, Error)]
pub enum GlucolinkError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Settings persistence errors (file I/O, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Network-level failure talking to the remote API.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote API answered with a non-zero application status.
    #[error("API returned status {status}: {message}")]
    Api { status: i64, message: String },

    /// The remote API refused the supplied credentials.
    #[error("login rejected: {0}")]
    LoginRejected(String),

    /// A response body could not be interpreted.
    #[error("parse error: {message}")]
    Parse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote API kept redirecting between regions.
    #[error("gave up after {limit} region redirects")]
    TooManyRedirects { limit: u32 },

    /// The operation needs a logged-in session.
    #[error("not logged in")]
    NotLoggedIn,

    /// Requested source id is not in the registry.
    #[error("source not found: {id}")]
    SourceNotFound { id: String },

    /// The operation needs an active source but none is selected.
    #[error("no active source")]
    NoActiveSource,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GlucolinkError {
    /// Wraps any error as a storage error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        GlucolinkError::Storage {
            source: Box::new(err),
        }
    }
}
