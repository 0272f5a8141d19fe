// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP plumbing for the LibreLinkUp API.
//!
//! A [`RequestSnapshot`] is an immutable pairing of a configured
//! `reqwest::Client` (static and auth headers baked in) with the base URL of
//! one region. The session swaps in a new snapshot whenever the region or
//! the login changes; in-flight calls keep using the one they started with.

use std::time::Duration;

use glucolink_config::LluConfig;
use glucolink_core::GlucolinkError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::credentials::Credentials;
use crate::types::ApiEnvelope;

pub const LOGIN_PATH: &str = "/llu/auth/login";
pub const CONNECTIONS_PATH: &str = "/llu/connections";

/// Path of the latest-measurement endpoint for `patient_id`.
pub fn graph_path(patient_id: &str) -> String {
    format!("{CONNECTIONS_PATH}/{patient_id}/graph")
}

/// SHA-256 hex digest of the account's user id, as the API expects in `account-id`.
pub fn hash_account_id(user_id: &str) -> String {
    hex::encode(Sha256::digest(user_id.as_bytes()))
}

/// One API call, replayable after a region redirect.
#[derive(Debug, Clone)]
pub enum ApiRequest {
    Get { path: String },
    Post { path: String, body: serde_json::Value },
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        ApiRequest::Get { path: path.into() }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest::Post {
            path: path.into(),
            body,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ApiRequest::Get { path } | ApiRequest::Post { path, .. } => path,
        }
    }
}

/// Immutable request configuration for one region and login.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    client: reqwest::Client,
    base_url: String,
}

impl RequestSnapshot {
    /// Builds a client for `credentials.region`, adding auth headers when logged in.
    ///
    /// Stored auth values that are not valid header text are skipped with a
    /// warning; requests then fail upstream and the user has to log in again.
    pub fn build(config: &LluConfig, credentials: &Credentials) -> Result<Self, GlucolinkError> {
        let mut headers = HeaderMap::new();
        headers.insert("product", static_header("product", &config.product)?);
        headers.insert("version", static_header("version", &config.version)?);
        headers.insert(
            reqwest::header::USER_AGENT,
            static_header("user-agent", &config.user_agent)?,
        );
        headers.insert(
            reqwest::header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        );

        let token = credentials.token.expose_secret();
        if !token.is_empty() {
            insert_auth_header(
                &mut headers,
                reqwest::header::AUTHORIZATION,
                &format!("Bearer {token}"),
            );
        }
        if !credentials.account_hash.is_empty() {
            insert_auth_header(
                &mut headers,
                HeaderName::from_static("account-id"),
                &credentials.account_hash,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .gzip(true)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GlucolinkError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url(&credentials.region),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `request` once and decodes the envelope. No redirect handling.
    ///
    /// HTTP error statuses are not failures on their own; the API reports
    /// problems through the envelope's `status`, so any body that parses as
    /// an envelope is returned.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiEnvelope, GlucolinkError> {
        let url = format!("{}{}", self.base_url, request.path());
        let builder = match request {
            ApiRequest::Get { .. } => self.client.get(&url),
            ApiRequest::Post { body, .. } => self.client.post(&url).json(body),
        };

        let response = builder.send().await.map_err(|e| GlucolinkError::Transport {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(status = %status, path = request.path(), "LibreLinkUp response received");

        let body = response.text().await.map_err(|e| GlucolinkError::Transport {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        serde_json::from_str(&body).map_err(|e| {
            debug!(status = %status, body = %body, "unparseable LibreLinkUp response");
            GlucolinkError::Parse {
                message: format!("failed to parse API response (HTTP {status}): {e}"),
                source: Some(Box::new(e)),
            }
        })
    }
}

fn static_header(name: &str, value: &str) -> Result<HeaderValue, GlucolinkError> {
    HeaderValue::from_str(value)
        .map_err(|e| GlucolinkError::Config(format!("invalid {name} header value: {e}")))
}

fn insert_auth_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(mut v) => {
            v.set_sensitive(true);
            headers.insert(name, v);
        }
        Err(_) => warn!(header = %name, "stored credential is not a valid header value, skipping"),
    }
}
