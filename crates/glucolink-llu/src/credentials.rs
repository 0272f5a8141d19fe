// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session credentials and their persisted form.
//!
//! The persisted form uses one-letter keys and XOR-obfuscated values (see
//! [`glucolink_storage::obfuscation`]). That keeps the email and password
//! out of plain sight in the settings file but is **not** encryption.

use chrono::{DateTime, TimeDelta, Utc};
use glucolink_core::SourceStatus;
use glucolink_storage::{obfuscate_i64, obfuscate_str};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Settings group the credentials are stored under.
pub const SETTINGS_NAME: &str = "LLUSettings";

/// Poll interval used when none (or a non-positive one) is stored.
pub const DEFAULT_INTERVAL_SECS: i64 = 60;

/// On-disk shape. Every field except `interval` is obfuscated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(rename = "e", default)]
    pub email: String,
    #[serde(rename = "p", default)]
    pub password: String,
    #[serde(rename = "u", default)]
    pub account_hash: String,
    #[serde(rename = "t", default)]
    pub token: String,
    #[serde(rename = "pi", default)]
    pub patient_id: String,
    #[serde(rename = "pn", default)]
    pub patient_name: String,
    #[serde(rename = "r", default)]
    pub region: String,
    #[serde(rename = "te", default, skip_serializing_if = "Option::is_none")]
    pub token_expires: Option<i64>,
    #[serde(default)]
    pub interval: i64,
}

/// Decoded session credentials.
///
/// Either the token is empty (logged out, no account hash, no patient) or
/// it is set and the account hash came from the same login.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
    /// SHA-256 hex of the account's user id. The raw id is never kept.
    pub account_hash: String,
    pub token: SecretString,
    pub token_expires: i64,
    pub patient_id: String,
    pub patient_name: String,
    pub region: String,
    pub interval_secs: i64,
}

impl Credentials {
    /// Logged-out credentials pointing at `default_region`.
    pub fn empty(default_region: &str) -> Self {
        Self {
            email: String::new(),
            password: SecretString::from(String::new()),
            account_hash: String::new(),
            token: SecretString::from(String::new()),
            token_expires: 0,
            patient_id: String::new(),
            patient_name: String::new(),
            region: default_region.to_string(),
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }

    /// Decodes the stored form, normalizing the interval and region.
    pub fn decode(stored: &StoredCredentials, default_region: &str) -> Self {
        let region = obfuscate_str(&stored.region);
        Self {
            email: obfuscate_str(&stored.email),
            password: SecretString::from(obfuscate_str(&stored.password)),
            account_hash: obfuscate_str(&stored.account_hash),
            token: SecretString::from(obfuscate_str(&stored.token)),
            token_expires: stored.token_expires.map(obfuscate_i64).unwrap_or(0),
            patient_id: obfuscate_str(&stored.patient_id),
            patient_name: obfuscate_str(&stored.patient_name),
            region: if region.is_empty() {
                default_region.to_string()
            } else {
                region
            },
            interval_secs: if stored.interval <= 0 {
                DEFAULT_INTERVAL_SECS
            } else {
                stored.interval
            },
        }
    }

    /// Encodes for persistence.
    pub fn encode(&self) -> StoredCredentials {
        StoredCredentials {
            email: obfuscate_str(&self.email),
            password: obfuscate_str(self.password.expose_secret()),
            account_hash: obfuscate_str(&self.account_hash),
            token: obfuscate_str(self.token.expose_secret()),
            patient_id: obfuscate_str(&self.patient_id),
            patient_name: obfuscate_str(&self.patient_name),
            region: obfuscate_str(&self.region),
            token_expires: Some(obfuscate_i64(self.token_expires)),
            interval: self.interval_secs,
        }
    }

    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().is_empty()
    }

    /// Token and account hash are both present.
    pub fn is_authenticated(&self) -> bool {
        self.has_token() && !self.account_hash.is_empty()
    }

    /// Status implied by which credentials are present.
    pub fn status(&self) -> SourceStatus {
        if !self.has_token() {
            SourceStatus::NotLoggedIn
        } else if self.patient_id.is_empty() {
            SourceStatus::LoggedInNoSelection
        } else {
            SourceStatus::Active {
                name: self.patient_name.clone(),
            }
        }
    }

    /// True when the token expires within `threshold` of `now`.
    pub fn token_expires_within(&self, now: DateTime<Utc>, threshold: TimeDelta) -> bool {
        match DateTime::from_timestamp(self.token_expires, 0) {
            Some(expires) => expires - now < threshold,
            None => true,
        }
    }

    /// Replaces the stored login and clears the patient selection.
    pub fn apply_login(
        &mut self,
        email: &str,
        password: &SecretString,
        account_hash: String,
        token: String,
        token_expires: i64,
    ) {
        self.email = email.to_string();
        self.password = SecretString::from(password.expose_secret().to_string());
        self.account_hash = account_hash;
        self.token = SecretString::from(token);
        self.token_expires = token_expires;
        self.patient_id.clear();
        self.patient_name.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn logged_in() -> Credentials {
        let mut c = Credentials::empty("eu");
        c.apply_login(
            "user@example.com",
            &SecretString::from("hunter2".to_string()),
            "ab12".into(),
            "tok".into(),
            1_780_000_000,
        );
        c
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut c = logged_in();
        c.patient_id = "p-1".into();
        c.patient_name = "Jane Doe".into();
        c.region = "us".into();
        c.interval_secs = 90;

        let stored = c.encode();
        assert_ne!(stored.email, "user@example.com");
        assert_eq!(stored.interval, 90);

        let back = Credentials::decode(&stored, "eu");
        assert_eq!(back.email, "user@example.com");
        assert_eq!(back.password.expose_secret(), "hunter2");
        assert_eq!(back.account_hash, "ab12");
        assert_eq!(back.token.expose_secret(), "tok");
        assert_eq!(back.token_expires, 1_780_000_000);
        assert_eq!(back.patient_id, "p-1");
        assert_eq!(back.patient_name, "Jane Doe");
        assert_eq!(back.region, "us");
        assert_eq!(back.interval_secs, 90);
    }

    #[test]
    fn empty_values_round_trip() {
        let mut c = Credentials::empty("");
        c.interval_secs = 60;
        let back = Credentials::decode(&c.encode(), "");
        assert!(back.email.is_empty());
        assert!(!back.has_token());
        assert_eq!(back.token_expires, 0);
    }

    #[test]
    fn missing_blob_decodes_to_logged_out_defaults() {
        let c = Credentials::decode(&StoredCredentials::default(), "eu");
        assert_eq!(c.region, "eu");
        assert_eq!(c.interval_secs, DEFAULT_INTERVAL_SECS);
        assert_eq!(c.token_expires, 0);
        assert_eq!(c.status(), SourceStatus::NotLoggedIn);
    }

    #[test]
    fn non_positive_interval_defaults_to_sixty() {
        let stored = StoredCredentials {
            interval: -5,
            ..Default::default()
        };
        assert_eq!(Credentials::decode(&stored, "eu").interval_secs, 60);
    }

    #[test]
    fn stored_form_uses_terse_keys() {
        let json = serde_json::to_value(logged_in().encode()).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["e", "p", "u", "t", "pi", "pn", "r", "te", "interval"] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert!(!json.to_string().contains("hunter2"));
    }

    #[test]
    fn status_follows_credential_completeness() {
        assert_eq!(Credentials::empty("eu").status(), SourceStatus::NotLoggedIn);
        let mut c = logged_in();
        assert_eq!(c.status(), SourceStatus::LoggedInNoSelection);
        c.patient_id = "p-1".into();
        c.patient_name = "Jane Doe".into();
        assert_eq!(
            c.status(),
            SourceStatus::Active {
                name: "Jane Doe".into()
            }
        );
    }

    #[test]
    fn login_clears_previous_selection() {
        let mut c = logged_in();
        c.patient_id = "p-1".into();
        c.apply_login(
            "other@example.com",
            &SecretString::from("pw".to_string()),
            "cd34".into(),
            "tok2".into(),
            0,
        );
        assert!(c.patient_id.is_empty());
        assert!(c.patient_name.is_empty());
    }

    #[test]
    fn expiry_threshold() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut c = logged_in();
        c.token_expires = (now + TimeDelta::days(3)).timestamp();
        assert!(c.token_expires_within(now, TimeDelta::days(7)));
        c.token_expires = (now + TimeDelta::days(30)).timestamp();
        assert!(!c.token_expires_within(now, TimeDelta::days(7)));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", logged_in());
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("\"tok\""));
    }
}
