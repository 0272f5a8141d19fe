// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the LibreLinkUp API.
//!
//! Every response shares the [`ApiEnvelope`] shape. `status != 0` signals an
//! application failure even on HTTP 200.

use chrono::{DateTime, NaiveDateTime, Utc};
use glucolink_core::{GlucolinkError, SelectableResource};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Format of `FactoryTimestamp`, e.g. `1/5/2026 3:04:05 PM`.
const FACTORY_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiEnvelope {
    /// Region the server wants us to use, when the response is a redirect.
    ///
    /// A missing or `false` `data.redirect` means "not a redirect".
    pub fn redirect_region(&self) -> Result<Option<String>, GlucolinkError> {
        let redirect = self
            .data
            .get("redirect")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        if !redirect {
            return Ok(None);
        }
        match self.data.get("region").and_then(serde_json::Value::as_str) {
            Some(region) if !region.is_empty() => Ok(Some(region.to_string())),
            _ => Err(GlucolinkError::Parse {
                message: "redirect response without a region".into(),
                source: None,
            }),
        }
    }

    /// Server-provided error message, or a generic one naming the status.
    pub fn error_message(&self) -> String {
        self.error
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| format!("API returned status {}", self.status))
    }

    /// Deserializes `data` into `T`.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, GlucolinkError> {
        T::deserialize(&self.data).map_err(|e| GlucolinkError::Parse {
            message: format!("unexpected response data: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

/// `data` of a successful login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: LoginUser,
    pub auth_ticket: AuthTicket,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthTicket {
    pub token: String,
    /// Expiry as epoch seconds.
    pub expires: i64,
}

/// One entry of `GET /llu/connections`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub patient_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl From<Patient> for SelectableResource {
    fn from(p: Patient) -> Self {
        SelectableResource {
            id: p.patient_id,
            first_name: p.first_name,
            last_name: p.last_name,
        }
    }
}

/// `data` of `GET /llu/connections/{id}/graph`, reduced to the latest reading.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphData {
    pub connection: Connection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub glucose_measurement: GlucoseMeasurement,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlucoseMeasurement {
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "FactoryTimestamp")]
    pub factory_timestamp: String,
}

impl GlucoseMeasurement {
    /// The reading's timestamp. The API sends it without a zone; it is UTC.
    pub fn measured_at(&self) -> Result<DateTime<Utc>, GlucolinkError> {
        parse_factory_timestamp(&self.factory_timestamp)
    }
}

/// Parses a `FactoryTimestamp` string as UTC.
pub fn parse_factory_timestamp(s: &str) -> Result<DateTime<Utc>, GlucolinkError> {
    NaiveDateTime::parse_from_str(s.trim(), FACTORY_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| GlucolinkError::Parse {
            message: format!("invalid measurement timestamp `{s}`: {e}"),
            source: Some(Box::new(e)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn envelope(json: serde_json::Value) -> ApiEnvelope {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn parses_pm_timestamp_without_padding() {
        let at = parse_factory_timestamp("1/5/2026 3:04:05 PM").unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 1, 5, 15, 4, 5).unwrap());
    }

    #[test]
    fn parses_midnight_and_noon() {
        assert_eq!(
            parse_factory_timestamp("12/31/2025 12:00:00 AM").unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_factory_timestamp("12/31/2025 12:30:00 PM").unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 31, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(parse_factory_timestamp("2026-01-05T15:04:05Z").is_err());
        assert!(parse_factory_timestamp("").is_err());
    }

    #[test]
    fn redirect_detection() {
        let redirect = envelope(serde_json::json!({
            "status": 0,
            "data": {"redirect": true, "region": "us"}
        }));
        assert_eq!(redirect.redirect_region().unwrap(), Some("us".to_string()));

        let explicit_false = envelope(serde_json::json!({
            "status": 0,
            "data": {"redirect": false, "region": "us"}
        }));
        assert_eq!(explicit_false.redirect_region().unwrap(), None);

        let list = envelope(serde_json::json!({"status": 0, "data": []}));
        assert_eq!(list.redirect_region().unwrap(), None);

        let broken = envelope(serde_json::json!({"status": 0, "data": {"redirect": true}}));
        assert!(broken.redirect_region().is_err());
    }

    #[test]
    fn error_message_prefers_server_text() {
        let rejected = envelope(serde_json::json!({
            "status": 2,
            "error": {"message": "incorrect username/password"}
        }));
        assert_eq!(rejected.error_message(), "incorrect username/password");

        let bare = envelope(serde_json::json!({"status": 4}));
        assert_eq!(bare.error_message(), "API returned status 4");
    }

    #[test]
    fn graph_data_reads_latest_measurement() {
        let env = envelope(serde_json::json!({
            "status": 0,
            "data": {
                "connection": {
                    "glucoseMeasurement": {
                        "Value": 104,
                        "FactoryTimestamp": "3/1/2026 9:15:00 AM",
                        "TrendArrow": 3
                    }
                },
                "graphData": []
            }
        }));
        let graph: GraphData = env.parse_data().unwrap();
        let m = graph.connection.glucose_measurement;
        assert_eq!(m.value, 104.0);
        assert_eq!(
            m.measured_at().unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 15, 0).unwrap()
        );
    }

    #[test]
    fn patient_converts_to_resource() {
        let p: Patient = serde_json::from_value(serde_json::json!({
            "patientId": "p-1",
            "firstName": "Ada",
            "lastName": "Lovelace"
        }))
        .unwrap();
        let r = SelectableResource::from(p);
        assert_eq!(r.id, "p-1");
        assert_eq!(r.display_name(), "Ada Lovelace");
    }
}
