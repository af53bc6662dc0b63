//! Domain types for the metric store.
//!
//! A [`Metric`] is a single recorded event. All types serialize to the
//! JSON shape served by the API: `{id, type, value, timestamp, data}`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Opaque unique identifier assigned by the store.
pub type MetricId = String;

/// Ad hoc payload attached to a metric.
pub type MetricData = BTreeMap<String, DataValue>;

/// A scalar payload value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DataValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Bool(b) => write!(f, "{b}"),
            DataValue::Number(n) => write!(f, "{n}"),
            DataValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Text(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Text(s)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Bool(b)
    }
}

impl From<i64> for DataValue {
    fn from(n: i64) -> Self {
        DataValue::Number(n.into())
    }
}

// ── Metric ─────────────────────────────────────────────────────────

/// A persisted metric record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    pub id: MetricId,
    /// Event classification, e.g. "traffic" or "page_view".
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    /// Creation time, the sole sort key.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: MetricData,
}

/// Input for [`MetricStore::insert`](crate::MetricStore::insert).
#[derive(Debug, Clone, PartialEq)]
pub struct NewMetric {
    pub kind: String,
    pub value: f64,
    /// Assigned by the store when absent.
    pub timestamp: Option<DateTime<Utc>>,
    pub data: MetricData,
}

impl NewMetric {
    /// Build a validated new metric with an empty payload.
    pub fn new(kind: impl Into<String>, value: f64) -> StoreResult<Self> {
        let metric = Self {
            kind: kind.into(),
            value,
            timestamp: None,
            data: MetricData::new(),
        };
        metric.validate()?;
        Ok(metric)
    }

    pub fn with_data(mut self, data: MetricData) -> Self {
        self.data = data;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// `type` must be non-empty and `value` must be a finite number.
    pub fn validate(&self) -> StoreResult<()> {
        if self.kind.is_empty() {
            return Err(StoreError::Validation("type is required".to_string()));
        }
        if !self.value.is_finite() {
            return Err(StoreError::Validation(
                "value must be a finite number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generate a 24-hex-character id: creation seconds (4 bytes, big-endian)
/// followed by 8 random bytes.
pub fn generate_id(timestamp: &DateTime<Utc>) -> MetricId {
    let secs = timestamp.timestamp().clamp(0, u32::MAX as i64) as u32;
    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&secs.to_be_bytes());
    rand::thread_rng().fill(&mut bytes[4..]);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_metric_rejects_empty_type() {
        let err = NewMetric::new("", 1.0).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn new_metric_rejects_non_finite_value() {
        assert!(NewMetric::new("traffic", f64::NAN).is_err());
        assert!(NewMetric::new("traffic", f64::INFINITY).is_err());
    }

    #[test]
    fn new_metric_accepts_any_type_string() {
        let m = NewMetric::new("anything goes", -12.5).unwrap();
        assert_eq!(m.kind, "anything goes");
        assert!(m.timestamp.is_none());
        assert!(m.data.is_empty());
    }

    #[test]
    fn generated_ids_are_hex_and_distinct() {
        let now = Utc::now();
        let a = generate_id(&now);
        let b = generate_id(&now);
        assert_eq!(a.len(), 24);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        // Same second, same prefix.
        assert_eq!(a[..8], b[..8]);
    }

    #[test]
    fn metric_serializes_type_field() {
        let mut data = MetricData::new();
        data.insert("path".to_string(), "/".into());
        data.insert("count".to_string(), 3i64.into());
        let metric = Metric {
            id: "abc".to_string(),
            kind: "page_view".to_string(),
            value: 1.0,
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            data,
        };

        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(json["type"], "page_view");
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20Z");
        assert_eq!(json["data"]["path"], "/");
        assert_eq!(json["data"]["count"], 3);

        let back: Metric = serde_json::from_value(json).unwrap();
        assert_eq!(back, metric);
    }

    #[test]
    fn data_value_display() {
        assert_eq!(DataValue::from("BUTTON").to_string(), "BUTTON");
        assert_eq!(DataValue::from(true).to_string(), "true");
        assert_eq!(DataValue::from(42i64).to_string(), "42");
    }

    #[test]
    fn data_value_rejects_non_scalars() {
        assert!(serde_json::from_str::<DataValue>("[1, 2]").is_err());
        assert!(serde_json::from_str::<DataValue>(r#"{"a": 1}"#).is_err());
        assert!(serde_json::from_str::<DataValue>("null").is_err());
    }
}
