//! Core data models: the sample envelope accepted on save and the
//! aggregated training set returned on load.

use chrono::Local;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};
use crate::naming::validate_component;

/// Label used when a sample arrives without a `gesture` field.
pub const DEFAULT_GESTURE: &str = "unknown";

/// A sample as received from the client, with defaults filled in.
///
/// `document` is the original JSON object and is what gets written to
/// disk; `gesture` and `timestamp` are only used to place the file.
#[derive(Debug, Clone)]
pub struct SampleEnvelope {
    pub gesture: String,
    pub timestamp: String,
    pub landmarks: Option<Value>,
    pub document: Map<String, Value>,
}

impl SampleEnvelope {
    /// Parse a raw request body.
    pub fn from_slice(body: &[u8]) -> StoreResult<Self> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> StoreResult<Self> {
        let document = match value {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::InvalidSample(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let gesture = string_field(&document, "gesture")?
            .unwrap_or_else(|| DEFAULT_GESTURE.to_string());
        let timestamp = string_field(&document, "timestamp")?.unwrap_or_else(now_timestamp);

        validate_component("gesture", &gesture)?;
        validate_component("timestamp", &timestamp)?;

        Ok(Self {
            gesture,
            timestamp,
            landmarks: document.get("landmarks").cloned(),
            document,
        })
    }
}

fn string_field(document: &Map<String, Value>, key: &str) -> StoreResult<Option<String>> {
    match document.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(StoreError::InvalidSample(format!(
            "{} must be a string, got {}",
            key,
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Current local time in ISO-8601 with microseconds and no offset.
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Gesture label to landmark payloads, ordered by sample file name.
pub type TrainingSet = BTreeMap<String, Vec<Value>>;

/// A sample file that was left out of a [`LoadReport`].
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of scanning the training-data root.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub training_set: TrainingSet,
    pub skipped: Vec<SkippedFile>,
}

impl LoadReport {
    pub fn sample_count(&self) -> usize {
        self.training_set.values().map(Vec::len).sum()
    }
}

/// JSON body returned by a successful save.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub file: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_filled() {
        let env = SampleEnvelope::from_value(json!({"landmarks": [1, 2]})).unwrap();
        assert_eq!(env.gesture, "unknown");
        assert!(!env.timestamp.is_empty());
        assert!(env.timestamp.contains('T'));
        assert_eq!(env.landmarks, Some(json!([1, 2])));
        // The stored document is left as received.
        assert!(!env.document.contains_key("gesture"));
        assert!(!env.document.contains_key("timestamp"));
    }

    #[test]
    fn test_explicit_fields_kept() {
        let env = SampleEnvelope::from_value(json!({
            "gesture": "hello/world",
            "timestamp": "2024-01-02T03:04:05",
            "landmarks": {"x": 1},
            "hand": "left"
        }))
        .unwrap();
        assert_eq!(env.gesture, "hello/world");
        assert_eq!(env.timestamp, "2024-01-02T03:04:05");
        assert_eq!(env.document["hand"], "left");
    }

    #[test]
    fn test_missing_landmarks_is_allowed() {
        let env = SampleEnvelope::from_value(json!({"gesture": "a"})).unwrap();
        assert!(env.landmarks.is_none());
    }

    #[test]
    fn test_non_object_rejected() {
        let err = SampleEnvelope::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(err.is_bad_input());
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_non_string_gesture_rejected() {
        let err = SampleEnvelope::from_value(json!({"gesture": 7})).unwrap_err();
        assert!(err.is_bad_input());
    }

    #[test]
    fn test_malformed_body_rejected() {
        let err = SampleEnvelope::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
        assert!(err.is_bad_input());
    }

    #[test]
    fn test_sample_count() {
        let mut report = LoadReport::default();
        report
            .training_set
            .insert("a".into(), vec![json!(1), json!(2)]);
        report.training_set.insert("b".into(), vec![]);
        assert_eq!(report.sample_count(), 2);
    }
}
