// Per-leaf outcomes and the aggregated fan-out result
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::ModelOutput;
use crate::usage::UsageReport;

/// What one leaf produced.
///
/// Serialized shapes:
/// - `Parsed`: the parsed JSON value itself
/// - `Unparsed`: `{"unparsed": true, "raw": "..."}`
/// - `Failed`: `{"error": "...", "failed": true}`
///
/// The marker keys `unparsed` and `failed` set the two wrappers apart from a
/// parsed object that happens to carry an `error` field.
#[derive(Clone, Debug, PartialEq)]
pub enum LeafOutcome {
    Parsed(Value),
    Unparsed { raw: String },
    Failed { error: String },
}

impl LeafOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        LeafOutcome::Failed { error: error.into() }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LeafOutcome::Failed { .. })
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            LeafOutcome::Parsed(value) => Some(value),
            _ => None,
        }
    }
}

impl From<ModelOutput> for LeafOutcome {
    fn from(output: ModelOutput) -> Self {
        match output {
            ModelOutput::Structured { value } => LeafOutcome::Parsed(value),
            ModelOutput::Text { text } => LeafOutcome::Unparsed { raw: text },
        }
    }
}

impl Serialize for LeafOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LeafOutcome::Parsed(value) => value.serialize(serializer),
            LeafOutcome::Unparsed { raw } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("unparsed", &true)?;
                map.serialize_entry("raw", raw)?;
                map.end()
            }
            LeafOutcome::Failed { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("error", error)?;
                map.serialize_entry("failed", &true)?;
                map.end()
            }
        }
    }
}

/// Output of one fan-out: one entry per sub-request label
#[derive(Clone, Debug, Serialize)]
pub struct AggregatedResult {
    pub batch_id: Uuid,
    pub results: BTreeMap<String, LeafOutcome>,
    pub token_usage: UsageReport,
    /// RFC 3339, taken when the barrier released
    pub timestamp: String,
    /// Wall-clock seconds from dispatch to barrier
    pub execution_time: f64,
}

impl AggregatedResult {
    pub fn failed_labels(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(label, _)| label.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shapes() {
        assert_eq!(serde_json::to_value(LeafOutcome::Parsed(json!([1, 2]))).unwrap(), json!([1, 2]));
        assert_eq!(
            serde_json::to_value(LeafOutcome::Unparsed { raw: "oops".to_string() }).unwrap(),
            json!({"unparsed": true, "raw": "oops"})
        );
        assert_eq!(
            serde_json::to_value(LeafOutcome::failed("timeout")).unwrap(),
            json!({"error": "timeout", "failed": true})
        );
    }

    #[test]
    fn test_parsed_error_field_differs_from_failure() {
        let parsed = serde_json::to_value(LeafOutcome::Parsed(json!({"error": "none today"}))).unwrap();
        let failed = serde_json::to_value(LeafOutcome::failed("none today")).unwrap();
        assert_ne!(parsed, failed);
        assert_eq!(failed["failed"], true);
        assert!(parsed.get("failed").is_none());
    }

    #[test]
    fn test_from_model_output() {
        let parsed: LeafOutcome = ModelOutput::Structured { value: json!({"a": 1}) }.into();
        assert_eq!(parsed.as_value(), Some(&json!({"a": 1})));
        let raw: LeafOutcome = ModelOutput::Text { text: "hi".to_string() }.into();
        assert_eq!(raw, LeafOutcome::Unparsed { raw: "hi".to_string() });
    }
}
