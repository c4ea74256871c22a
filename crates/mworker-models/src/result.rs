//! Per-unit process results and aggregate job status.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of one frame or cue callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Success,
    Failure,
}

/// Result returned synchronously for each frame or cue.
///
/// Serialized flat: `{"status": "success", ...payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessResult {
    pub status: ProcessStatus,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ProcessResult {
    pub fn success() -> Self {
        Self {
            status: ProcessStatus::Success,
            payload: Map::new(),
        }
    }

    /// Failure carrying a `message` field.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: ProcessStatus::Failure,
            payload: Map::new(),
        }
        .with("message", Value::String(message.into()))
    }

    /// Add one payload field. `status` is reserved and ignored.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if key != "status" {
            self.payload.insert(key, value);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ProcessStatus::Success
    }

    pub fn message(&self) -> Option<&str> {
        self.payload.get("message")?.as_str()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Null)
    }
}

/// Aggregate outcome of a job, decided by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Every unit succeeded
    Completed,
    /// A fatal error occurred or at least one unit failed
    Error,
    /// Delivery stopped before the input was exhausted
    Abandoned,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
            JobStatus::Abandoned => "abandoned",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_serializes_to_status_only() {
        assert_eq!(ProcessResult::success().to_json(), json!({ "status": "success" }));
    }

    #[test]
    fn test_failure_carries_message() {
        let result = ProcessResult::failure("bad markup");
        assert!(!result.is_success());
        assert_eq!(
            result.to_json(),
            json!({ "status": "failure", "message": "bad markup" })
        );
    }

    #[test]
    fn test_status_key_is_reserved() {
        let result = ProcessResult::success()
            .with("status", json!("failure"))
            .with("subtitle", json!("hello"));
        assert!(result.is_success());
        assert_eq!(result.payload.len(), 1);
    }

    #[test]
    fn test_parse_custom_payload() {
        let result: ProcessResult =
            serde_json::from_value(json!({ "status": "success", "faces": 2 })).unwrap();
        assert_eq!(result.payload["faces"], json!(2));
    }
}
