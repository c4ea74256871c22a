//! Job messages and admitted parameter values.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::{ModelError, ModelResult};
use crate::parameter::ParameterKind;

/// Identifier of a job, assigned by the job broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// One parameter as sent in a job message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobParameter {
    /// Parameter identifier
    pub id: String,
    /// Type tag, checked against the worker's declarations at admission
    #[serde(rename = "type")]
    pub kind: String,
    /// Provided value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Fallback when no value is provided
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl JobParameter {
    pub fn new(id: impl Into<String>, kind: ParameterKind, value: Value) -> Self {
        Self {
            id: id.into(),
            kind: kind.as_str().to_string(),
            value: Some(value),
            default: None,
        }
    }

    /// The value, or the default when no value was provided.
    pub fn effective_value(&self) -> Option<&Value> {
        self.value
            .as_ref()
            .filter(|v| !v.is_null())
            .or(self.default.as_ref().filter(|v| !v.is_null()))
    }
}

/// A job message received from the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Job ID
    pub job_id: JobId,
    /// Parameters, in message order
    pub parameters: Vec<JobParameter>,
}

impl Job {
    /// Parse a JSON job message.
    pub fn new(message: &str) -> ModelResult<Self> {
        if message.trim().is_empty() {
            return Err(ModelError::invalid_job("empty message"));
        }
        serde_json::from_str(message).map_err(|e| ModelError::invalid_job(e.to_string()))
    }

    pub fn with_parameter(mut self, parameter: JobParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn get_parameter(&self, id: &str) -> Option<&JobParameter> {
        self.parameters.iter().find(|p| p.id == id)
    }
}

/// Reference to a credential held by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub key: String,
}

/// An admitted parameter: its resolved kind and value.
#[derive(Debug, Clone, PartialEq)]
struct AdmittedValue {
    kind: ParameterKind,
    value: Value,
}

/// Job parameters that passed admission, keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobParameters {
    values: BTreeMap<String, AdmittedValue>,
}

impl JobParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identifier: impl Into<String>, kind: ParameterKind, value: Value) {
        self.values
            .insert(identifier.into(), AdmittedValue { kind, value });
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.values.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn kind(&self, identifier: &str) -> Option<ParameterKind> {
        self.values.get(identifier).map(|v| v.kind)
    }

    pub fn get(&self, identifier: &str) -> Option<&Value> {
        self.values.get(identifier).map(|v| &v.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParameterKind, &Value)> {
        self.values
            .iter()
            .map(|(id, v)| (id.as_str(), v.kind, &v.value))
    }

    pub fn get_string(&self, identifier: &str) -> Option<String> {
        self.get(identifier)?.as_str().map(str::to_string)
    }

    pub fn get_boolean(&self, identifier: &str) -> Option<bool> {
        self.get(identifier)?.as_bool()
    }

    pub fn get_integer(&self, identifier: &str) -> Option<i64> {
        self.get(identifier)?.as_i64()
    }

    pub fn get_number(&self, identifier: &str) -> Option<f64> {
        self.get(identifier)?.as_f64()
    }

    pub fn get_credential(&self, identifier: &str) -> Option<Credential> {
        if self.kind(identifier)? != ParameterKind::Credential {
            return None;
        }
        self.get_string(identifier).map(|key| Credential { key })
    }

    pub fn get_array_of_strings(&self, identifier: &str) -> Option<Vec<String>> {
        self.get(identifier)?
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Paths listed by every `requirements` parameter.
    pub fn requirement_paths(&self) -> Vec<PathBuf> {
        self.values
            .values()
            .filter(|v| v.kind == ParameterKind::Requirements)
            .filter_map(|v| v.value.get("paths")?.as_array())
            .flatten()
            .filter_map(|p| p.as_str().map(PathBuf::from))
            .collect()
    }

    /// Serializable view, useful for logging.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(id, v)| (id.clone(), v.value.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_job_empty_message() {
        assert!(matches!(Job::new(""), Err(ModelError::InvalidJob(_))));
    }

    #[test]
    fn test_new_job_invalid_message() {
        assert!(matches!(Job::new("{}"), Err(ModelError::InvalidJob(_))));
    }

    #[test]
    fn test_new_job_invalid_parameter() {
        let message = r#"{ "job_id": 123, "parameters": [ { "key": "value" } ] }"#;
        assert!(matches!(Job::new(message), Err(ModelError::InvalidJob(_))));
    }

    #[test]
    fn test_new_job() {
        let message = r#"{
            "job_id": 123,
            "parameters": [
                { "id": "string_parameter", "type": "string",
                  "default": "default_value", "value": "real_value" },
                { "id": "boolean_parameter", "type": "boolean",
                  "default": false },
                { "id": "array_of_string_parameter", "type": "array_of_strings",
                  "value": ["real_value"] }
            ]
        }"#;

        let job = Job::new(message).unwrap();
        assert_eq!(job.job_id, JobId(123));
        assert_eq!(job.parameters.len(), 3);

        let string = job.get_parameter("string_parameter").unwrap();
        assert_eq!(string.effective_value(), Some(&json!("real_value")));

        let boolean = job.get_parameter("boolean_parameter").unwrap();
        assert_eq!(boolean.effective_value(), Some(&json!(false)));
    }

    #[test]
    fn test_typed_accessors() {
        let mut parameters = JobParameters::new();
        parameters.insert("path", ParameterKind::String, json!("/tmp/in.mxf"));
        parameters.insert("count", ParameterKind::Integer, json!(654321));
        parameters.insert("secret", ParameterKind::Credential, json!("credential_key"));
        parameters.insert("names", ParameterKind::ArrayOfStrings, json!(["a", "b"]));

        assert_eq!(parameters.get_string("path").as_deref(), Some("/tmp/in.mxf"));
        assert_eq!(parameters.get_integer("count"), Some(654321));
        assert_eq!(parameters.get_credential("secret").unwrap().key, "credential_key");
        assert!(parameters.get_credential("path").is_none());
        assert_eq!(
            parameters.get_array_of_strings("names"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(parameters.get_boolean("missing"), None);
    }

    #[test]
    fn test_requirement_paths() {
        let mut parameters = JobParameters::new();
        parameters.insert(
            "requirements",
            ParameterKind::Requirements,
            json!({ "paths": ["/a", "/b"] }),
        );
        assert_eq!(
            parameters.requirement_paths(),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }
}
