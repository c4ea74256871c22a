//! Job parameter declarations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type tag accepted for a job parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    String,
    Boolean,
    Integer,
    Number,
    /// Key resolved by the host against its credential store
    Credential,
    ArrayOfStrings,
    /// Paths that must exist before the job may start
    Requirements,
    /// Free-form JSON object
    Extended,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::Boolean => "boolean",
            ParameterKind::Integer => "integer",
            ParameterKind::Number => "number",
            ParameterKind::Credential => "credential",
            ParameterKind::ArrayOfStrings => "array_of_strings",
            ParameterKind::Requirements => "requirements",
            ParameterKind::Extended => "extended",
        }
    }

    /// Check that a JSON value has the shape this kind expects.
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;

        match self {
            ParameterKind::String | ParameterKind::Credential => value.is_string(),
            ParameterKind::Boolean => value.is_boolean(),
            ParameterKind::Integer => value.is_i64() || value.is_u64(),
            ParameterKind::Number => value.is_number(),
            ParameterKind::ArrayOfStrings => value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
            ParameterKind::Requirements | ParameterKind::Extended => value.is_object(),
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a type tag is not one of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownParameterKind(pub String);

impl fmt::Display for UnknownParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown parameter kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownParameterKind {}

impl FromStr for ParameterKind {
    type Err = UnknownParameterKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ParameterKind::String),
            "boolean" => Ok(ParameterKind::Boolean),
            "integer" => Ok(ParameterKind::Integer),
            "number" => Ok(ParameterKind::Number),
            "credential" => Ok(ParameterKind::Credential),
            "array_of_strings" => Ok(ParameterKind::ArrayOfStrings),
            "requirements" => Ok(ParameterKind::Requirements),
            "extended" => Ok(ParameterKind::Extended),
            other => Err(UnknownParameterKind(other.to_string())),
        }
    }
}

/// Declaration of one job parameter accepted by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParameterSpec {
    /// Unique identifier, matched against the job parameter `id`
    pub identifier: String,
    /// Human-readable label
    pub label: String,
    /// Accepted type tags
    pub kind: Vec<ParameterKind>,
    /// Whether a job must provide this parameter
    #[serde(default)]
    pub required: bool,
}

impl ParameterSpec {
    /// Create an optional parameter declaration.
    pub fn new(
        identifier: impl Into<String>,
        label: impl Into<String>,
        kind: impl IntoIterator<Item = ParameterKind>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
            kind: kind.into_iter().collect(),
            required: false,
        }
    }

    /// Mark the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn accepts_kind(&self, kind: ParameterKind) -> bool {
        self.kind.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_round_trips_through_its_tag() {
        for kind in [
            ParameterKind::String,
            ParameterKind::ArrayOfStrings,
            ParameterKind::Requirements,
        ] {
            assert_eq!(kind.as_str().parse::<ParameterKind>().unwrap(), kind);
        }
        assert!("video_file".parse::<ParameterKind>().is_err());
    }

    #[test]
    fn test_kind_accepts_value_shape() {
        assert!(ParameterKind::String.accepts(&json!("a")));
        assert!(!ParameterKind::String.accepts(&json!(1)));
        assert!(ParameterKind::Integer.accepts(&json!(654321)));
        assert!(!ParameterKind::Integer.accepts(&json!(1.5)));
        assert!(ParameterKind::ArrayOfStrings.accepts(&json!(["a", "b"])));
        assert!(!ParameterKind::ArrayOfStrings.accepts(&json!(["a", 1])));
    }

    #[test]
    fn test_spec_deserializes_sample_declaration() {
        let spec: ParameterSpec = serde_json::from_value(json!({
            "identifier": "source_path",
            "label": "My parameter",
            "kind": ["string"],
            "required": true
        }))
        .unwrap();

        assert!(spec.required);
        assert!(spec.accepts_kind(ParameterKind::String));
        assert_eq!(
            spec,
            ParameterSpec::new("source_path", "My parameter", [ParameterKind::String]).required()
        );
    }
}
