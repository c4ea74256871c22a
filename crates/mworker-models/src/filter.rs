//! Filter stage definitions attached to registered streams.
//!
//! Parameters stay an untyped string map; the filter-graph engine that
//! consumes them owns their meaning.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One named transform stage in a stream's filter chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FilterSpec {
    /// Filter name (e.g. `crop`, `aformat`)
    pub name: String,
    /// Optional instance label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Filter options
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Render as an FFmpeg filter description, e.g. `crop@crop_filter=out_h=200:out_w=300`.
    pub fn to_filter_string(&self) -> String {
        let mut out = self.name.clone();
        if let Some(label) = &self.label {
            out.push('@');
            out.push_str(label);
        }
        if !self.parameters.is_empty() {
            let options: Vec<String> = self
                .parameters
                .iter()
                .map(|(k, v)| format!("{}={}", k, escape_option_value(v)))
                .collect();
            out.push('=');
            out.push_str(&options.join(":"));
        }
        out
    }
}

/// Render an ordered filter chain as a single FFmpeg filter string.
pub fn build_filter_chain(filters: &[FilterSpec]) -> Option<String> {
    if filters.is_empty() {
        return None;
    }
    Some(
        filters
            .iter()
            .map(FilterSpec::to_filter_string)
            .collect::<Vec<_>>()
            .join(","),
    )
}

fn escape_option_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ':' | '\'' | ',' | ';' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
