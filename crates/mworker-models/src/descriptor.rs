//! Worker identity metadata.

use schemars::JsonSchema;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;

/// Static description of a worker, queried once when the plugin is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkerDescriptor {
    /// Worker name
    pub name: String,
    /// One-line description
    pub short_description: String,
    /// Long description, may span several lines
    pub description: String,
    /// Semantic version of the worker
    #[schemars(with = "String")]
    pub version: Version,
}

impl WorkerDescriptor {
    pub fn new(
        name: impl Into<String>,
        short_description: impl Into<String>,
        description: impl Into<String>,
        version: Version,
    ) -> Self {
        Self {
            name: name.into(),
            short_description: short_description.into(),
            description: description.into(),
            version,
        }
    }

    /// Build a descriptor from a textual version, rejecting anything that is not SemVer.
    pub fn parse(
        name: impl Into<String>,
        short_description: impl Into<String>,
        description: impl Into<String>,
        version: &str,
    ) -> ModelResult<Self> {
        Ok(Self::new(
            name,
            short_description,
            description,
            Version::parse(version)?,
        ))
    }
}
