//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid job message: {0}")]
    InvalidJob(String),

    #[error("Invalid parameter '{identifier}': {message}")]
    InvalidParameter { identifier: String, message: String },

    #[error("Invalid time expression '{0}'")]
    InvalidTimeExpression(String),

    #[error("Invalid version: {0}")]
    Version(#[from] semver::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn invalid_job(msg: impl Into<String>) -> Self {
        Self::InvalidJob(msg.into())
    }

    pub fn invalid_parameter(identifier: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            identifier: identifier.into(),
            message: msg.into(),
        }
    }
}
