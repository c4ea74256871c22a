//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Where in the job lifecycle an error belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Job rejected before any processing callback
    Admission,
    /// Worker or job initialization failed; fatal
    Initialization,
    /// A frame or cue could not be processed
    Processing,
    /// Input markup could not be parsed
    MalformedInput,
    /// Invalid configuration
    Configuration,
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Unrecognized kind '{kind}' for parameter '{identifier}'")]
    UnrecognizedKind { identifier: String, kind: String },

    #[error("Invalid parameter '{identifier}': {message}")]
    InvalidParameter { identifier: String, message: String },

    #[error("Requirements not met: {0}")]
    RequirementsNotMet(String),

    #[error("Invalid parameter declarations: {0}")]
    InvalidDeclaration(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Stream registration failed: {0}")]
    StreamRegistration(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Malformed TTML: {0}")]
    MalformedTtml(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Model error: {0}")]
    Model(#[from] mworker_models::ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_parameter(identifier: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            identifier: identifier.into(),
            message: msg.into(),
        }
    }

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    pub fn stream_registration(msg: impl Into<String>) -> Self {
        Self::StreamRegistration(msg.into())
    }

    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    pub fn malformed_ttml(msg: impl Into<String>) -> Self {
        Self::MalformedTtml(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            WorkerError::MissingParameter(_)
            | WorkerError::UnrecognizedKind { .. }
            | WorkerError::InvalidParameter { .. }
            | WorkerError::RequirementsNotMet(_) => ErrorClass::Admission,
            WorkerError::InvalidDeclaration(_)
            | WorkerError::InitializationFailed(_)
            | WorkerError::StreamRegistration(_) => ErrorClass::Initialization,
            WorkerError::MalformedTtml(_) => ErrorClass::MalformedInput,
            WorkerError::ConfigError(_) => ErrorClass::Configuration,
            WorkerError::Model(mworker_models::ModelError::InvalidJob(_))
            | WorkerError::Model(mworker_models::ModelError::InvalidParameter { .. }) => {
                ErrorClass::Admission
            }
            WorkerError::Model(_) | WorkerError::ProcessingFailed(_) | WorkerError::Io(_) => {
                ErrorClass::Processing
            }
        }
    }

    /// Check if the job was rejected before any processing callback.
    pub fn is_admission(&self) -> bool {
        self.class() == ErrorClass::Admission
    }

    /// Check if the error aborts the job (or the instance) outright.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::Admission | ErrorClass::Initialization | ErrorClass::Configuration
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(WorkerError::MissingParameter("source_path".into()).is_admission());
        assert!(WorkerError::initialization_failed("no gpu").is_fatal());
        assert!(!WorkerError::malformed_ttml("eof").is_fatal());
        assert_eq!(
            WorkerError::processing_failed("x").class(),
            ErrorClass::Processing
        );
        assert!(WorkerError::from(mworker_models::ModelError::invalid_job("empty")).is_admission());
    }
}
