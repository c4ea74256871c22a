//! Instance-scoped logging.
//!
//! Each worker instance owns a [`Dispatch`] built from its [`LoggingConfig`].
//! The host enters it around every callback, so two instances in the same
//! process can log at different levels without touching the global default.

use tracing::{error, info, warn, Dispatch, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mworker_models::JobId;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{WorkerError, WorkerResult};

/// Build the subscriber dispatch for one worker instance.
pub fn build_dispatch(config: &LoggingConfig) -> WorkerResult<Dispatch> {
    let env_filter = EnvFilter::try_new(&config.level).map_err(|e| {
        WorkerError::config_error(format!("invalid log filter '{}': {}", config.level, e))
    })?;

    let dispatch = match config.format {
        LogFormat::Json => Dispatch::new(
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(env_filter),
        ),
        LogFormat::Pretty => Dispatch::new(
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_ansi(config.ansi)
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false),
                )
                .with(env_filter),
        ),
    };

    Ok(dispatch)
}

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: JobId,
    worker: String,
}

impl JobLogger {
    pub fn new(job_id: JobId, worker: &str) -> Self {
        Self {
            job_id,
            worker: worker.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, worker = %self.worker, "Job started: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, worker = %self.worker, "Job warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(job_id = %self.job_id, worker = %self.worker, "Job error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(job_id = %self.job_id, worker = %self.worker, "Job completed: {}", message);
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn worker(&self) -> &str {
        &self.worker
    }

    /// Span covering the whole job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, worker = %self.worker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_for_each_format() {
        let pretty = LoggingConfig::default().with_level("debug");
        assert!(build_dispatch(&pretty).is_ok());

        let json = LoggingConfig::default().with_format(LogFormat::Json);
        assert!(build_dispatch(&json).is_ok());
    }

    #[test]
    fn test_dispatches_filter_independently() {
        let quiet = build_dispatch(&LoggingConfig::default().with_level("off")).unwrap();
        let verbose = build_dispatch(&LoggingConfig::default().with_level("debug")).unwrap();

        let debug_enabled = |dispatch: &Dispatch| {
            tracing::dispatcher::with_default(dispatch, || tracing::enabled!(tracing::Level::DEBUG))
        };

        assert!(!debug_enabled(&quiet));
        assert!(debug_enabled(&verbose));
        assert!(!debug_enabled(&quiet));
    }

    #[test]
    fn test_invalid_filter_is_a_config_error() {
        let config = LoggingConfig {
            level: "mworker=notalevel".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            build_dispatch(&config),
            Err(WorkerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_job_logger_fields() {
        let logger = JobLogger::new(JobId(666), "Test Worker");
        assert_eq!(logger.job_id(), JobId(666));
        assert_eq!(logger.worker(), "Test Worker");
    }
}
