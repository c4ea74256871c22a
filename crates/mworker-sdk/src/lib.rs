//! Media worker SDK.
//!
//! This crate provides:
//! - The [`MediaWorker`] plugin contract
//! - Job admission against declared parameters
//! - Stream registration with filter chains
//! - A host that drives one worker instance through a job
//! - A pool running several independent instances
//! - EBU-TTML-live cue parsing
//! - Instance-scoped logging and callback metrics

pub mod admission;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod replay;
pub mod stream;
pub mod ttml;
pub mod worker;

pub use config::{LogFormat, LoggingConfig, WorkerConfig};
pub use error::{ErrorClass, WorkerError, WorkerResult};
pub use host::{AbandonHandle, JobReport, UnitResult, WorkerHost};
pub use logging::JobLogger;
pub use pool::{PoolOutcome, WorkerPool};
pub use replay::JobReplay;
pub use stream::{StreamDescriptor, StreamHandler, StreamKind};
pub use worker::MediaWorker;

pub use mworker_models as models;
