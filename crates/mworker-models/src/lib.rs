//! Shared data models for the media worker boundary.
//!
//! This crate provides Serde-serializable types for:
//! - Worker metadata and job parameter declarations
//! - Job messages and admitted parameter values
//! - Stream metadata, filter configurations and frames
//! - Per-unit process results and aggregate job status
//! - TTML time expressions carried by subtitle cues

pub mod descriptor;
pub mod error;
pub mod filter;
pub mod frame;
pub mod job;
pub mod parameter;
pub mod result;
pub mod stream;
pub mod time_expression;

// Re-export common types
pub use descriptor::WorkerDescriptor;
pub use error::{ModelError, ModelResult};
pub use filter::{build_filter_chain, FilterSpec};
pub use frame::{AudioFrame, Frame, MediaUnit, RawFrame, VideoFrame};
pub use job::{Credential, Job, JobId, JobParameter, JobParameters};
pub use parameter::{ParameterKind, ParameterSpec};
pub use result::{JobStatus, ProcessResult, ProcessStatus};
pub use semver::Version;
pub use stream::{FormatContext, StreamInfo, StreamType};
pub use time_expression::{Frames, TimeExpression, TimeUnit, TimingParameters};
