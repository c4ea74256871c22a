//! Worker metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! every call is a no-op.

use metrics::{counter, histogram};

use mworker_models::{JobStatus, ProcessStatus};

/// Metric name constants for consistency.
pub mod names {
    /// Units (frames and cues) handled, by kind and status.
    pub const UNITS_TOTAL: &str = "mworker_units_total";

    /// Jobs finished, by final status.
    pub const JOBS_TOTAL: &str = "mworker_jobs_total";

    /// Wall-clock time spent inside worker callbacks, by callback.
    pub const CALLBACK_SECONDS: &str = "mworker_callback_seconds";
}

pub fn record_unit(kind: &'static str, status: ProcessStatus) {
    let status = match status {
        ProcessStatus::Success => "success",
        ProcessStatus::Failure => "failure",
    };
    counter!(names::UNITS_TOTAL, "kind" => kind, "status" => status).increment(1);
}

pub fn record_job(status: JobStatus) {
    counter!(names::JOBS_TOTAL, "status" => status.as_str()).increment(1);
}

pub fn record_callback(callback: &'static str, elapsed_secs: f64) {
    histogram!(names::CALLBACK_SECONDS, "callback" => callback).record(elapsed_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_unit("video", ProcessStatus::Success);
        record_job(JobStatus::Completed);
        record_callback("process_frame", 0.001);
    }
}
