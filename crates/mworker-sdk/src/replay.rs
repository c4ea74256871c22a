//! Recorded jobs.
//!
//! A replay bundles a job message, the input format context and the
//! decoded units, so a worker can be driven without a demuxer:
//!
//! ```json
//! {
//!   "job": {"job_id": 1, "parameters": []},
//!   "format_context": {"streams": [{"index": 0, "stream_type": "VIDEO"}]},
//!   "units": [{"type": "frame", "stream_index": 0, "frame": {"pts": 0, "width": 2, "height": 2}}]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use mworker_models::{FormatContext, Job, MediaUnit, ModelError};

use crate::error::{WorkerError, WorkerResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReplay {
    pub job: Job,
    pub format_context: FormatContext,
    #[serde(default)]
    pub units: Vec<MediaUnit>,
}

impl JobReplay {
    pub fn new(job: Job, format_context: FormatContext) -> Self {
        Self {
            job,
            format_context,
            units: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: MediaUnit) -> Self {
        self.units.push(unit);
        self
    }

    pub fn from_json(json: &str) -> WorkerResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| WorkerError::Model(ModelError::invalid_job(format!("invalid replay: {}", e))))
    }

    pub fn from_file(path: impl AsRef<Path>) -> WorkerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mworker_models::StreamType;

    #[test]
    fn test_parse_replay() {
        let replay = JobReplay::from_json(
            r#"{
                "job": {"job_id": 7, "parameters": []},
                "format_context": {"streams": [
                    {"index": 0, "stream_type": "VIDEO"},
                    {"index": 1, "stream_type": "AVMEDIA_TYPE_SUBTITLE"}
                ]},
                "units": [
                    {"type": "frame", "stream_index": 0, "frame": {"pts": 40, "width": 4, "height": 2, "planes": [[1, 2]]}},
                    {"type": "cue", "stream_index": 1, "ttml": "<tt/>"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(replay.job.job_id.0, 7);
        assert_eq!(
            replay.format_context.stream(1).map(|s| s.stream_type),
            Some(StreamType::Subtitles)
        );
        assert_eq!(replay.units.len(), 2);
        assert!(matches!(
            &replay.units[0],
            MediaUnit::Frame { frame, .. } if frame.is_video() && frame.pts == 40
        ));
    }

    #[test]
    fn test_units_default_to_empty() {
        let replay = JobReplay::from_json(
            r#"{"job": {"job_id": 1, "parameters": []}, "format_context": {"streams": []}}"#,
        )
        .unwrap();
        assert!(replay.units.is_empty());
    }

    #[test]
    fn test_invalid_replay() {
        assert!(matches!(
            JobReplay::from_json("{\"job\": 3}"),
            Err(WorkerError::Model(ModelError::InvalidJob(_)))
        ));
    }
}
