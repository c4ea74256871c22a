//! Input stream metadata exposed to workers at stream negotiation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of elementary stream in a job's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamType {
    #[serde(alias = "AVMEDIA_TYPE_VIDEO")]
    Video,
    #[serde(alias = "AVMEDIA_TYPE_AUDIO")]
    Audio,
    #[serde(alias = "AVMEDIA_TYPE_SUBTITLES", alias = "AVMEDIA_TYPE_SUBTITLE")]
    Subtitles,
    #[serde(alias = "AVMEDIA_TYPE_DATA")]
    Data,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Video => "VIDEO",
            StreamType::Audio => "AUDIO",
            StreamType::Subtitles => "SUBTITLES",
            StreamType::Data => "DATA",
        }
    }

    /// Subtitle and data streams both carry cues rather than frames.
    pub fn carries_cues(&self) -> bool {
        matches!(self, StreamType::Subtitles | StreamType::Data)
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one input stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StreamInfo {
    /// Index of the stream in the container
    pub index: usize,
    /// Stream type tag
    pub stream_type: StreamType,
    /// Codec name, when the demuxer reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_name: Option<String>,
}

impl StreamInfo {
    pub fn new(index: usize, stream_type: StreamType) -> Self {
        Self {
            index,
            stream_type,
            codec_name: None,
        }
    }

    pub fn with_codec(mut self, codec_name: impl Into<String>) -> Self {
        self.codec_name = Some(codec_name.into());
        self
    }
}

/// Ordered list of the streams found in a job's input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FormatContext {
    pub streams: Vec<StreamInfo>,
}

impl FormatContext {
    pub fn new(streams: Vec<StreamInfo>) -> Self {
        Self { streams }
    }

    pub fn nb_streams(&self) -> usize {
        self.streams.len()
    }

    pub fn stream(&self, index: usize) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.index == index)
    }
}
