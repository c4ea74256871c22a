//! Stream registration.
//!
//! Workers register the input streams they want through a [`StreamHandler`],
//! which hands back opaque [`StreamDescriptor`]s. Streams left unregistered
//! are skipped by the host.

use serde::Serialize;
use std::fmt;

use mworker_models::{FilterSpec, FormatContext, StreamType};

use crate::error::{WorkerError, WorkerResult};

/// Processing pipeline a stream is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Video,
    Audio,
    /// Subtitle or data stream delivering TTML cues
    Data,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
            StreamKind::Data => "data",
        }
    }

    fn accepts(&self, stream_type: StreamType) -> bool {
        match self {
            StreamKind::Video => stream_type == StreamType::Video,
            StreamKind::Audio => stream_type == StreamType::Audio,
            StreamKind::Data => stream_type.carries_cues(),
        }
    }
}

/// Registration of one input stream, with its ordered filter chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamDescriptor {
    index: usize,
    kind: StreamKind,
    filters: Vec<FilterSpec>,
}

impl StreamDescriptor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn filters(&self) -> &[FilterSpec] {
        &self.filters
    }

    /// Check that the registered stream exists in `format_context` with a
    /// compatible type.
    pub(crate) fn validate(&self, format_context: &FormatContext) -> WorkerResult<()> {
        StreamHandler::new(format_context)
            .register(self.index, self.kind, Vec::new())
            .map(|_| ())
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stream #{} ({} filter(s))",
            self.kind.as_str(),
            self.index,
            self.filters.len()
        )
    }
}

/// Factory for stream registrations, bound to one job's format context.
#[derive(Debug, Clone, Copy)]
pub struct StreamHandler<'a> {
    format_context: &'a FormatContext,
}

impl<'a> StreamHandler<'a> {
    pub fn new(format_context: &'a FormatContext) -> Self {
        Self { format_context }
    }

    pub fn new_video_stream(
        &self,
        index: usize,
        filters: Vec<FilterSpec>,
    ) -> WorkerResult<StreamDescriptor> {
        self.register(index, StreamKind::Video, filters)
    }

    pub fn new_audio_stream(
        &self,
        index: usize,
        filters: Vec<FilterSpec>,
    ) -> WorkerResult<StreamDescriptor> {
        self.register(index, StreamKind::Audio, filters)
    }

    pub fn new_data_stream(&self, index: usize) -> WorkerResult<StreamDescriptor> {
        self.register(index, StreamKind::Data, Vec::new())
    }

    fn register(
        &self,
        index: usize,
        kind: StreamKind,
        filters: Vec<FilterSpec>,
    ) -> WorkerResult<StreamDescriptor> {
        let stream = self.format_context.stream(index).ok_or_else(|| {
            WorkerError::stream_registration(format!("no input stream with index {}", index))
        })?;

        if !kind.accepts(stream.stream_type) {
            return Err(WorkerError::stream_registration(format!(
                "stream #{} is {}, cannot register it as {}",
                index,
                stream.stream_type,
                kind.as_str()
            )));
        }

        Ok(StreamDescriptor {
            index,
            kind,
            filters,
        })
    }
}
