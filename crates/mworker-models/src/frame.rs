//! Decoded frames and host input units.
//!
//! The host owns frame buffers. Workers receive a [`Frame`] borrowing those
//! buffers, so nothing from a frame can outlive the callback it was passed to.

use serde::{Deserialize, Serialize};

/// A decoded video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame<'a> {
    pub planes: Vec<&'a [u8]>,
    pub pts: i64,
    pub width: u32,
    pub height: u32,
}

/// A decoded audio frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame<'a> {
    pub planes: Vec<&'a [u8]>,
    pub pts: i64,
    pub sample_rate: u32,
    pub channels: u16,
    pub nb_samples: u32,
}

/// Frame delivered to a worker callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame<'a> {
    Video(VideoFrame<'a>),
    Audio(AudioFrame<'a>),
}

impl<'a> Frame<'a> {
    pub fn pts(&self) -> i64 {
        match self {
            Frame::Video(f) => f.pts,
            Frame::Audio(f) => f.pts,
        }
    }

    pub fn planes(&self) -> &[&'a [u8]] {
        match self {
            Frame::Video(f) => &f.planes,
            Frame::Audio(f) => &f.planes,
        }
    }

    /// Total byte length over all planes.
    pub fn data_length(&self) -> usize {
        self.planes().iter().map(|p| p.len()).sum()
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Frame::Video(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Video(_) => "video",
            Frame::Audio(_) => "audio",
        }
    }
}

/// Host-owned frame storage, as decoded or replayed.
///
/// Video frames carry non-zero width and height; anything else is audio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFrame {
    #[serde(default)]
    pub planes: Vec<Vec<u8>>,
    pub pts: i64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub sample_rate: u32,
    #[serde(default)]
    pub channels: u16,
    #[serde(default)]
    pub nb_samples: u32,
}

impl RawFrame {
    pub fn video(pts: i64, width: u32, height: u32, planes: Vec<Vec<u8>>) -> Self {
        Self {
            planes,
            pts,
            width,
            height,
            ..Default::default()
        }
    }

    pub fn audio(
        pts: i64,
        sample_rate: u32,
        channels: u16,
        nb_samples: u32,
        planes: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            planes,
            pts,
            sample_rate,
            channels,
            nb_samples,
            ..Default::default()
        }
    }

    pub fn is_video(&self) -> bool {
        self.width != 0 && self.height != 0
    }

    /// Borrow this storage as a typed frame.
    pub fn as_frame(&self) -> Frame<'_> {
        let planes = self.planes.iter().map(Vec::as_slice).collect();
        if self.is_video() {
            Frame::Video(VideoFrame {
                planes,
                pts: self.pts,
                width: self.width,
                height: self.height,
            })
        } else {
            Frame::Audio(AudioFrame {
                planes,
                pts: self.pts,
                sample_rate: self.sample_rate,
                channels: self.channels,
                nb_samples: self.nb_samples,
            })
        }
    }
}

/// One unit of work handed to the host for a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaUnit {
    Frame {
        stream_index: usize,
        frame: RawFrame,
    },
    /// EBU-TTML-live document for a subtitle/data stream
    Cue {
        stream_index: usize,
        ttml: String,
    },
}

impl MediaUnit {
    pub fn frame(stream_index: usize, frame: RawFrame) -> Self {
        MediaUnit::Frame {
            stream_index,
            frame,
        }
    }

    pub fn cue(stream_index: usize, ttml: impl Into<String>) -> Self {
        MediaUnit::Cue {
            stream_index,
            ttml: ttml.into(),
        }
    }

    pub fn stream_index(&self) -> usize {
        match self {
            MediaUnit::Frame { stream_index, .. } | MediaUnit::Cue { stream_index, .. } => {
                *stream_index
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_dimensions_are_audio() {
        let raw = RawFrame::audio(10, 48000, 2, 1024, vec![vec![0; 16], vec![0; 16]]);
        let frame = raw.as_frame();
        assert!(!frame.is_video());
        assert_eq!(frame.kind(), "audio");
        assert_eq!(frame.data_length(), 32);
        assert_eq!(frame.pts(), 10);
    }

    #[test]
    fn test_non_zero_dimensions_are_video() {
        let raw = RawFrame::video(0, 300, 200, vec![vec![1; 60000]]);
        match raw.as_frame() {
            Frame::Video(v) => {
                assert_eq!((v.width, v.height), (300, 200));
                assert_eq!(v.planes[0].len(), 60000);
            }
            Frame::Audio(_) => panic!("expected a video frame"),
        }
    }

    #[test]
    fn test_single_zero_dimension_is_audio() {
        let raw = RawFrame {
            width: 640,
            height: 0,
            ..Default::default()
        };
        assert!(!raw.as_frame().is_video());
    }

    #[test]
    fn test_unit_json_shape() {
        let unit: MediaUnit = serde_json::from_str(
            r#"{"type": "frame", "stream_index": 1,
                "frame": {"pts": 5, "sample_rate": 16000, "channels": 1, "nb_samples": 160}}"#,
        )
        .unwrap();
        assert_eq!(unit.stream_index(), 1);

        let cue: MediaUnit =
            serde_json::from_str(r#"{"type": "cue", "stream_index": 2, "ttml": "<tt/>"}"#).unwrap();
        assert_eq!(cue, MediaUnit::cue(2, "<tt/>"));
    }
}
