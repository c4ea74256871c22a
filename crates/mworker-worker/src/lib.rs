//! Reference media worker.
//!
//! Registers every input stream it understands:
//! - video streams, cropped to 300x200 at (50, 50)
//! - audio streams, resampled to 16 kHz mono s16
//! - subtitle and data streams, delivered as EBU-TTML-live cues
//!
//! Frames and cues are only logged.

use tracing::{debug, info};

use mworker_models::{
    FilterSpec, FormatContext, Frame, JobId, JobParameters, ParameterKind, ParameterSpec,
    ProcessResult, StreamType, Version, WorkerDescriptor,
};
use mworker_sdk::{
    ttml, MediaWorker, StreamDescriptor, StreamHandler, WorkerConfig, WorkerResult,
};

pub const WORKER_NAME: &str = "My Media Worker";

/// Logs every frame and cue it receives.
#[derive(Debug, Default)]
pub struct ExampleMediaWorker {
    frames: u64,
    cues: u64,
}

impl ExampleMediaWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn cues(&self) -> u64 {
        self.cues
    }
}

fn video_filters() -> Vec<FilterSpec> {
    vec![FilterSpec::new("crop")
        .with_label("crop_filter")
        .with_parameter("out_w", "300")
        .with_parameter("out_h", "200")
        .with_parameter("x", "50")
        .with_parameter("y", "50")]
}

fn audio_filters() -> Vec<FilterSpec> {
    vec![FilterSpec::new("aformat")
        .with_parameter("sample_rates", "16000")
        .with_parameter("channel_layouts", "mono")
        .with_parameter("sample_fmts", "s16")]
}

impl MediaWorker for ExampleMediaWorker {
    fn describe(&self) -> WorkerDescriptor {
        WorkerDescriptor::new(
            WORKER_NAME,
            "My Media Worker",
            "This is my long description\nover multilines",
            Version::new(0, 0, 3),
        )
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::new("source_path", "My parameter", [ParameterKind::String]).required(),
            ParameterSpec::new(
                "destination_path",
                "My array parameter",
                [ParameterKind::String],
            ),
        ]
    }

    fn init(&mut self, config: &WorkerConfig) -> WorkerResult<()> {
        info!(level = %config.logging.level, "Initialise media worker...");
        Ok(())
    }

    fn init_process(
        &mut self,
        stream_handler: &StreamHandler<'_>,
        format_context: &FormatContext,
        parameters: &JobParameters,
    ) -> WorkerResult<Vec<StreamDescriptor>> {
        info!("Initialise the media process...");
        debug!("Number of streams: {}", format_context.nb_streams());
        debug!("Message parameters: {}", parameters.to_json());

        self.frames = 0;
        self.cues = 0;

        let mut descriptors = Vec::new();
        for stream in &format_context.streams {
            let descriptor = match stream.stream_type {
                StreamType::Video => stream_handler.new_video_stream(stream.index, video_filters())?,
                StreamType::Audio => stream_handler.new_audio_stream(stream.index, audio_filters())?,
                StreamType::Subtitles | StreamType::Data => {
                    stream_handler.new_data_stream(stream.index)?
                }
            };
            info!("Add stream to process: {}", descriptor);
            descriptors.push(descriptor);
        }

        Ok(descriptors)
    }

    fn process_frame(
        &mut self,
        job_id: JobId,
        stream_index: usize,
        frame: &Frame<'_>,
    ) -> WorkerResult<ProcessResult> {
        self.frames += 1;
        match frame {
            Frame::Video(video) => info!(
                job_id = %job_id,
                stream_index,
                "Process video frame - PTS: {}, image size: {}x{}, data length: {}",
                video.pts,
                video.width,
                video.height,
                frame.data_length()
            ),
            Frame::Audio(audio) => info!(
                job_id = %job_id,
                stream_index,
                "Process audio frame - PTS: {}, sample_rate: {}Hz, channels: {}, nb_samples: {}, data length: {}",
                audio.pts,
                audio.sample_rate,
                audio.channels,
                audio.nb_samples,
                frame.data_length()
            ),
        }

        Ok(ProcessResult::success())
    }

    fn process_ebu_ttml_live(
        &mut self,
        job_id: JobId,
        stream_index: usize,
        ttml_content: &str,
    ) -> WorkerResult<ProcessResult> {
        self.cues += 1;
        info!(
            job_id = %job_id,
            stream_index,
            "Process {}-bytes EBU TTML live content",
            ttml_content.len()
        );

        let document = match ttml::parse(ttml_content) {
            Ok(document) => document,
            Err(e) => return Ok(ProcessResult::failure(e.to_string())),
        };
        debug!("{}: {:?}", document.root_tag, document.attributes);

        let mut subtitle = String::new();
        for body in &document.bodies {
            subtitle.push_str(&format!("\t body: {:?}", body.attributes));
            for span in body.paragraphs.iter().flat_map(|p| p.spans.iter()) {
                subtitle.push_str(&format!(" - '{}'", span));
            }
        }
        info!("{}", subtitle);

        Ok(ProcessResult::success().with("subtitle", document.subtitle_text().into()))
    }

    fn ending_process(&mut self) -> WorkerResult<()> {
        info!(
            frames = self.frames,
            cues = self.cues,
            "Ending media worker process..."
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mworker_models::{RawFrame, StreamInfo};
    use mworker_sdk::StreamKind;
    use serde_json::json;

    fn context() -> FormatContext {
        FormatContext::new(vec![
            StreamInfo::new(0, StreamType::Video),
            StreamInfo::new(1, StreamType::Audio),
            StreamInfo::new(2, StreamType::Subtitles),
            StreamInfo::new(3, StreamType::Data),
        ])
    }

    #[test]
    fn test_describe() {
        let worker = ExampleMediaWorker::new();
        let descriptor = worker.describe();
        assert_eq!(descriptor.name, WORKER_NAME);
        assert_eq!(descriptor.version.to_string(), "0.0.3");

        let parameters = worker.parameters();
        assert_eq!(parameters.len(), 2);
        assert!(parameters[0].required);
        assert!(!parameters[1].required);
    }

    #[test]
    fn test_registers_every_stream() {
        let ctx = context();
        let handler = StreamHandler::new(&ctx);
        let mut worker = ExampleMediaWorker::new();

        let streams = worker
            .init_process(&handler, &ctx, &JobParameters::new())
            .unwrap();

        let kinds: Vec<StreamKind> = streams.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                StreamKind::Video,
                StreamKind::Audio,
                StreamKind::Data,
                StreamKind::Data
            ]
        );
        assert_eq!(
            streams[0].filters()[0].to_filter_string(),
            "crop@crop_filter=out_h=200:out_w=300:x=50:y=50"
        );
        assert_eq!(
            streams[1].filters()[0].to_filter_string(),
            "aformat=channel_layouts=mono:sample_fmts=s16:sample_rates=16000"
        );
    }

    #[test]
    fn test_frames_always_succeed() {
        let mut worker = ExampleMediaWorker::new();
        let video = RawFrame::video(0, 300, 200, vec![vec![0; 16]]);
        let audio = RawFrame::audio(0, 16000, 1, 160, vec![vec![0; 320]]);

        assert!(worker
            .process_frame(JobId(1), 0, &video.as_frame())
            .unwrap()
            .is_success());
        assert!(worker
            .process_frame(JobId(1), 1, &audio.as_frame())
            .unwrap()
            .is_success());
        assert_eq!(worker.frames(), 2);
    }

    #[test]
    fn test_cue_handling() {
        let mut worker = ExampleMediaWorker::new();
        let ttml = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div><p><span>Bonjour</span><span>le monde</span></p></div></body></tt>"#;

        let result = worker.process_ebu_ttml_live(JobId(1), 2, ttml).unwrap();
        assert!(result.is_success());
        assert_eq!(result.payload["subtitle"], json!("Bonjour le monde"));

        let result = worker
            .process_ebu_ttml_live(JobId(1), 2, "<tt><body>")
            .unwrap();
        assert!(!result.is_success());
        assert_eq!(worker.cues(), 2);
    }
}
