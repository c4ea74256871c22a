//! The worker plugin contract.

use mworker_models::{
    FormatContext, Frame, JobId, JobParameters, ParameterSpec, ProcessResult, WorkerDescriptor,
};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::stream::{StreamDescriptor, StreamHandler};

/// Entry points a media worker exposes to the host.
///
/// The host calls them in this order:
///
/// 1. [`describe`](MediaWorker::describe) and [`parameters`](MediaWorker::parameters), once at load
/// 2. [`init`](MediaWorker::init), once per instance, before any job
/// 3. per job: [`init_process`](MediaWorker::init_process), then
///    [`process_frame`](MediaWorker::process_frame) /
///    [`process_ebu_ttml_live`](MediaWorker::process_ebu_ttml_live) for every unit,
///    then [`ending_process`](MediaWorker::ending_process) exactly once
///
/// Callbacks of one job run sequentially on one thread. An `Err` from a
/// frame or cue callback becomes a failure result for that unit; it does
/// not abort the job.
pub trait MediaWorker: Send {
    fn describe(&self) -> WorkerDescriptor;

    /// Declared job parameters, in display order.
    fn parameters(&self) -> Vec<ParameterSpec>;

    /// Called once per instance with the instance configuration.
    ///
    /// Returning an error means the worker cannot operate at all.
    fn init(&mut self, _config: &WorkerConfig) -> WorkerResult<()> {
        Ok(())
    }

    /// Choose the streams to process for a job, and their filters.
    ///
    /// An empty list is valid: nothing is processed for the job.
    fn init_process(
        &mut self,
        stream_handler: &StreamHandler<'_>,
        format_context: &FormatContext,
        parameters: &JobParameters,
    ) -> WorkerResult<Vec<StreamDescriptor>>;

    /// Handle one decoded (and filtered) audio or video frame.
    ///
    /// The frame borrows host buffers and must not be retained.
    fn process_frame(
        &mut self,
        job_id: JobId,
        stream_index: usize,
        frame: &Frame<'_>,
    ) -> WorkerResult<ProcessResult>;

    /// Handle one EBU-TTML-live cue from a data stream.
    fn process_ebu_ttml_live(
        &mut self,
        _job_id: JobId,
        _stream_index: usize,
        _ttml: &str,
    ) -> WorkerResult<ProcessResult> {
        Ok(ProcessResult::failure(
            "EBU TTML live content is not handled by this worker",
        ))
    }

    /// Called once at the end of every job, whatever happened before.
    fn ending_process(&mut self) -> WorkerResult<()> {
        Ok(())
    }
}
