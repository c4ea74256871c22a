//! Host side of the worker boundary.
//!
//! [`WorkerHost`] owns one worker instance and drives its callbacks in the
//! contract order: admission, `init_process`, one callback per unit, then
//! `ending_process` exactly once.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use scopeguard::ScopeGuard;
use serde::Serialize;
use tracing::{debug, dispatcher, error, info, warn, Dispatch};

use mworker_models::{
    FormatContext, Job, JobId, JobStatus, MediaUnit, ParameterSpec, ProcessResult, RawFrame,
    WorkerDescriptor,
};

use crate::admission::{admit, check_requirements, validate_declarations};
use crate::config::WorkerConfig;
use crate::error::{ErrorClass, WorkerError, WorkerResult};
use crate::logging::{build_dispatch, JobLogger};
use crate::metrics;
use crate::replay::JobReplay;
use crate::stream::{StreamDescriptor, StreamHandler, StreamKind};
use crate::worker::MediaWorker;

/// Stops unit delivery from another thread.
///
/// Once abandoned, every job started on the host stops before its next unit
/// (and still runs `ending_process`) until [`reset`](AbandonHandle::reset).
#[derive(Debug, Clone, Default)]
pub struct AbandonHandle(Arc<AtomicBool>);

impl AbandonHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abandon(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_abandoned(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one delivered (or refused) unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitResult {
    pub stream_index: usize,
    /// Frame pts; `None` for cues
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pts: Option<i64>,
    pub result: ProcessResult,
}

/// Aggregate outcome of one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Registrations returned by `init_process`, ordered by stream index
    pub streams: Vec<StreamDescriptor>,
    pub results: Vec<UnitResult>,
    /// Error reported by `ending_process`, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl JobReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.result.is_success()).count()
    }

    pub fn results_for(&self, stream_index: usize) -> impl Iterator<Item = &UnitResult> {
        self.results
            .iter()
            .filter(move |r| r.stream_index == stream_index)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// One loaded worker instance.
pub struct WorkerHost<W: MediaWorker> {
    worker: W,
    descriptor: WorkerDescriptor,
    parameters: Vec<ParameterSpec>,
    dispatch: Dispatch,
    abandon: AbandonHandle,
}

impl<W: MediaWorker> WorkerHost<W> {
    /// Query the worker metadata and run `init`.
    pub fn load(worker: W, config: WorkerConfig) -> WorkerResult<Self> {
        Self::load_with_abandon(worker, config, AbandonHandle::new())
    }

    /// Like [`load`](Self::load), sharing an existing abandon handle.
    pub fn load_with_abandon(
        mut worker: W,
        config: WorkerConfig,
        abandon: AbandonHandle,
    ) -> WorkerResult<Self> {
        let dispatch = build_dispatch(&config.logging)?;

        let (descriptor, parameters) = dispatcher::with_default(&dispatch, || {
            let descriptor = worker.describe();
            let parameters = worker.parameters();
            validate_declarations(&parameters)?;

            info!(
                worker = %descriptor.name,
                version = %descriptor.version,
                parameters = parameters.len(),
                "Initialising worker"
            );

            guarded("init", || worker.init(&config)).map_err(into_initialization)?;
            Ok::<_, WorkerError>((descriptor, parameters))
        })?;

        Ok(Self {
            worker,
            descriptor,
            parameters,
            dispatch,
            abandon,
        })
    }

    pub fn descriptor(&self) -> &WorkerDescriptor {
        &self.descriptor
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn abandon_handle(&self) -> AbandonHandle {
        self.abandon.clone()
    }

    pub fn worker(&self) -> &W {
        &self.worker
    }

    pub fn into_inner(self) -> W {
        self.worker
    }

    /// Run a recorded job.
    pub fn run_replay(&mut self, replay: JobReplay) -> WorkerResult<JobReport> {
        self.run_job(&replay.job, &replay.format_context, replay.units)
    }

    /// Run one job over the given input units.
    ///
    /// Admission errors return before any callback. Errors from
    /// `init_process` (or an invalid registration list) abort the job after
    /// `ending_process` has run. Everything else ends up in the report.
    pub fn run_job<I>(
        &mut self,
        job: &Job,
        format_context: &FormatContext,
        units: I,
    ) -> WorkerResult<JobReport>
    where
        I: IntoIterator<Item = MediaUnit>,
    {
        let dispatch = self.dispatch.clone();
        dispatcher::with_default(&dispatch, || self.run_job_inner(job, format_context, units))
    }

    fn run_job_inner<I>(
        &mut self,
        job: &Job,
        format_context: &FormatContext,
        units: I,
    ) -> WorkerResult<JobReport>
    where
        I: IntoIterator<Item = MediaUnit>,
    {
        let job_id = job.job_id;
        let logger = JobLogger::new(job_id, &self.descriptor.name);
        let span = logger.create_span();
        let _enter = span.enter();
        let started_at = Utc::now();

        let parameters = match admit(&self.parameters, job).and_then(|p| {
            check_requirements(&p)?;
            Ok(p)
        }) {
            Ok(p) => p,
            Err(e) => {
                logger.log_error(&format!("rejected at admission: {}", e));
                metrics::record_job(JobStatus::Error);
                return Err(e);
            }
        };

        logger.log_start(&format!(
            "{} stream(s), {} parameter(s)",
            format_context.nb_streams(),
            parameters.len()
        ));
        debug!(parameters = %parameters.to_json(), "Admitted job parameters");

        let abandon = self.abandon.clone();

        // ending_process must run even if the host itself unwinds
        let mut worker = scopeguard::guard_on_unwind(&mut self.worker, |worker| {
            let _ = worker.ending_process();
        });

        let handler = StreamHandler::new(format_context);
        let streams = guarded("init_process", || {
            worker.init_process(&handler, format_context, &parameters)
        })
        .map_err(into_initialization)
        .and_then(|streams| order_registrations(streams, format_context));

        let streams = match streams {
            Ok(streams) => streams,
            Err(e) => {
                logger.log_error(&format!("init_process failed: {}", e));
                let worker = ScopeGuard::into_inner(worker);
                if let Err(ending) = guarded("ending_process", || worker.ending_process()) {
                    error!(job_id = %job_id, "ending_process failed: {}", ending);
                }
                metrics::record_job(JobStatus::Error);
                return Err(e);
            }
        };

        for stream in &streams {
            info!(job_id = %job_id, "Registered {}", stream);
        }

        let kinds: HashMap<usize, StreamKind> =
            streams.iter().map(|s| (s.index(), s.kind())).collect();
        let mut last_pts: HashMap<usize, i64> = HashMap::new();
        let mut results = Vec::new();
        let mut abandoned = false;

        for unit in units {
            if abandon.is_abandoned() {
                warn!(job_id = %job_id, "Job abandoned, stopping delivery");
                abandoned = true;
                break;
            }

            let stream_index = unit.stream_index();
            let Some(&kind) = kinds.get(&stream_index) else {
                debug!(job_id = %job_id, stream_index, "Skipping unit of unregistered stream");
                continue;
            };

            let unit_result = match unit {
                MediaUnit::Frame { frame, .. } => deliver_frame(
                    &mut **worker,
                    job_id,
                    stream_index,
                    kind,
                    &frame,
                    &mut last_pts,
                ),
                MediaUnit::Cue { ttml, .. } => {
                    deliver_cue(&mut **worker, job_id, stream_index, kind, &ttml)
                }
            };
            results.push(unit_result);
        }

        let worker = ScopeGuard::into_inner(worker);
        let ending_error = guarded("ending_process", || worker.ending_process())
            .err()
            .map(|e| {
                error!(job_id = %job_id, "ending_process failed: {}", e);
                e.to_string()
            });

        let status = if abandoned {
            JobStatus::Abandoned
        } else if ending_error.is_some() || results.iter().any(|r| !r.result.is_success()) {
            JobStatus::Error
        } else {
            JobStatus::Completed
        };

        let report = JobReport {
            job_id,
            status,
            streams,
            results,
            ending_error,
            started_at,
            completed_at: Utc::now(),
        };

        metrics::record_job(status);
        match status {
            JobStatus::Completed => {
                logger.log_completion(&format!("{} unit(s) processed", report.results.len()))
            }
            _ => logger.log_warning(&format!(
                "finished as {} with {} failed unit(s)",
                status.as_str(),
                report.failures()
            )),
        }

        Ok(report)
    }
}

fn deliver_frame<W: MediaWorker>(
    worker: &mut W,
    job_id: JobId,
    stream_index: usize,
    kind: StreamKind,
    raw: &RawFrame,
    last_pts: &mut HashMap<usize, i64>,
) -> UnitResult {
    let refuse = |message: String| {
        warn!(job_id = %job_id, stream_index, pts = raw.pts, "{}", message);
        let result = ProcessResult::failure(message);
        metrics::record_unit("frame", result.status);
        UnitResult {
            stream_index,
            pts: Some(raw.pts),
            result,
        }
    };

    let frame = raw.as_frame();
    let expected_video = match kind {
        StreamKind::Video => true,
        StreamKind::Audio => false,
        StreamKind::Data => {
            return refuse(format!("frame received for data stream #{}", stream_index));
        }
    };
    if frame.is_video() != expected_video {
        return refuse(format!(
            "{} frame received for {} stream #{}",
            frame.kind(),
            kind.as_str(),
            stream_index
        ));
    }

    if let Some(&previous) = last_pts.get(&stream_index) {
        if raw.pts < previous {
            return refuse(format!(
                "out of order frame: pts {} after {}",
                raw.pts, previous
            ));
        }
    }
    last_pts.insert(stream_index, raw.pts);

    let result = guarded("process_frame", || {
        worker.process_frame(job_id, stream_index, &frame)
    })
    .unwrap_or_else(|e| ProcessResult::failure(e.to_string()));

    metrics::record_unit(frame.kind(), result.status);
    UnitResult {
        stream_index,
        pts: Some(raw.pts),
        result,
    }
}

fn deliver_cue<W: MediaWorker>(
    worker: &mut W,
    job_id: JobId,
    stream_index: usize,
    kind: StreamKind,
    ttml: &str,
) -> UnitResult {
    let result = if kind == StreamKind::Data {
        guarded("process_ebu_ttml_live", || {
            worker.process_ebu_ttml_live(job_id, stream_index, ttml)
        })
        .unwrap_or_else(|e| ProcessResult::failure(e.to_string()))
    } else {
        warn!(job_id = %job_id, stream_index, "Cue received for {} stream", kind.as_str());
        ProcessResult::failure(format!(
            "cue received for {} stream #{}",
            kind.as_str(),
            stream_index
        ))
    };

    metrics::record_unit("cue", result.status);
    UnitResult {
        stream_index,
        pts: None,
        result,
    }
}

/// Check registrations against this job's input, then sort them by stream
/// index; one registration per stream.
fn order_registrations(
    mut streams: Vec<StreamDescriptor>,
    format_context: &FormatContext,
) -> WorkerResult<Vec<StreamDescriptor>> {
    for stream in &streams {
        stream.validate(format_context)?;
    }
    streams.sort_by_key(StreamDescriptor::index);
    if let Some(pair) = streams.windows(2).find(|w| w[0].index() == w[1].index()) {
        return Err(WorkerError::stream_registration(format!(
            "stream #{} registered more than once",
            pair[0].index()
        )));
    }
    Ok(streams)
}

/// Run a worker callback, timing it and turning a panic into an error.
fn guarded<T>(callback: &'static str, f: impl FnOnce() -> WorkerResult<T>) -> WorkerResult<T> {
    let start = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(f));
    metrics::record_callback(callback, start.elapsed().as_secs_f64());

    outcome.unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!(callback, "Worker callback panicked: {}", message);
        Err(WorkerError::processing_failed(format!(
            "{} panicked: {}",
            callback, message
        )))
    })
}

fn into_initialization(e: WorkerError) -> WorkerError {
    match e.class() {
        ErrorClass::Initialization | ErrorClass::Configuration => e,
        _ => WorkerError::initialization_failed(e.to_string()),
    }
}
