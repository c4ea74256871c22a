//! Multi-instance worker pool.
//!
//! Each instance is a separate [`WorkerHost`] built from the factory, with its
//! own logging dispatch, running on a blocking thread. Instances pull jobs
//! from one shared queue, so a job is always handled by a single instance
//! from admission to `ending_process`.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc as async_mpsc, watch};
use tracing::{error, info, warn};
use uuid::Uuid;

use mworker_models::JobId;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::host::{AbandonHandle, JobReport, WorkerHost};
use crate::replay::JobReplay;
use crate::worker::MediaWorker;

type JobQueue = Arc<Mutex<mpsc::Receiver<(usize, JobReplay)>>>;

/// Outcome of one job run by the pool.
#[derive(Debug)]
pub struct PoolOutcome {
    /// Position of the job in the submitted list
    pub index: usize,
    pub job_id: JobId,
    /// Name of the instance that ran the job
    pub instance: String,
    pub report: WorkerResult<JobReport>,
}

/// Runs jobs over up to `max_concurrent_instances` worker instances.
pub struct WorkerPool<F> {
    config: WorkerConfig,
    factory: Arc<F>,
    shutdown: watch::Sender<bool>,
    abandon: AbandonHandle,
}

impl<F, W> WorkerPool<F>
where
    F: Fn() -> W + Send + Sync + 'static,
    W: MediaWorker + 'static,
{
    pub fn new(config: WorkerConfig, factory: F) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            factory: Arc::new(factory),
            shutdown,
            abandon: AbandonHandle::new(),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Abandon running jobs and stop taking queued ones.
    ///
    /// Jobs that were never started are left out of the outcomes.
    pub fn shutdown(&self) {
        info!("Shutting down worker pool");
        self.shutdown.send_replace(true);
        self.abandon.abandon();
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Run every job and return the outcomes in submission order.
    ///
    /// Fails only when no instance could be loaded.
    pub async fn run(&self, jobs: Vec<JobReplay>) -> WorkerResult<Vec<PoolOutcome>> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let instances = self.config.max_concurrent_instances.min(jobs.len()).max(1);
        info!(
            "Starting worker pool with {} instance(s) for {} job(s)",
            instances,
            jobs.len()
        );

        let (job_tx, job_rx) = mpsc::channel();
        for (index, job) in jobs.into_iter().enumerate() {
            // receiver is alive until the instances are spawned
            let _ = job_tx.send((index, job));
        }
        drop(job_tx);
        let queue: JobQueue = Arc::new(Mutex::new(job_rx));

        let (result_tx, mut result_rx) = async_mpsc::unbounded_channel();

        let mut handles = Vec::with_capacity(instances);
        for _ in 0..instances {
            let name = format!("worker-{}", Uuid::new_v4());
            let factory = Arc::clone(&self.factory);
            let config = self.config.clone();
            let abandon = self.abandon.clone();
            let shutdown = self.shutdown.subscribe();
            let queue = Arc::clone(&queue);
            let results = result_tx.clone();

            handles.push(tokio::task::spawn_blocking(move || {
                run_instance(name, factory, config, abandon, shutdown, queue, results)
            }));
        }
        drop(result_tx);

        let mut loaded = 0;
        let mut first_error = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(processed)) => {
                    loaded += 1;
                    info!("Worker instance finished after {} job(s)", processed);
                }
                Ok(Err(e)) => {
                    error!("Worker instance failed to load: {}", e);
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    error!("Worker instance task failed: {}", e);
                    first_error
                        .get_or_insert_with(|| WorkerError::initialization_failed(e.to_string()));
                }
            }
        }

        if loaded == 0 {
            return Err(first_error
                .unwrap_or_else(|| WorkerError::initialization_failed("no worker instance")));
        }

        let mut outcomes = Vec::new();
        while let Some(outcome) = result_rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes.sort_by_key(|o| o.index);

        Ok(outcomes)
    }
}

fn run_instance<F, W>(
    name: String,
    factory: Arc<F>,
    config: WorkerConfig,
    abandon: AbandonHandle,
    shutdown: watch::Receiver<bool>,
    queue: JobQueue,
    results: async_mpsc::UnboundedSender<PoolOutcome>,
) -> WorkerResult<usize>
where
    F: Fn() -> W,
    W: MediaWorker,
{
    let mut host = WorkerHost::load_with_abandon(factory(), config, abandon)?;
    info!(instance = %name, worker = %host.descriptor().name, "Worker instance ready");

    let mut processed = 0;
    loop {
        if *shutdown.borrow() {
            warn!(instance = %name, "Shutdown requested, leaving queued jobs");
            break;
        }

        let next = match queue.lock() {
            Ok(rx) => rx.recv().ok(),
            Err(_) => None,
        };
        let Some((index, replay)) = next else {
            break;
        };

        let job_id = replay.job.job_id;
        let report = host.run_replay(replay);
        processed += 1;

        let outcome = PoolOutcome {
            index,
            job_id,
            instance: name.clone(),
            report,
        };
        if results.send(outcome).is_err() {
            break;
        }
    }

    Ok(processed)
}
