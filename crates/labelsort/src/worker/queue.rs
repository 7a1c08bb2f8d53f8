use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error, info, warn};

use crate::error::WorkerError;
use crate::pipeline::progress::{JobPhase, LogProgress, ProgressEvent, ProgressReporter};
use crate::pipeline::{Pipeline, PipelineConfig, PipelineContext};
use crate::session::InputFiles;
use crate::worker::job::{Job, JobResult};

/// A job waiting for the worker.
///
/// Its inputs are only deleted once the worker has started it. Dropped without
/// being started, it leaves its files on disk for the next start.
struct QueuedJob {
    job: Job,
    inputs: Option<InputFiles>,
}

impl QueuedJob {
    fn new(job: Job) -> Self {
        let inputs = InputFiles::for_job(&job);
        Self {
            job,
            inputs: Some(inputs),
        }
    }

    /// Hand the job over for running; the returned guard deletes the inputs.
    fn start(mut self) -> (Job, Option<InputFiles>) {
        let inputs = self.inputs.take();
        (self.job.clone(), inputs)
    }
}

impl Drop for QueuedJob {
    fn drop(&mut self) {
        if let Some(inputs) = self.inputs.take() {
            inputs.keep();
        }
    }
}

/// Hands jobs to a [`JobQueue`]; cheap to clone into watcher callbacks.
#[derive(Clone)]
pub struct JobSubmitter {
    job_sender: Sender<QueuedJob>,
    shutdown: Arc<AtomicBool>,
}

impl JobSubmitter {
    /// Queue `job`. Its input files are deleted once the job has run, whatever
    /// the outcome.
    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.job_sender
            .send(QueuedJob::new(job))
            .map_err(|_| WorkerError::ChannelClosed)
    }
}

/// A single worker thread running jobs one after another.
pub struct JobQueue {
    submitter: JobSubmitter,
    result_receiver: Receiver<JobResult>,
    worker: JoinHandle<()>,
}

impl JobQueue {
    /// Start the worker. At most `capacity` jobs wait in line; `submit` blocks
    /// beyond that.
    pub fn new(config: Arc<PipelineConfig>, capacity: usize) -> Result<Self, WorkerError> {
        let (job_sender, job_receiver) = bounded::<QueuedJob>(capacity.max(1));
        let (result_sender, result_receiver) = unbounded::<JobResult>();
        let shutdown = Arc::new(AtomicBool::new(false));

        let shutdown_flag = Arc::clone(&shutdown);
        let worker = thread::Builder::new()
            .name("labelsort-worker".to_string())
            .spawn(move || run_worker(job_receiver, result_sender, shutdown_flag, config))
            .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

        info!("Started job worker (queue capacity {})", capacity.max(1));

        Ok(Self {
            submitter: JobSubmitter {
                job_sender,
                shutdown,
            },
            result_receiver,
            worker,
        })
    }

    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        self.submitter.submit(job)
    }

    pub fn submitter(&self) -> JobSubmitter {
        self.submitter.clone()
    }

    /// Results in completion order; the stream ends after the worker exits.
    pub fn results(&self) -> Receiver<JobResult> {
        self.result_receiver.clone()
    }

    pub fn try_recv_result(&self) -> Option<JobResult> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<JobResult> {
        self.result_receiver.recv().ok()
    }

    /// Stop accepting jobs. The job in progress finishes; queued ones are left
    /// untouched on disk.
    pub fn shutdown(&self) {
        info!("Shutting down job worker...");
        self.submitter.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.submitter.shutdown.load(Ordering::Relaxed)
    }

    /// Wait for the worker to exit. Without a prior [`shutdown`](Self::shutdown)
    /// every queued job runs first.
    pub fn wait(self) {
        drop(self.submitter);

        if let Err(e) = self.worker.join() {
            error!("Job worker panicked: {:?}", e);
        } else {
            debug!("Job worker finished");
        }
    }
}

fn run_worker(
    job_receiver: Receiver<QueuedJob>,
    result_sender: Sender<JobResult>,
    shutdown: Arc<AtomicBool>,
    config: Arc<PipelineConfig>,
) {
    debug!("Job worker started");

    let pipeline = Pipeline::from_config(config);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Job worker received shutdown signal");
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(queued) => {
                let (job, inputs) = queued.start();
                let result = run_job(&pipeline, job);
                drop(inputs);

                if let Err(e) = result_sender.send(result) {
                    error!("Job worker failed to send result: {}", e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Job channel disconnected");
                break;
            }
        }
    }

    for queued in job_receiver.try_iter() {
        debug!("Leaving job {} for the next start", queued.job.id);
    }

    debug!("Job worker stopped");
}

fn run_job(pipeline: &Pipeline, job: Job) -> JobResult {
    let progress = LogProgress::new(job.id.as_str());
    progress.report(ProgressEvent::Phase {
        phase: JobPhase::Queued,
        message: "Job picked up by worker".to_string(),
    });

    let mut ctx = PipelineContext::new(job);
    let outcome = pipeline.run(&mut ctx, &progress);

    for warning in &ctx.warnings {
        warn!("[{}] {}", ctx.job.id, warning);
    }
    if let Some(report) = &ctx.report {
        for line in report.summary_lines() {
            info!("[{}] {}", ctx.job.id, line);
        }
    }

    JobResult::from_outcome(&ctx.job, &outcome, ctx.warnings.len())
}
