use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use crate::config::Config;
use crate::error::{LabelsortError, StorageError};
use crate::pipeline::PipelineConfig;
use crate::session::{SessionEvent, SessionRegistry};
use crate::worker::job::JobResult;
use crate::worker::queue::{JobQueue, JobSubmitter};
use crate::worker::scanner::{InboxScanner, WatchTiming};

/// Jobs waiting behind the one in progress before `submit` blocks.
const QUEUE_CAPACITY: usize = 16;

/// The drop-folder service: pairs inputs per session and runs each pair.
pub struct InboxService {
    config: Config,
}

impl InboxService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Process what is already in the inbox, then watch it until `shutdown` is set.
    pub fn run(&self, shutdown: Arc<AtomicBool>) -> Result<(), LabelsortError> {
        let inbox = PathBuf::from(&self.config.inbox_directory);
        std::fs::create_dir_all(&inbox).map_err(|e| StorageError::CreateDirectory {
            path: inbox.clone(),
            source: e,
        })?;

        let pipeline_config = Arc::new(PipelineConfig::from_config(&self.config));
        let queue = JobQueue::new(pipeline_config, QUEUE_CAPACITY)?;

        let results = queue.results();
        let reporter = thread::Builder::new()
            .name("labelsort-results".to_string())
            .spawn(move || {
                for result in results.iter() {
                    log_result(&result);
                }
            })
            .map_err(|e| crate::error::WorkerError::SpawnFailed(e.to_string()))?;

        let registry = Arc::new(Mutex::new(SessionRegistry::new()));
        let scanner = InboxScanner::new(&inbox);

        let submitter = queue.submitter();
        for (session, path) in scanner.scan()? {
            dispatch(&registry, &submitter, &session, path);
        }

        let timing = WatchTiming {
            poll_interval: Duration::from_millis(self.config.watch.poll_interval_ms),
            debounce: Duration::from_millis(self.config.watch.debounce_ms),
        };
        let watch_registry = Arc::clone(&registry);
        let watch_submitter = queue.submitter();
        let watched = scanner.watch(
            timing,
            move |session, path| dispatch(&watch_registry, &watch_submitter, &session, path),
            shutdown,
        );

        queue.shutdown();
        queue.wait();
        if reporter.join().is_err() {
            error!("Result reporter panicked");
        }

        watched.map_err(LabelsortError::from)
    }
}

/// Offer a file to its session and queue the job once the pair is complete.
pub fn dispatch(
    registry: &Mutex<SessionRegistry>,
    submitter: &JobSubmitter,
    session: &str,
    path: PathBuf,
) {
    let event = {
        let mut registry = registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        registry.offer(session, path)
    };

    match event {
        Ok(SessionEvent::Ready(job)) => {
            info!("Session '{}' ready, queueing job {}", session, job.id);
            if let Err(e) = submitter.submit(job) {
                error!("Failed to queue job for session '{}': {}", session, e);
            }
        }
        Ok(SessionEvent::Waiting { missing, replaced }) => {
            if let Some(old) = replaced {
                info!("Session '{}' replaced {}", session, old.display());
            }
            info!("Session '{}' waiting for {:?} input", session, missing);
        }
        Err(e) => warn!("Session '{}': {}", session, e),
    }
}

fn log_result(result: &JobResult) {
    let session = result.session.as_deref().unwrap_or("-");
    if result.success {
        info!(
            "Job {} (session '{}') done with {} warning(s): {}",
            result.job_id,
            session,
            result.warnings,
            result
                .output_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    } else {
        error!(
            "Job {} (session '{}') failed: {}",
            result.job_id,
            session,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}
