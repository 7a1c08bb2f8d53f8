use serde::Serialize;

/// Phase of job processing.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Queued,
    ReadingManifest,
    BuildingManifest,
    ReadingDocument,
    Reconciling,
    Reordering,
    Rendering,
    Storing,
    Completed,
    Failed,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobPhase::Queued => write!(f, "Queued"),
            JobPhase::ReadingManifest => write!(f, "Reading manifest"),
            JobPhase::BuildingManifest => write!(f, "Building manifest"),
            JobPhase::ReadingDocument => write!(f, "Reading document"),
            JobPhase::Reconciling => write!(f, "Reconciling"),
            JobPhase::Reordering => write!(f, "Reordering pages"),
            JobPhase::Rendering => write!(f, "Rendering outputs"),
            JobPhase::Storing => write!(f, "Storing"),
            JobPhase::Completed => write!(f, "Completed"),
            JobPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Events emitted by the pipeline during processing.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Phase {
        phase: JobPhase,
        message: String,
    },
    Completed {
        orders: usize,
        pages: usize,
        outputs: Vec<String>,
    },
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Discards every event.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes events to the `log` facade, tagged with the job id.
pub struct LogProgress {
    job_id: String,
}

impl LogProgress {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase, message } => {
                log::debug!("[{}] {}: {}", self.job_id, phase, message);
            }
            ProgressEvent::Completed {
                orders,
                pages,
                outputs,
            } => {
                log::info!(
                    "[{}] {} ({} orders, {} pages): {}",
                    self.job_id,
                    JobPhase::Completed,
                    orders,
                    pages,
                    outputs.join(", ")
                );
            }
            ProgressEvent::Failed { error } => {
                log::error!("[{}] {}: {}", self.job_id, JobPhase::Failed, error);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every event for later inspection.
    #[derive(Default)]
    pub(crate) struct RecordingProgress {
        pub events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingProgress {
        pub fn phases(&self) -> Vec<JobPhase> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    ProgressEvent::Phase { phase, .. } => Some(*phase),
                    _ => None,
                })
                .collect()
        }
    }

    impl ProgressReporter for RecordingProgress {
        fn report(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(JobPhase::Reordering.to_string(), "Reordering pages");
        assert_eq!(JobPhase::Failed.to_string(), "Failed");
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        let json = serde_json::to_string(&JobPhase::ReadingManifest).unwrap();
        assert_eq!(json, "\"reading_manifest\"");
    }

    #[test]
    fn test_recording_progress_keeps_phase_order() {
        let progress = RecordingProgress::default();
        progress.report(ProgressEvent::Phase {
            phase: JobPhase::ReadingManifest,
            message: String::new(),
        });
        progress.report(ProgressEvent::Failed {
            error: "boom".into(),
        });
        progress.report(ProgressEvent::Phase {
            phase: JobPhase::Storing,
            message: String::new(),
        });

        assert_eq!(
            progress.phases(),
            vec![JobPhase::ReadingManifest, JobPhase::Storing]
        );
    }
}
