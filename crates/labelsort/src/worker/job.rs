use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::pipeline::{JobOutput, PipelineError};

/// Session of files dropped directly into the inbox root.
pub const DEFAULT_SESSION: &str = "default";

/// One reconciliation: a manifest spreadsheet and the label document it describes.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    /// Transport session that assembled the pair; outputs land in a directory of
    /// the same name. `None` for one-shot jobs.
    pub session: Option<String>,
    pub manifest_path: PathBuf,
    pub document_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl Job {
    fn new_internal(
        session: Option<String>,
        manifest_path: PathBuf,
        document_path: PathBuf,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session,
            manifest_path,
            document_path,
            created_at: Utc::now(),
        }
    }

    /// A one-shot job whose outputs go straight into the output directory.
    pub fn new(manifest_path: PathBuf, document_path: PathBuf) -> Self {
        Self::new_internal(None, manifest_path, document_path)
    }

    pub fn for_session(
        session: impl Into<String>,
        manifest_path: PathBuf,
        document_path: PathBuf,
    ) -> Self {
        Self::new_internal(Some(session.into()), manifest_path, document_path)
    }

    /// Output directory relative to the storage root.
    pub fn output_subdirectory(&self) -> &str {
        self.session.as_deref().unwrap_or("")
    }
}

#[derive(Debug)]
pub struct JobResult {
    pub job_id: String,
    pub session: Option<String>,
    pub success: bool,
    pub output_paths: Vec<PathBuf>,
    pub warnings: usize,
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl JobResult {
    pub fn success(job: &Job, output: &JobOutput, warnings: usize) -> Self {
        Self {
            job_id: job.id.clone(),
            session: job.session.clone(),
            success: true,
            output_paths: output.paths(),
            warnings,
            error: None,
            finished_at: Utc::now(),
        }
    }

    pub fn failure(job: &Job, error: String) -> Self {
        Self {
            job_id: job.id.clone(),
            session: job.session.clone(),
            success: false,
            output_paths: vec![],
            warnings: 0,
            error: Some(error),
            finished_at: Utc::now(),
        }
    }

    pub fn from_outcome(job: &Job, outcome: &Result<JobOutput, PipelineError>, warnings: usize) -> Self {
        match outcome {
            Ok(output) => Self::success(job, output, warnings),
            Err(e) => Self::failure(job, e.to_string()),
        }
    }

    pub fn duration_ms(&self, job: &Job) -> i64 {
        (self.finished_at - job.created_at).num_milliseconds()
    }
}
