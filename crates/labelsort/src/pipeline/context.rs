use crate::document::PageAssignment;
use crate::manifest::{Manifest, NormalizedManifest};
use crate::reconcile::ReconciliationReport;
use crate::worker::job::Job;

use super::error::PipelineWarning;
use super::runner::JobOutput;

pub struct PipelineContext {
    // Input
    pub job: Job,

    // Set by step_build_manifest
    pub normalized: Option<NormalizedManifest>,
    pub manifest: Option<Manifest>,

    // Set by step_read_document
    pub source_page_count: usize,
    pub document_ids: Vec<String>,

    // Set by step_reconcile
    pub report: Option<ReconciliationReport>,

    // Set by step_reorder
    pub assignment: Option<PageAssignment>,

    // Set once outputs are stored
    pub output: Option<JobOutput>,

    // Non-fatal warnings
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            normalized: None,
            manifest: None,
            source_page_count: 0,
            document_ids: Vec::new(),
            report: None,
            assignment: None,
            output: None,
            warnings: Vec::new(),
        }
    }
}
