use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::document::{assign_pages, extract_from_pages, PageAssignment};
use crate::manifest::{build_manifest, Manifest, NormalizedManifest};
use crate::processor::pdf::PdfProcessor;
use crate::processor::xlsx::XlsxProcessor;
use crate::processor::{LoadedDocument, PageProcessor, TableProcessor};
use crate::reconcile::{reconcile, ReconciliationReport};
use crate::sanitize;
use crate::storage::FileStorage;

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::{PipelineError, PipelineWarning};
use super::progress::{JobPhase, ProgressEvent, ProgressReporter};

/// What a successful job delivered.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutput {
    pub job_id: String,
    pub manifest_path: PathBuf,
    pub document_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub order_count: usize,
    pub placeholder_count: usize,
    pub source_page_count: usize,
    pub output_page_count: usize,
    pub reconciliation: ReconciliationReport,
}

impl JobOutput {
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.manifest_path.clone(), self.document_path.clone()];
        paths.extend(self.report_path.clone());
        paths
    }
}

/// Output files rendered in memory, not yet written anywhere.
struct RenderedOutputs {
    manifest: Vec<u8>,
    document: Vec<u8>,
    report: Option<Vec<u8>>,
    output_page_count: usize,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    job_id: &'a str,
    generated_at: DateTime<Utc>,
    manifest_file: String,
    document_file: String,
    active_orders: usize,
    cancellation_placeholders: usize,
    discarded_rows: usize,
    source_pages: usize,
    output_pages: usize,
    reconciliation: &'a ReconciliationReport,
    assignment: &'a PageAssignment,
    warnings: &'a [PipelineWarning],
}

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    tables: Box<dyn TableProcessor>,
    pages: Box<dyn PageProcessor>,
    storage: FileStorage,
}

impl Pipeline {
    /// Spreadsheet and PDF processors, writing under the configured output directory.
    pub fn from_config(config: Arc<PipelineConfig>) -> Self {
        let tables = Box::new(XlsxProcessor::new(config.sheet.clone()));
        let pages = Box::new(PdfProcessor::new());
        let storage = FileStorage::new(&config.output_directory);

        Self {
            config,
            tables,
            pages,
            storage,
        }
    }

    /// Pipeline over caller-supplied readers and writers.
    pub fn new(
        config: Arc<PipelineConfig>,
        tables: Box<dyn TableProcessor>,
        pages: Box<dyn PageProcessor>,
        storage: FileStorage,
    ) -> Self {
        Self {
            config,
            tables,
            pages,
            storage,
        }
    }

    /// Run one job end to end. Every step's result is kept on `ctx`.
    ///
    /// Outputs are rendered completely before the first file is written, so a
    /// failing job stores nothing.
    pub fn run(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<JobOutput, PipelineError> {
        let manifest_name = sanitize::redact_path(&ctx.job.manifest_path);
        let document_name = sanitize::redact_path(&ctx.job.document_path);
        let _pipeline_span = info_span!("pipeline",
            job_id = %ctx.job.id,
            manifest = %manifest_name,
            document = %document_name,
            session = ctx.job.session.as_deref().unwrap_or("none"),
        )
        .entered();

        match self.run_steps(ctx, progress) {
            Ok(output) => {
                info!(
                    orders = output.order_count,
                    pages = output.output_page_count,
                    warnings = ctx.warnings.len(),
                    "Job completed"
                );
                progress.report(ProgressEvent::Completed {
                    orders: output.order_count,
                    pages: output.output_page_count,
                    outputs: output
                        .paths()
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect(),
                });
                ctx.output = Some(output.clone());
                Ok(output)
            }
            Err(e) => {
                progress.report(ProgressEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn run_steps(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<JobOutput, PipelineError> {
        let manifest = {
            let _step = info_span!("build_manifest").entered();
            phase(progress, JobPhase::ReadingManifest, "Reading manifest spreadsheet...");
            let table = self.tables.read_table(&ctx.job.manifest_path)?;
            phase(progress, JobPhase::BuildingManifest, "Normalizing and sorting orders...");
            self.step_build_manifest(ctx, &table)?
        };

        let document = {
            let _step = info_span!("read_document").entered();
            phase(progress, JobPhase::ReadingDocument, "Extracting label text...");
            self.step_read_document(ctx)?
        };

        {
            let _step = info_span!("reconcile").entered();
            phase(progress, JobPhase::Reconciling, "Comparing order numbers...");
            self.step_reconcile(ctx, &manifest);
        }

        let assignment = {
            let _step = info_span!("reorder").entered();
            phase(progress, JobPhase::Reordering, "Matching labels to orders...");
            self.step_reorder(ctx, &manifest, &document)
        };

        let rendered = {
            let _step = info_span!("render").entered();
            phase(progress, JobPhase::Rendering, "Rendering outputs...");
            self.step_render(ctx, &manifest, &document, &assignment)?
        };

        let _step = info_span!("store").entered();
        phase(progress, JobPhase::Storing, "Storing outputs...");
        self.step_store(ctx, &manifest, rendered)
    }

    fn step_build_manifest(
        &self,
        ctx: &mut PipelineContext,
        table: &crate::manifest::RawTable,
    ) -> Result<Manifest, PipelineError> {
        let (manifest, normalized) = build_manifest(table, &self.config.layout)?;

        ctx.warnings.extend(quantity_warnings(&normalized));
        debug!(
            rows = normalized.total_rows(),
            active = normalized.active.len(),
            cancelled = normalized.cancelled.len(),
            discarded = normalized.discarded,
            "Normalized manifest"
        );

        ctx.normalized = Some(normalized);
        ctx.manifest = Some(manifest.clone());
        Ok(manifest)
    }

    fn step_read_document(&self, ctx: &mut PipelineContext) -> Result<LoadedDocument, PipelineError> {
        let document = self.pages.read_pages(&ctx.job.document_path)?;

        ctx.source_page_count = document.page_count();
        ctx.document_ids = extract_from_pages(&document.pages);
        debug!(
            pages = document.page_count(),
            identifiers = ctx.document_ids.len(),
            "Read document"
        );

        Ok(document)
    }

    fn step_reconcile(&self, ctx: &mut PipelineContext, manifest: &Manifest) {
        let report = reconcile(&manifest.active_order_ids(), &ctx.document_ids);
        report.log();
        ctx.report = Some(report);
    }

    fn step_reorder(
        &self,
        ctx: &mut PipelineContext,
        manifest: &Manifest,
        document: &LoadedDocument,
    ) -> PageAssignment {
        let assignment = assign_pages(&manifest.active_order_ids(), &document.pages);

        ctx.warnings.extend(
            assignment
                .unresolved
                .iter()
                .map(|order_id| PipelineWarning::UnresolvedOrder {
                    order_id: order_id.clone(),
                }),
        );
        ctx.warnings.extend(
            assignment
                .unmatched_pages(document.page_count())
                .into_iter()
                .map(|index| PipelineWarning::UnmatchedPage { index }),
        );

        ctx.assignment = Some(assignment.clone());
        assignment
    }

    fn step_render(
        &self,
        ctx: &PipelineContext,
        manifest: &Manifest,
        document: &LoadedDocument,
        assignment: &PageAssignment,
    ) -> Result<RenderedOutputs, PipelineError> {
        let page_order = assignment.page_order();

        let manifest_bytes = self.tables.write_manifest(manifest)?;
        let document_bytes = self.pages.write_pages(document, &page_order)?;

        let report = match &self.config.report_filename {
            Some(_) => {
                let empty = ReconciliationReport::default();
                let doc = ReportDocument {
                    job_id: &ctx.job.id,
                    generated_at: Utc::now(),
                    manifest_file: sanitize::redact_path(&ctx.job.manifest_path),
                    document_file: sanitize::redact_path(&ctx.job.document_path),
                    active_orders: manifest.active_count(),
                    cancellation_placeholders: manifest.placeholder_count(),
                    discarded_rows: ctx.normalized.as_ref().map_or(0, |n| n.discarded),
                    source_pages: document.page_count(),
                    output_pages: page_order.len(),
                    reconciliation: ctx.report.as_ref().unwrap_or(&empty),
                    assignment,
                    warnings: &ctx.warnings,
                };
                Some(serde_json::to_vec_pretty(&doc)?)
            }
            None => None,
        };

        Ok(RenderedOutputs {
            manifest: manifest_bytes,
            document: document_bytes,
            report,
            output_page_count: page_order.len(),
        })
    }

    fn step_store(
        &self,
        ctx: &PipelineContext,
        manifest: &Manifest,
        rendered: RenderedOutputs,
    ) -> Result<JobOutput, PipelineError> {
        let directory = ctx.job.output_subdirectory();

        let mut outputs: Vec<(&[u8], &str)> = vec![
            (rendered.manifest.as_slice(), self.config.manifest_filename.as_str()),
            (rendered.document.as_slice(), self.config.document_filename.as_str()),
        ];
        if let (Some(bytes), Some(filename)) = (&rendered.report, &self.config.report_filename) {
            outputs.push((bytes.as_slice(), filename.as_str()));
        }

        let paths = self.storage.store_all(&outputs, directory)?;
        let manifest_path = paths[0].clone();
        let document_path = paths[1].clone();
        let report_path = paths.get(2).cloned();

        debug!(
            "Stored {} and {}",
            sanitize::redact_path(&manifest_path),
            sanitize::redact_path(&document_path)
        );

        Ok(JobOutput {
            job_id: ctx.job.id.clone(),
            manifest_path,
            document_path,
            report_path,
            order_count: manifest.active_count(),
            placeholder_count: manifest.placeholder_count(),
            source_page_count: ctx.source_page_count,
            output_page_count: rendered.output_page_count,
            reconciliation: ctx.report.clone().unwrap_or_default(),
        })
    }
}

fn phase(progress: &dyn ProgressReporter, phase: JobPhase, message: &str) {
    progress.report(ProgressEvent::Phase {
        phase,
        message: message.to_string(),
    });
}

fn quantity_warnings(normalized: &NormalizedManifest) -> impl Iterator<Item = PipelineWarning> + '_ {
    normalized
        .warnings
        .iter()
        .map(|w| PipelineWarning::UnparseableQuantity {
            row_index: w.row_index,
            order_id: w.order_id.clone(),
            raw: w.raw.clone(),
        })
}
