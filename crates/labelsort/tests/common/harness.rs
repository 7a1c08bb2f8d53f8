//! Test harness for isolated job execution.
//!
//! `TestHarness` owns a temporary directory with an input and an output folder,
//! runs jobs through the real spreadsheet and PDF processors, and reads the
//! written outputs back for assertions.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use calamine::{open_workbook_auto, Reader};
use lopdf::Document;
use tempfile::TempDir;

use labelsort::pipeline::{NoopProgress, PipelineConfig};
use labelsort::{Job, JobOutput, Pipeline, PipelineContext, PipelineError};

use super::builders::{label_pdf, ManifestBuilder};

pub struct TestHarness {
    temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input_dir = temp_dir.path().join("input");
        let output_dir = temp_dir.path().join("output");
        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");

        Self {
            temp_dir,
            input_dir,
            output_dir,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_manifest(&self, filename: &str, manifest: &ManifestBuilder) -> PathBuf {
        let path = self.input_dir.join(filename);
        manifest.write(&path);
        path
    }

    pub fn write_labels(&self, filename: &str, texts: &[&str]) -> PathBuf {
        let path = self.input_dir.join(filename);
        std::fs::write(&path, label_pdf(texts)).expect("Failed to write labels");
        path
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::new(&self.output_dir)
    }

    /// Run a one-shot job with the default configuration.
    pub fn run(
        &self,
        manifest: &Path,
        document: &Path,
    ) -> (Result<JobOutput, PipelineError>, PipelineContext) {
        self.run_with(self.config(), Job::new(manifest.into(), document.into()))
    }

    pub fn run_with(
        &self,
        config: PipelineConfig,
        job: Job,
    ) -> (Result<JobOutput, PipelineError>, PipelineContext) {
        let pipeline = Pipeline::from_config(Arc::new(config));
        let mut ctx = PipelineContext::new(job);
        let result = pipeline.run(&mut ctx, &NoopProgress);
        (result, ctx)
    }

    /// Every file below the output directory, sorted.
    pub fn output_files(&self) -> Vec<PathBuf> {
        if !self.output_dir.exists() {
            return Vec::new();
        }
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&self.output_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }
}

/// Rows of the first sheet of a written manifest, header included.
pub fn read_manifest_rows(path: &Path) -> Vec<Vec<String>> {
    let mut workbook = open_workbook_auto(path).expect("Failed to open output manifest");
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .expect("Output manifest has no sheet");
    let range = workbook
        .worksheet_range(&sheet)
        .expect("Failed to read output sheet");

    range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

/// Extracted text of every page of a written PDF.
pub fn read_page_texts(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("Failed to load output PDF");
    let pages = doc.get_pages();
    pages
        .keys()
        .map(|number| doc.extract_text(&[*number]).unwrap_or_default())
        .collect()
}
