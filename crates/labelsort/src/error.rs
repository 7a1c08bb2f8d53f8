use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelsortError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Job failed: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid column layout: {reason}")]
    InvalidLayout { reason: String },
}

#[derive(Error, Debug)]
pub enum ManifestError {
    /// The table does not carry all four required columns.
    #[error("Manifest has {width} column(s), '{column}' expected at position {position}")]
    Schema {
        column: &'static str,
        position: usize,
        width: usize,
    },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read spreadsheet: {0}")]
    SpreadsheetRead(String),

    #[error("Failed to write spreadsheet: {0}")]
    SpreadsheetWrite(String),

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Page index {index} out of range for a {page_count}-page document")]
    PageOutOfRange { index: usize, page_count: usize },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unsupported input '{path}': only spreadsheets and PDF documents are accepted")]
    UnsupportedInput { path: PathBuf },

    #[error("Input file does not exist: {0}")]
    MissingInput(PathBuf),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Watch error: {0}")]
    WatchError(String),
}

pub type Result<T> = std::result::Result<T, LabelsortError>;
