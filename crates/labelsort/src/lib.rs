//! Reconciles a shipment order manifest with a PDF of shipping labels.
//!
//! The manifest is cleaned, aggregated per order and sorted; the label pages
//! are reordered to follow it. Both sides are cross-checked for order numbers
//! that only one of them mentions.

pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod processor;
pub mod reconcile;
pub mod sanitize;
pub mod session;
pub mod storage;
pub mod worker;

pub use config::{default_config_path, load_config, load_config_from_str, Config};
pub use error::{
    ConfigError, LabelsortError, ManifestError, ProcessError, Result, SessionError, StorageError,
    WorkerError,
};
pub use logging::LogFormat;
pub use manifest::{build_manifest, Manifest, ManifestLayout, ManifestRow};
pub use pipeline::{JobOutput, Pipeline, PipelineConfig, PipelineContext, PipelineError};
pub use reconcile::{reconcile, ReconciliationReport};
pub use worker::{InboxService, Job};
