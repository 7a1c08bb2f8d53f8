use std::path::PathBuf;

use crate::config::{Config, ManifestConfig, OutputConfig};
use crate::manifest::ManifestLayout;

pub struct PipelineConfig {
    pub output_directory: PathBuf,
    /// Manifest worksheet; the first sheet when `None`.
    pub sheet: Option<String>,
    pub layout: ManifestLayout,
    pub manifest_filename: String,
    pub document_filename: String,
    pub report_filename: Option<String>,
}

impl PipelineConfig {
    /// Default layout and output names, writing into `output_directory`.
    pub fn new<P: Into<PathBuf>>(output_directory: P) -> Self {
        Self::from_parts(
            output_directory.into(),
            &ManifestConfig::default(),
            &OutputConfig::default(),
        )
    }

    pub fn from_config(config: &Config) -> Self {
        Self::from_parts(
            PathBuf::from(&config.outbox_directory),
            &config.manifest,
            &config.output,
        )
    }

    fn from_parts(output_directory: PathBuf, manifest: &ManifestConfig, output: &OutputConfig) -> Self {
        Self {
            output_directory,
            sheet: manifest.sheet.clone(),
            layout: manifest.layout(),
            manifest_filename: output.manifest_filename.clone(),
            document_filename: output.document_filename.clone(),
            report_filename: output.report_filename.clone(),
        }
    }
}
