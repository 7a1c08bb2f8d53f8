use serde::{Deserialize, Serialize};

use crate::manifest::{ColumnLayout, ManifestLayout};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub inbox_directory: String,
    pub outbox_directory: String,
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            inbox_directory: "inbox".to_string(),
            outbox_directory: "outbox".to_string(),
            manifest: ManifestConfig::default(),
            output: OutputConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

/// Where the manifest sheet keeps its data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Worksheet name; the first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub columns: ColumnLayout,
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
}

fn default_skip_rows() -> usize {
    1
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            sheet: None,
            columns: ColumnLayout::default(),
            skip_rows: default_skip_rows(),
        }
    }
}

impl ManifestConfig {
    pub fn layout(&self) -> ManifestLayout {
        ManifestLayout {
            columns: self.columns,
            skip_rows: self.skip_rows,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_manifest_filename")]
    pub manifest_filename: String,
    #[serde(default = "default_document_filename")]
    pub document_filename: String,
    /// JSON reconciliation report; not written when absent.
    #[serde(default)]
    pub report_filename: Option<String>,
}

fn default_manifest_filename() -> String {
    "sorted_shipment_orders_table.xlsx".to_string()
}

fn default_document_filename() -> String {
    "sorted_shipment_orders_labels_final_corrected.pdf".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            manifest_filename: default_manifest_filename(),
            document_filename: default_document_filename(),
            report_filename: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}
