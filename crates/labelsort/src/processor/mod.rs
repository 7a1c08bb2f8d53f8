pub mod pdf;
pub mod xlsx;

use std::path::Path;

use crate::document::DocumentPage;
use crate::error::ProcessError;
use crate::manifest::{Manifest, RawTable};

/// Kinds of input a reconciliation job consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFormat {
    Spreadsheet,
    Pdf,
}

impl InputFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(InputFormat::Spreadsheet),
            "pdf" => Some(InputFormat::Pdf),
            _ => None,
        }
    }

    /// Detect by extension, falling back to the guessed MIME type.
    pub fn from_path(path: &Path) -> Option<Self> {
        if let Some(format) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
        {
            return Some(format);
        }

        let mime = mime_guess::from_path(path).first()?;
        match mime.essence_str() {
            "application/pdf" => Some(InputFormat::Pdf),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel"
            | "application/vnd.oasis.opendocument.spreadsheet" => Some(InputFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// A source document held in memory: its bytes plus the text of every page.
pub struct LoadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub pages: Vec<DocumentPage>,
}

impl LoadedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Reads manifest spreadsheets and writes the sorted manifest back out.
pub trait TableProcessor: Send + Sync {
    /// Rows of the manifest sheet with the header row already consumed.
    fn read_table(&self, path: &Path) -> Result<RawTable, ProcessError>;

    fn write_manifest(&self, manifest: &Manifest) -> Result<Vec<u8>, ProcessError>;
}

/// Reads label documents page by page and writes page selections.
pub trait PageProcessor: Send + Sync {
    fn read_pages(&self, path: &Path) -> Result<LoadedDocument, ProcessError>;

    /// A new document made of `source` pages at `order` (zero-based), in that order.
    fn write_pages(&self, source: &LoadedDocument, order: &[usize]) -> Result<Vec<u8>, ProcessError>;
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, ProcessError> {
    std::fs::read(path).map_err(|e| ProcessError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}
