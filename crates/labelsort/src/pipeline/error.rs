use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Manifest rejected: {0}")]
    Manifest(#[from] crate::error::ManifestError),

    #[error("Document processing failed: {0}")]
    Processing(#[from] crate::error::ProcessError),

    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Non-fatal findings; the job still produces its outputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    UnparseableQuantity {
        row_index: usize,
        order_id: String,
        raw: String,
    },
    UnresolvedOrder {
        order_id: String,
    },
    UnmatchedPage {
        index: usize,
    },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::UnparseableQuantity {
                row_index,
                order_id,
                raw,
            } => write!(
                f,
                "row {}: quantity '{}' of order {} is not a number",
                row_index, raw, order_id
            ),
            PipelineWarning::UnresolvedOrder { order_id } => {
                write!(f, "order {} has no page in the document", order_id)
            }
            PipelineWarning::UnmatchedPage { index } => {
                write!(f, "page {} matches no order and was dropped", index + 1)
            }
        }
    }
}
