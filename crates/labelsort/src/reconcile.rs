//! Cross-check of manifest order ids against identifiers found in the document.
//!
//! Advisory only: the report never blocks page reordering.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    /// In the manifest, not found anywhere in the document.
    pub missing_from_document: BTreeSet<String>,
    /// Found in the document, not listed as an active manifest order.
    pub missing_from_manifest: BTreeSet<String>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.missing_from_document.is_empty() && self.missing_from_manifest.is_empty()
    }

    /// Log each non-empty set once.
    pub fn log(&self) {
        if !self.missing_from_document.is_empty() {
            warn!(
                count = self.missing_from_document.len(),
                ids = ?self.missing_from_document,
                "Manifest orders missing from the document"
            );
        }
        if !self.missing_from_manifest.is_empty() {
            warn!(
                count = self.missing_from_manifest.len(),
                ids = ?self.missing_from_manifest,
                "Document identifiers missing from the manifest"
            );
        }
    }

    /// Human-readable lines; empty when both sets are empty.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.missing_from_document.is_empty() {
            lines.push(format!(
                "Orders in the manifest but not in the document: {}",
                join(&self.missing_from_document)
            ));
        }
        if !self.missing_from_manifest.is_empty() {
            lines.push(format!(
                "Orders in the document but not in the manifest: {}",
                join(&self.missing_from_manifest)
            ));
        }
        lines
    }
}

fn join(ids: &BTreeSet<String>) -> String {
    ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

pub fn reconcile<M, D>(manifest_ids: &[M], document_ids: &[D]) -> ReconciliationReport
where
    M: AsRef<str>,
    D: AsRef<str>,
{
    let manifest: BTreeSet<&str> = manifest_ids
        .iter()
        .map(AsRef::as_ref)
        .filter(|id| !id.is_empty())
        .collect();
    let document: BTreeSet<&str> = document_ids.iter().map(AsRef::as_ref).collect();

    ReconciliationReport {
        missing_from_document: manifest
            .difference(&document)
            .map(|id| id.to_string())
            .collect(),
        missing_from_manifest: document
            .difference(&manifest)
            .map(|id| id.to_string())
            .collect(),
    }
}
