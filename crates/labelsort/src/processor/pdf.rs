use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::document::DocumentPage;
use crate::error::ProcessError;
use crate::processor::{read_file, LoadedDocument, PageProcessor};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

pub struct PdfProcessor;

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageProcessor for PdfProcessor {
    fn read_pages(&self, path: &Path) -> Result<LoadedDocument, ProcessError> {
        let _span = tracing::info_span!("processor.pdf").entered();

        let bytes = read_file(path)?;
        let doc = Document::load_mem(&bytes)
            .map_err(|e| ProcessError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

        let pages = extract_page_texts(&doc);

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();

        Ok(LoadedDocument {
            filename,
            bytes,
            pages,
        })
    }

    fn write_pages(
        &self,
        source: &LoadedDocument,
        order: &[usize],
    ) -> Result<Vec<u8>, ProcessError> {
        let _span = tracing::info_span!("processor.pdf_write", pages = order.len()).entered();
        select_pages(&source.bytes, order)
    }
}

fn extract_page_texts(doc: &Document) -> Vec<DocumentPage> {
    doc.get_pages()
        .keys()
        .enumerate()
        .map(|(index, page_num)| {
            let text = match doc.extract_text(&[*page_num]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(page = index, "Text extraction failed: {}", e);
                    String::new()
                }
            };
            DocumentPage::new(index, text)
        })
        .collect()
}

/// Rebuild the page tree of `pdf_bytes` so it holds exactly the pages at `order`.
///
/// Every kept page is re-parented to the root page node with its inherited
/// attributes copied onto it; pages and objects no longer referenced are pruned.
pub fn select_pages(pdf_bytes: &[u8], order: &[usize]) -> Result<Vec<u8>, ProcessError> {
    let mut doc = Document::load_mem(pdf_bytes)
        .map_err(|e| ProcessError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let page_count = page_ids.len();

    let selected = order
        .iter()
        .map(|&index| {
            page_ids
                .get(index)
                .copied()
                .ok_or(ProcessError::PageOutOfRange { index, page_count })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let root_pages = root_pages_id(&doc)?;

    for &page_id in &selected {
        let inherited = inherited_attributes(&doc, page_id);
        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(pdf_error)?;
        for (key, value) in inherited {
            if !page.has(key) {
                page.set(key, value);
            }
        }
        page.set("Parent", Object::Reference(root_pages));
    }

    {
        let root = doc
            .get_object_mut(root_pages)
            .and_then(Object::as_dict_mut)
            .map_err(pdf_error)?;
        root.set(
            "Kids",
            Object::Array(selected.iter().map(|id| Object::Reference(*id)).collect()),
        );
        root.set("Count", Object::Integer(selected.len() as i64));
    }

    // Outline entries point at pages that may be gone.
    let catalog_id = catalog_id(&doc)?;
    if let Ok(catalog) = doc
        .get_object_mut(catalog_id)
        .and_then(Object::as_dict_mut)
    {
        catalog.remove(b"Outlines");
    }

    doc.prune_objects();

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| {
        ProcessError::PdfProcessing(format!("Failed to write PDF: {}", e))
    })?;
    Ok(out)
}

fn pdf_error(e: lopdf::Error) -> ProcessError {
    ProcessError::PdfProcessing(e.to_string())
}

fn catalog_id(doc: &Document) -> Result<ObjectId, ProcessError> {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(pdf_error)
}

fn root_pages_id(doc: &Document) -> Result<ObjectId, ProcessError> {
    let catalog = catalog_id(doc)?;
    doc.get_object(catalog)
        .and_then(Object::as_dict)
        .and_then(|dict| dict.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(pdf_error)
}

/// Inheritable attributes the page does not set itself, nearest ancestor first.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(&'static [u8], Object)> {
    let mut found: Vec<(&'static [u8], Object)> = Vec::new();
    let mut current = parent_of(doc, page_id);
    let mut depth = 0;

    while let Some(node_id) = current {
        // Guard against cyclic Parent chains in malformed files.
        depth += 1;
        if depth > 64 {
            break;
        }
        let Ok(node) = doc.get_object(node_id).and_then(Object::as_dict) else {
            break;
        };
        for key in INHERITABLE_KEYS {
            if found.iter().any(|(k, _)| *k == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                found.push((key, value.clone()));
            }
        }
        current = parent_of(doc, node_id);
    }

    found
}

fn parent_of(doc: &Document, id: ObjectId) -> Option<ObjectId> {
    doc.get_object(id)
        .and_then(Object::as_dict)
        .and_then(|dict| dict.get(b"Parent"))
        .and_then(Object::as_reference)
        .ok()
}
