//! Label document handling: identifier extraction and page reordering.

pub mod identifiers;
pub mod reorder;

pub use identifiers::{extract_from_pages, extract_identifiers, IDENTIFIER_DIGITS};
pub use reorder::{assign_pages, PageAssignment};

/// Text of one page of the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPage {
    /// Zero-based position in the source document.
    pub index: usize,
    pub text: String,
}

impl DocumentPage {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.text.contains(order_id)
    }
}
