use std::sync::LazyLock;

use regex::Regex;

use crate::document::DocumentPage;

/// Number of digits in a marketplace order number.
pub const IDENTIFIER_DIGITS: usize = 11;

static RE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{11}").unwrap());

/// All order numbers in `text`, left to right, duplicates kept.
///
/// Matches do not overlap: a run of 12 digits yields its first 11.
pub fn extract_identifiers(text: &str) -> Vec<String> {
    RE_IDENTIFIER
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Identifiers of every page, concatenated in page order.
pub fn extract_from_pages(pages: &[DocumentPage]) -> Vec<String> {
    pages
        .iter()
        .flat_map(|page| extract_identifiers(&page.text))
        .collect()
}
