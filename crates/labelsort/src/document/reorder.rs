use serde::Serialize;
use tracing::{debug, warn};

use crate::document::DocumentPage;

/// Result of matching manifest order ids to document pages.
///
/// Each page index appears at most once in `assignments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageAssignment {
    /// `(order_id, page_index)` in manifest order.
    pub assignments: Vec<(String, usize)>,
    /// Order ids for which no unconsumed page contained the id.
    pub unresolved: Vec<String>,
}

impl PageAssignment {
    /// Page indices in output order.
    pub fn page_order(&self) -> Vec<usize> {
        self.assignments.iter().map(|(_, page)| *page).collect()
    }

    pub fn page_for(&self, order_id: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|(id, _)| id == order_id)
            .map(|(_, page)| *page)
    }

    /// Pages of a `page_count`-page document that no order claimed.
    pub fn unmatched_pages(&self, page_count: usize) -> Vec<usize> {
        let mut claimed = vec![false; page_count];
        for (_, page) in &self.assignments {
            if let Some(slot) = claimed.get_mut(*page) {
                *slot = true;
            }
        }
        claimed
            .iter()
            .enumerate()
            .filter(|(_, c)| !**c)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Greedy first-fit assignment of pages to order ids.
///
/// For each id in turn, the first page (by index) that has not been taken yet and
/// whose text contains the id wins. Scans every page per order id.
pub fn assign_pages<S: AsRef<str>>(order_ids: &[S], pages: &[DocumentPage]) -> PageAssignment {
    let mut consumed = vec![false; pages.len()];
    let mut result = PageAssignment::default();

    for order_id in order_ids {
        let order_id = order_id.as_ref();
        let hit = pages
            .iter()
            .enumerate()
            .find(|(slot, page)| !consumed[*slot] && page.contains(order_id));

        match hit {
            Some((slot, page)) => {
                consumed[slot] = true;
                debug!(order_id, page = page.index, "Assigned page");
                result.assignments.push((order_id.to_string(), page.index));
            }
            None => {
                warn!(order_id, "No page found for order");
                result.unresolved.push(order_id.to_string());
            }
        }
    }

    result
}
