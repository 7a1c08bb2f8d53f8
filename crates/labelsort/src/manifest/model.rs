use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

use serde::Serialize;

/// Status value marking a row cancelled while the marketplace was processing it.
pub const CANCELLED_STATUS: &str = "Отменён в процессе обработки";

/// Status written for every aggregated order.
pub const READY_STATUS: &str = "Готов к отправке";

/// Separator between `sku — qty` pairs in an item summary.
pub const ITEM_SEPARATOR: &str = ", ";

/// Output column headers, in order.
pub const OUTPUT_HEADERS: [&str; 3] = ["Номер заказа", "Артикулы с количеством", "Статус заказа"];

/// Cell contents of a spreadsheet after the header row has been consumed.
///
/// `None` is an empty cell. `width` counts columns from column A to the last used
/// one, which may exceed the length of individual rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub width: usize,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self { width, rows }
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }
}

/// The four manifest columns of one raw row, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub order_id: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<String>,
    pub status: Option<String>,
}

impl RawRow {
    pub fn has_nulls(&self) -> bool {
        self.order_id.is_none()
            || self.sku.is_none()
            || self.quantity.is_none()
            || self.status.is_none()
    }
}

/// Quantity of a line item, decided once during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Quantity {
    Value(f64),
    Unparseable,
}

impl Quantity {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Quantity::Value(v),
            _ => Quantity::Unparseable,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Quantity::Value(v) => Some(*v),
            Quantity::Unparseable => None,
        }
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, Quantity::Unparseable)
    }

    /// Ascending order with unparseable quantities after every number.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Quantity::Value(a), Quantity::Value(b)) => a.total_cmp(b),
            (Quantity::Value(_), Quantity::Unparseable) => Ordering::Less,
            (Quantity::Unparseable, Quantity::Value(_)) => Ordering::Greater,
            (Quantity::Unparseable, Quantity::Unparseable) => Ordering::Equal,
        }
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Quantity::Value(a), Quantity::Value(b)) => Quantity::Value(a + b),
            _ => Quantity::Unparseable,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole units; fractional quantities are truncated.
            Quantity::Value(v) => write!(f, "{}", v.trunc() as i64),
            Quantity::Unparseable => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub order_id: String,
    pub sku: String,
    pub quantity: Quantity,
    pub status: String,
}

impl LineItem {
    pub fn is_cancelled(&self) -> bool {
        self.status == CANCELLED_STATUS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelledOrder {
    pub order_id: String,
}

/// One summary record per active order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedOrder {
    pub order_id: String,
    pub item_summary: String,
    pub distinct_sku_count: usize,
    pub total_quantity: Quantity,
    /// Set only when the order carries exactly one distinct SKU.
    pub single_sku: Option<String>,
}

impl AggregatedOrder {
    pub fn is_single_sku(&self) -> bool {
        self.distinct_sku_count == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Order,
    CancellationPlaceholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRow {
    pub order_id: String,
    pub item_summary: String,
    pub status: String,
    pub kind: RowKind,
}

impl ManifestRow {
    pub fn from_order(order: &AggregatedOrder) -> Self {
        Self {
            order_id: order.order_id.clone(),
            item_summary: order.item_summary.clone(),
            status: READY_STATUS.to_string(),
            kind: RowKind::Order,
        }
    }

    pub fn cancellation_placeholder(order_id: &str, removed_rows: usize) -> Self {
        Self {
            order_id: order_id.to_string(),
            item_summary: String::new(),
            status: cancellation_status(removed_rows),
            kind: RowKind::CancellationPlaceholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == RowKind::CancellationPlaceholder
    }

    pub fn columns(&self) -> [&str; 3] {
        [
            self.order_id.as_str(),
            self.item_summary.as_str(),
            self.status.as_str(),
        ]
    }
}

pub fn cancellation_status(removed_rows: usize) -> String {
    format!(
        "Удалено {} строк со статусом \"{}\"",
        removed_rows, CANCELLED_STATUS
    )
}

/// The final, sorted manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Manifest {
    pub rows: Vec<ManifestRow>,
}

impl Manifest {
    /// Active order ids in manifest order; placeholders, blanks and repeats dropped.
    pub fn active_order_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.rows
            .iter()
            .filter(|row| !row.is_placeholder())
            .map(|row| row.order_id.as_str())
            .filter(|id| !id.is_empty() && seen.insert(*id))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_placeholder()).count()
    }

    pub fn placeholder_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_placeholder()).count()
    }
}
