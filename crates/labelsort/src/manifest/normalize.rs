use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ManifestError;
use crate::manifest::model::{CancelledOrder, LineItem, Quantity, RawRow, RawTable};

/// Where the four manifest columns live, and how many residual header rows follow
/// the spreadsheet header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestLayout {
    #[serde(default)]
    pub columns: ColumnLayout,
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
}

/// Zero-based column positions, column A being 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub order_id: usize,
    pub sku: usize,
    pub quantity: usize,
    pub status: usize,
}

fn default_skip_rows() -> usize {
    1
}

impl Default for ColumnLayout {
    fn default() -> Self {
        // Columns B, D, F and H of a marketplace "orders to assemble" export.
        Self {
            order_id: 1,
            sku: 3,
            quantity: 5,
            status: 7,
        }
    }
}

impl Default for ManifestLayout {
    fn default() -> Self {
        Self {
            columns: ColumnLayout::default(),
            skip_rows: default_skip_rows(),
        }
    }
}

impl ColumnLayout {
    pub fn named(&self) -> [(&'static str, usize); 4] {
        [
            ("order_id", self.order_id),
            ("sku", self.sku),
            ("quantity", self.quantity),
            ("status", self.status),
        ]
    }

    pub fn select(&self, table: &RawTable, row: usize) -> RawRow {
        let take = |column: usize| table.cell(row, column).map(str::to_string);
        RawRow {
            order_id: take(self.order_id),
            sku: take(self.sku),
            quantity: take(self.quantity),
            status: take(self.status),
        }
    }
}

/// A quantity cell that could not be read as a number. The row is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseWarning {
    /// Zero-based index into the data rows (the spreadsheet header excluded).
    pub row_index: usize,
    pub order_id: String,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedManifest {
    pub active: Vec<LineItem>,
    /// Cancelled rows in input order; an order id repeats once per cancelled row.
    pub cancelled: Vec<CancelledOrder>,
    /// Rows dropped because one of the four columns was empty.
    pub discarded: usize,
    /// Leading rows dropped as residual header lines.
    pub skipped: usize,
    pub warnings: Vec<ParseWarning>,
}

impl NormalizedManifest {
    pub fn total_rows(&self) -> usize {
        self.active.len() + self.cancelled.len() + self.discarded + self.skipped
    }
}

/// Turn raw spreadsheet rows into cleaned line items, split into active and cancelled.
pub fn normalize(
    table: &RawTable,
    layout: &ManifestLayout,
) -> Result<NormalizedManifest, ManifestError> {
    for (column, position) in layout.columns.named() {
        if position >= table.width {
            return Err(ManifestError::Schema {
                column,
                position,
                width: table.width,
            });
        }
    }

    let mut result = NormalizedManifest::default();
    let mut to_skip = layout.skip_rows;

    for row_index in 0..table.rows.len() {
        let raw = layout.columns.select(table, row_index);

        if raw.has_nulls() {
            result.discarded += 1;
            continue;
        }

        if to_skip > 0 {
            to_skip -= 1;
            result.skipped += 1;
            debug!(row_index, "Skipping residual header row");
            continue;
        }

        let item = line_item(raw, row_index, &mut result.warnings);
        if item.is_cancelled() {
            result.cancelled.push(CancelledOrder {
                order_id: item.order_id,
            });
        } else {
            result.active.push(item);
        }
    }

    debug!(
        active = result.active.len(),
        cancelled = result.cancelled.len(),
        discarded = result.discarded,
        skipped = result.skipped,
        "Normalized manifest rows"
    );

    Ok(result)
}

fn line_item(raw: RawRow, row_index: usize, warnings: &mut Vec<ParseWarning>) -> LineItem {
    // Only status is trimmed; order ids and SKUs are kept exactly as exported.
    let order_id = raw.order_id.unwrap_or_default();
    let sku = raw.sku.unwrap_or_default();
    let raw_quantity = raw.quantity.unwrap_or_default();
    let status = raw.status.unwrap_or_default().trim().to_string();

    let quantity = Quantity::parse(&raw_quantity);
    if quantity.is_unparseable() {
        warn!(
            row_index,
            order_id = %order_id,
            value = %raw_quantity,
            "Quantity is not a number, marking it unparseable"
        );
        warnings.push(ParseWarning {
            row_index,
            order_id: order_id.clone(),
            raw: raw_quantity,
        });
    }

    LineItem {
        order_id,
        sku,
        quantity,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::model::CANCELLED_STATUS;

    /// Builds a row with the four values at the default positions B, D, F, H.
    fn row(
        order: Option<&str>,
        sku: Option<&str>,
        qty: Option<&str>,
        status: Option<&str>,
    ) -> Vec<Option<String>> {
        let mut cells = vec![None; 8];
        cells[1] = order.map(String::from);
        cells[3] = sku.map(String::from);
        cells[5] = qty.map(String::from);
        cells[7] = status.map(String::from);
        cells
    }

    fn header() -> Vec<Option<String>> {
        row(
            Some("Номер заказа"),
            Some("Артикул"),
            Some("Количество"),
            Some("Статус"),
        )
    }

    #[test]
    fn test_skips_residual_header_and_parses_rows() {
        let table = RawTable::new(vec![
            header(),
            row(Some("11111111111"), Some("A"), Some("2"), Some(" Ожидает сборки ")),
        ]);

        let result = normalize(&table, &ManifestLayout::default()).unwrap();

        assert_eq!(result.skipped, 1);
        assert_eq!(result.active.len(), 1);
        let item = &result.active[0];
        assert_eq!(item.order_id, "11111111111");
        assert_eq!(item.sku, "A");
        assert_eq!(item.quantity, Quantity::Value(2.0));
        assert_eq!(item.status, "Ожидает сборки");
    }

    #[test]
    fn test_null_rows_are_dropped_before_header_skip() {
        // The first fully populated row is treated as the residual header,
        // even when incomplete rows precede it.
        let table = RawTable::new(vec![
            row(None, None, None, Some("title")),
            header(),
            row(Some("1"), Some("A"), None, Some("x")),
            row(Some("2"), Some("B"), Some("1"), Some("x")),
        ]);

        let result = normalize(&table, &ManifestLayout::default()).unwrap();

        assert_eq!(result.discarded, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.active.len(), 1);
        assert_eq!(result.active[0].order_id, "2");
        assert_eq!(result.total_rows(), 4);
    }

    #[test]
    fn test_cancelled_rows_are_split_out_with_duplicates() {
        let padded = format!("  {}  ", CANCELLED_STATUS);
        let table = RawTable::new(vec![
            header(),
            row(Some("1"), Some("A"), Some("1"), Some(CANCELLED_STATUS)),
            row(Some("2"), Some("A"), Some("1"), Some("Ожидает сборки")),
            row(Some("1"), Some("B"), Some("1"), Some(padded.as_str())),
        ]);

        let result = normalize(&table, &ManifestLayout::default()).unwrap();

        assert_eq!(result.active.len(), 1);
        assert_eq!(
            result.cancelled,
            vec![
                CancelledOrder { order_id: "1".into() },
                CancelledOrder { order_id: "1".into() },
            ]
        );
    }

    #[test]
    fn test_order_id_and_sku_keep_surrounding_whitespace() {
        let table = RawTable::new(vec![
            header(),
            row(Some("1"), Some("A "), Some("1"), Some("Ожидает сборки")),
            row(Some("1"), Some("A"), Some("2"), Some("Ожидает сборки")),
            row(Some(" 2"), Some("B"), Some("1"), Some("Ожидает сборки")),
        ]);

        let result = normalize(&table, &ManifestLayout::default()).unwrap();

        let skus: Vec<&str> = result.active.iter().map(|i| i.sku.as_str()).collect();
        assert_eq!(skus, vec!["A ", "A", "B"]);
        assert_eq!(result.active[2].order_id, " 2");
    }

    #[test]
    fn test_unparseable_quantity_is_kept_with_warning() {
        let table = RawTable::new(vec![
            header(),
            row(Some("1"), Some("A"), Some("много"), Some("Ожидает сборки")),
        ]);

        let result = normalize(&table, &ManifestLayout::default()).unwrap();

        assert_eq!(result.active.len(), 1);
        assert_eq!(result.active[0].quantity, Quantity::Unparseable);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].row_index, 1);
        assert_eq!(result.warnings[0].raw, "много");
    }

    #[test]
    fn test_narrow_table_is_a_schema_error() {
        let table = RawTable::new(vec![vec![Some("a".into()); 5]]);

        let err = normalize(&table, &ManifestLayout::default()).unwrap_err();

        match err {
            ManifestError::Schema {
                column,
                position,
                width,
            } => {
                assert_eq!(column, "quantity");
                assert_eq!(position, 5);
                assert_eq!(width, 5);
            }
        }
    }

    #[test]
    fn test_custom_layout_without_header_skip() {
        let layout = ManifestLayout {
            columns: ColumnLayout {
                order_id: 0,
                sku: 1,
                quantity: 2,
                status: 3,
            },
            skip_rows: 0,
        };
        let table = RawTable::new(vec![vec![
            Some("9".into()),
            Some("Z".into()),
            Some("4".into()),
            Some("new".into()),
        ]]);

        let result = normalize(&table, &layout).unwrap();

        assert_eq!(result.skipped, 0);
        assert_eq!(result.active[0].quantity, Quantity::Value(4.0));
    }

    #[test]
    fn test_empty_table_after_header_is_not_an_error() {
        let table = RawTable::new(vec![header()]);

        let result = normalize(&table, &ManifestLayout::default()).unwrap();

        assert!(result.active.is_empty());
        assert!(result.cancelled.is_empty());
        assert_eq!(result.skipped, 1);
    }
}
