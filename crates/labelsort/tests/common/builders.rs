//! Builders for test fixtures.
//!
//! Manifests are written with `rust_xlsxwriter` in the layout of a marketplace
//! export: a header row, one residual sub-header row, then one row per line item
//! with order id, SKU, quantity and status in columns B, D, F and H. Column A
//! stays empty. Label PDFs are assembled with `lopdf`, one page per label text.

#![allow(dead_code)]

use std::path::Path;

use lopdf::{dictionary, Document, Object, Stream};
use rust_xlsxwriter::Workbook;

use labelsort::manifest::{CANCELLED_STATUS, READY_STATUS};

/// Status used by the export for rows that still need assembling.
pub const NEW_STATUS: &str = "Новый";

/// One spreadsheet cell.
#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Builder for manifest spreadsheets.
///
/// # Example
///
/// ```ignore
/// let manifest = ManifestBuilder::new()
///     .order("11111111111", "A", 2.0)
///     .cancelled("33333333333", "C", 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    sub_header: bool,
    rows: Vec<[Cell; 4]>,
    sheet_name: Option<String>,
    notes: bool,
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            sub_header: true,
            rows: Vec::new(),
            sheet_name: None,
            notes: false,
        }
    }

    /// Leave out the residual sub-header row.
    pub fn without_sub_header(mut self) -> Self {
        self.sub_header = false;
        self
    }

    /// Fill column J with a free-text note on every row.
    pub fn with_notes(mut self) -> Self {
        self.notes = true;
        self
    }

    pub fn sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = Some(name.to_string());
        self
    }

    /// A line item ready for assembly.
    pub fn order(self, order_id: &str, sku: &str, quantity: f64) -> Self {
        self.row(order_id, sku, quantity, NEW_STATUS)
    }

    /// A line item cancelled during processing.
    pub fn cancelled(self, order_id: &str, sku: &str, quantity: f64) -> Self {
        self.row(order_id, sku, quantity, CANCELLED_STATUS)
    }

    pub fn row(self, order_id: &str, sku: &str, quantity: impl Into<Cell>, status: &str) -> Self {
        self.cells([order_id.into(), sku.into(), quantity.into(), status.into()])
    }

    /// Row with explicit cells for order id, SKU, quantity and status.
    pub fn cells(mut self, cells: [Cell; 4]) -> Self {
        self.rows.push(cells);
        self
    }

    /// Save the workbook to `path`.
    pub fn write(&self, path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        if let Some(name) = &self.sheet_name {
            sheet.set_name(name).expect("Invalid sheet name");
        }

        let header = [
            "",
            "Номер заказа",
            "Наименование",
            "Артикул",
            "Размер",
            "Количество",
            "Склад",
            "Статус",
        ];
        for (col, value) in header.iter().enumerate() {
            if !value.is_empty() {
                sheet
                    .write_string(0, col as u16, *value)
                    .expect("Failed to write header");
            }
        }
        if self.notes {
            sheet
                .write_string(0, 9, "Комментарий")
                .expect("Failed to write header");
        }

        let mut next_row = 1u32;
        if self.sub_header {
            let sub_header = ["", "id", "", "sku", "", "qty", "", "status"];
            for (col, value) in sub_header.iter().enumerate() {
                if !value.is_empty() {
                    sheet
                        .write_string(next_row, col as u16, *value)
                        .expect("Failed to write sub-header");
                }
            }
            next_row += 1;
        }

        for (n, cells) in self.rows.iter().enumerate() {
            if self.notes {
                sheet
                    .write_string(next_row, 9, format!("позиция {}", n + 1))
                    .expect("Failed to write note");
            }
            for (cell, col) in cells.iter().zip([1u16, 3, 5, 7]) {
                match cell {
                    Cell::Text(text) => sheet.write_string(next_row, col, text),
                    Cell::Number(number) => sheet.write_number(next_row, col, *number),
                    Cell::Empty => continue,
                }
                .expect("Failed to write cell");
            }
            next_row += 1;
        }

        workbook.save(path).expect("Failed to save manifest");
    }
}

/// A label PDF with one page per entry of `texts`.
pub fn label_pdf(texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in texts {
        let content = format!("BT /F1 12 Tf 40 400 Td ({}) Tj ET", text);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 288.into(), 432.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => texts.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to save PDF");
    bytes
}

/// Expected output row for an aggregated order.
pub fn ready_row(order_id: &str, items: &str) -> Vec<String> {
    vec![
        order_id.to_string(),
        items.to_string(),
        READY_STATUS.to_string(),
    ]
}

/// Expected output row for a cancelled order.
pub fn placeholder_row(order_id: &str, removed_rows: usize) -> Vec<String> {
    vec![
        order_id.to_string(),
        String::new(),
        labelsort::manifest::model::cancellation_status(removed_rows),
    ]
}
