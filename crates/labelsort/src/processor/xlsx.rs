use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook};

use crate::error::ProcessError;
use crate::manifest::{Manifest, RawTable, OUTPUT_HEADERS};
use crate::processor::TableProcessor;

/// Column widths of the written manifest, in characters.
const COLUMN_WIDTHS: [f64; 3] = [16.0, 60.0, 40.0];

pub struct XlsxProcessor {
    sheet: Option<String>,
}

impl XlsxProcessor {
    /// `sheet` selects a worksheet by name; `None` reads the first one.
    pub fn new(sheet: Option<String>) -> Self {
        Self { sheet }
    }
}

impl TableProcessor for XlsxProcessor {
    fn read_table(&self, path: &Path) -> Result<RawTable, ProcessError> {
        let _span = tracing::info_span!("processor.xlsx").entered();

        if !path.exists() {
            return Err(ProcessError::ReadFile {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        let mut workbook = open_workbook_auto(path)
            .map_err(|e| ProcessError::SpreadsheetRead(format!("Failed to open workbook: {}", e)))?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = match &self.sheet {
            Some(name) if sheet_names.iter().any(|n| n == name) => name.clone(),
            Some(name) => {
                return Err(ProcessError::SpreadsheetRead(format!(
                    "Sheet '{}' not found (available: {})",
                    name,
                    sheet_names.join(", ")
                )))
            }
            None => sheet_names.first().cloned().ok_or_else(|| {
                ProcessError::SpreadsheetRead("Workbook contains no sheets".to_string())
            })?,
        };

        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            ProcessError::SpreadsheetRead(format!("Failed to read sheet '{}': {}", sheet_name, e))
        })?;

        // Positions are absolute (column A is 0) even when the used range
        // starts further right or down.
        let (start_row, start_col) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        let (_, used_width) = range.get_size();
        let width = if used_width == 0 { 0 } else { start_col + used_width };

        // Row 1 of the sheet is the column header row; blank rows above the
        // used range stay in place as empty data rows.
        let leading_blank = start_row.saturating_sub(1);
        let header_in_range = usize::from(start_row == 0);
        let rows: Vec<Vec<Option<String>>> = std::iter::repeat_with(|| vec![None; width])
            .take(leading_blank)
            .chain(range.rows().skip(header_in_range).map(|row| {
                std::iter::repeat(None)
                    .take(start_col)
                    .chain(row.iter().map(cell_text))
                    .collect()
            }))
            .collect();

        tracing::debug!(sheet = %sheet_name, rows = rows.len(), width, "Read manifest sheet");

        Ok(RawTable { width, rows })
    }

    fn write_manifest(&self, manifest: &Manifest) -> Result<Vec<u8>, ProcessError> {
        let _span = tracing::info_span!("processor.xlsx_write").entered();

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let header_format = Format::new().set_bold();

        for (col, header) in OUTPUT_HEADERS.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *header, &header_format)
                .map_err(write_error)?;
            worksheet
                .set_column_width(col as u16, COLUMN_WIDTHS[col])
                .map_err(write_error)?;
        }

        for (index, row) in manifest.rows.iter().enumerate() {
            let row_num = (index + 1) as u32;
            for (col, value) in row.columns().iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                worksheet
                    .write_string(row_num, col as u16, *value)
                    .map_err(write_error)?;
            }
        }

        workbook.save_to_buffer().map_err(write_error)
    }
}

fn write_error(e: rust_xlsxwriter::XlsxError) -> ProcessError {
    ProcessError::SpreadsheetWrite(e.to_string())
}

/// Cell contents as text; `None` for empty and error cells.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(n) => Some(format_number(*n)),
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(format_number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Integral floats print without decimals so 11-digit order numbers stored as
/// numbers read back unchanged.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ManifestRow, RowKind, READY_STATUS};
    use tempfile::TempDir;

    fn write_fixture(dir: &Path, rows: &[Vec<Option<&str>>]) -> std::path::PathBuf {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(value) = cell {
                    if let Ok(n) = value.parse::<f64>() {
                        sheet.write_number(r as u32, c as u16, n).unwrap();
                    } else {
                        sheet.write_string(r as u32, c as u16, *value).unwrap();
                    }
                }
            }
        }
        let path = dir.join("orders.xlsx");
        workbook.save(&path).unwrap();
        path
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(12345678901.0), "12345678901");
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String(String::new())), None);
        assert_eq!(cell_text(&Data::String("A".into())), Some("A".into()));
        assert_eq!(cell_text(&Data::Float(3.0)), Some("3".into()));
        assert_eq!(cell_text(&Data::Int(7)), Some("7".into()));
    }

    #[test]
    fn test_read_table_consumes_header_row() {
        let temp = TempDir::new().unwrap();
        let path = write_fixture(
            temp.path(),
            &[
                vec![Some("№"), None, Some("x")],
                vec![Some("1"), Some("12345678901"), Some("SKU-1")],
                vec![Some("2"), None, Some("SKU-2")],
            ],
        );

        let table = XlsxProcessor::new(None).read_table(&path).unwrap();

        assert_eq!(table.width, 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 1), Some("12345678901"));
        assert_eq!(table.cell(0, 2), Some("SKU-1"));
        assert_eq!(table.cell(1, 1), None);
    }

    #[test]
    fn test_read_table_keeps_absolute_columns_when_column_a_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = write_fixture(
            temp.path(),
            &[
                vec![None, Some("Номер заказа"), None, Some("Артикул")],
                vec![None, Some("12345678901"), None, Some("SKU-1")],
            ],
        );

        let table = XlsxProcessor::new(None).read_table(&path).unwrap();

        assert_eq!(table.width, 4);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, 0), None);
        assert_eq!(table.cell(0, 1), Some("12345678901"));
        assert_eq!(table.cell(0, 3), Some("SKU-1"));
    }

    #[test]
    fn test_read_table_blank_first_row_is_the_header() {
        let temp = TempDir::new().unwrap();
        let path = write_fixture(
            temp.path(),
            &[
                vec![],
                vec![],
                vec![Some("a"), Some("12345678901")],
                vec![Some("b"), Some("98765432109")],
            ],
        );

        let table = XlsxProcessor::new(None).read_table(&path).unwrap();

        assert_eq!(table.width, 2);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.cell(0, 1), None);
        assert_eq!(table.cell(1, 1), Some("12345678901"));
        assert_eq!(table.cell(2, 1), Some("98765432109"));
    }

    #[test]
    fn test_read_missing_sheet_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = write_fixture(temp.path(), &[vec![Some("a")]]);

        let result = XlsxProcessor::new(Some("Заказы".into())).read_table(&path);

        match result {
            Err(ProcessError::SpreadsheetRead(msg)) => assert!(msg.contains("Заказы")),
            other => panic!("Expected SpreadsheetRead error, got {:?}", other.map(|t| t.width)),
        }
    }

    #[test]
    fn test_read_missing_file_is_an_error() {
        let result = XlsxProcessor::new(None).read_table(Path::new("/nonexistent/orders.xlsx"));
        assert!(matches!(result, Err(ProcessError::ReadFile { .. })));
    }

    #[test]
    fn test_write_manifest_round_trips_through_calamine() {
        let manifest = Manifest {
            rows: vec![
                ManifestRow {
                    order_id: "11111111111".into(),
                    item_summary: "A — 2".into(),
                    status: READY_STATUS.into(),
                    kind: RowKind::Order,
                },
                ManifestRow::cancellation_placeholder("33333333333", 1),
            ],
        };

        let bytes = XlsxProcessor::new(None).write_manifest(&manifest).unwrap();
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.xlsx");
        std::fs::write(&path, &bytes).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let name = workbook.sheet_names()[0].clone();
        let range = workbook.worksheet_range(&name).unwrap();
        let rows: Vec<Vec<Option<String>>> = range
            .rows()
            .map(|r| r.iter().map(cell_text).collect())
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0].as_deref(), Some(OUTPUT_HEADERS[0]));
        assert_eq!(rows[1][0].as_deref(), Some("11111111111"));
        assert_eq!(rows[1][1].as_deref(), Some("A — 2"));
        assert_eq!(rows[2][1], None);
        assert!(rows[2][2].as_deref().unwrap().starts_with("Удалено 1 строк"));
    }
}
