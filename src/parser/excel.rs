//! Excel file parser (xlsx, xls, ods)

use std::path::Path;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{Duration, NaiveDate};

use crate::config::ReadOptions;
use crate::model::{CellValue, Dataset};

use super::{sanitize_headers, Parser};

/// Parser for Excel files
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Dataset> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

        let sheet_name = if let Some(ref name) = options.sheet_name {
            name.clone()
        } else {
            let sheets = workbook.sheet_names();
            match sheets.first() {
                Some(first) => first.clone(),
                None => bail!("No sheets found in workbook"),
            }
        };

        let range: Range<Data> = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

        parse_range(&range)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx" | "xls" | "ods" | "xlsm")
    }
}

fn parse_range(range: &Range<Data>) -> Result<Dataset> {
    let mut rows = range.rows();

    // First row is header
    let header_row = rows.next().context("Empty sheet: no header row found")?;
    let mut dataset = Dataset::with_column_names(sanitize_headers(header_row.iter().map(cell_to_string)))?;

    for (line_num, row) in rows.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
        if cells.iter().all(CellValue::is_null) {
            continue;
        }
        dataset.add_row(cells, line_num + 2); // +2 for 1-indexing and header
    }

    Ok(dataset)
}

fn cell_to_string(cell: &Data) -> String {
    match convert_cell(cell) {
        CellValue::Null => String::new(),
        other => other.display().into_owned(),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        Data::Float(f) => {
            // Whole floats are stored integers
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_text(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}

/// Render an Excel serial date as ISO text (date only when there is no time part).
/// Serials outside chrono's range stay numeric.
fn excel_serial_to_text(serial: f64) -> CellValue {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0)) else {
        return CellValue::Float(serial);
    };
    let millis = (serial * 86_400_000.0).round() as i64;
    let Some(datetime) = Duration::try_milliseconds(millis).and_then(|d| epoch.checked_add_signed(d)) else {
        return CellValue::Float(serial);
    };

    if millis % 86_400_000 == 0 {
        CellValue::Text(datetime.date().format("%Y-%m-%d").to_string())
    } else {
        CellValue::Text(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
