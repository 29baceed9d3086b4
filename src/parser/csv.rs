//! Delimited-text parser (CSV, TSV, and sniffed variants)

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::ReadOptions;
use crate::model::{CellValue, Dataset};

use super::{sanitize_headers, Parser};

/// Delimiters considered when sniffing, in tie-break order
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Parser for delimited text files
pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(&self, path: &Path, _options: &ReadOptions) -> Result<Dataset> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;

        let is_tsv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
        let delimiter = if is_tsv { b'\t' } else { sniff_delimiter(&content) };
        log::debug!("{}: using delimiter {:?}", path.display(), delimiter as char);

        parse_delimited(&content, delimiter)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "txt")
    }
}

/// Pick the candidate delimiter occurring most often in the header line
pub fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");

    let mut best = b',';
    let mut best_count = 0;
    for &candidate in &CANDIDATE_DELIMITERS {
        let count = header.bytes().filter(|&b| b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

fn parse_delimited(content: &str, delimiter: u8) -> Result<Dataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let headers = csv_reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    let mut dataset = Dataset::with_column_names(sanitize_headers(headers.iter()))?;

    for (line_num, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", line_num + 2))?; // +2 for 1-indexing and header

        // Skip entirely blank lines
        if record.iter().all(|s| s.trim().is_empty()) {
            continue;
        }

        let cells: Vec<CellValue> = record.iter().map(parse_cell_value).collect();
        dataset.add_row(cells, line_num + 2);
    }

    Ok(dataset)
}

/// Parse a string value into a CellValue with type inference
pub(crate) fn parse_cell_value(s: &str) -> CellValue {
    let trimmed = s.trim();

    // Check for empty/null
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed == "NA" {
        return CellValue::Null;
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }
    // Integers wider than i64 keep their exact digits
    if is_integer_literal(trimmed) {
        return CellValue::Text(trimmed.to_string());
    }

    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return CellValue::Float(f);
        }
    }

    CellValue::Text(trimmed.to_string())
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
