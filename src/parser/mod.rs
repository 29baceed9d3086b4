//! Parser layer for reading tabular source files into datasets

mod csv;
mod excel;
mod json;

use std::path::Path;

use anyhow::{bail, Result};

use crate::config::ReadOptions;
use crate::model::Dataset;

pub use self::csv::{sniff_delimiter, CsvParser};
pub use self::excel::ExcelParser;
pub use self::json::JsonParser;

/// Trait for parsing tabular data files
pub trait Parser: Send + Sync {
    /// Parse a file and return a Dataset
    fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Dataset>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for creating parsers based on file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(CsvParser), Box::new(ExcelParser), Box::new(JsonParser)],
        }
    }

    /// Get a parser for the given file path, sniffing content when there is no extension
    pub fn get_parser(&self, path: &Path) -> Result<&dyn Parser> {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_lowercase(),
            None => detect_format(path).unwrap_or("csv").to_string(),
        };

        for parser in &self.parsers {
            if parser.supports_extension(&ext) {
                return Ok(parser.as_ref());
            }
        }

        bail!("Unsupported file format: {}", ext)
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Dataset> {
        let parser = self.get_parser(path)?;
        let dataset = parser.parse(path, options)?;
        log::debug!(
            "read {} row(s) x {} column(s) from {}",
            dataset.row_count(),
            dataset.column_count(),
            path.display()
        );
        Ok(dataset)
    }
}

/// Detect file format from content (for files without extension)
pub fn detect_format(path: &Path) -> Option<&'static str> {
    use std::fs::File;
    use std::io::{BufRead, BufReader, Seek};

    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; 8];
    let bytes_read = std::io::Read::read(&mut reader, &mut buffer).ok()?;

    if bytes_read < 4 {
        return None;
    }

    // Excel ZIP container (xlsx)
    if &buffer[0..4] == b"PK\x03\x04" {
        return Some("xlsx");
    }

    // Legacy OLE container (xls)
    if &buffer[0..4] == b"\xD0\xCF\x11\xE0" {
        return Some("xls");
    }

    reader.rewind().ok()?;
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let trimmed = line.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Some("json");
    }

    Some("csv")
}

/// Trim header names, name blank headers `Unnamed: <i>`, and suffix repeats `.1`, `.2`
pub fn sanitize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = Vec::new();

    for (i, name) in raw.into_iter().enumerate() {
        let trimmed = name.as_ref().trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while names.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        names.push(candidate);
    }

    names
}
