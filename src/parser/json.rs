//! JSON array parser

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use indexmap::IndexSet;
use serde_json::Value;

use crate::config::ReadOptions;
use crate::model::{CellValue, Dataset};

use super::{sanitize_headers, Parser};

/// Parser for JSON array-of-objects files
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, path: &Path, _options: &ReadOptions) -> Result<Dataset> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open JSON file: {}", path.display()))?;
        let reader = BufReader::new(file);

        let value: Value =
            serde_json::from_reader(reader).context("Failed to parse JSON file")?;

        parse_value(value)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "json")
    }
}

fn parse_value(value: Value) -> Result<Dataset> {
    // Handle both arrays and single objects
    let array = match value {
        Value::Array(arr) => arr,
        Value::Object(_) => vec![value],
        _ => bail!("JSON must be an array or object"),
    };

    // Collect all unique keys across all objects to build column list
    let mut keys: IndexSet<String> = IndexSet::new();
    for item in &array {
        let Value::Object(obj) = item else {
            bail!("JSON array items must be objects");
        };
        for key in obj.keys() {
            keys.insert(key.clone());
        }
    }

    let mut dataset = Dataset::with_column_names(sanitize_headers(keys.iter()))?;

    for (line_num, item) in array.iter().enumerate() {
        if let Value::Object(obj) = item {
            let cells = keys.iter().map(|key| json_value_to_cell(obj.get(key))).collect();
            dataset.add_row(cells, line_num + 1);
        }
    }

    Ok(dataset)
}

fn json_value_to_cell(value: Option<&Value>) -> CellValue {
    match value {
        None | Some(Value::Null) => CellValue::Null,
        Some(Value::Bool(b)) => CellValue::Bool(*b),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else if n.is_u64() {
                // Wider than i64; keep the exact digits
                CellValue::Text(n.to_string())
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        Some(Value::String(s)) => CellValue::Text(s.trim().to_string()),
        // Nested values compare by their JSON text
        Some(nested) => CellValue::Text(nested.to_string()),
    }
}
