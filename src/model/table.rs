//! Dataset, Row, and Cell data structures

use std::borrow::Cow;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::schema::Column;
use crate::error::{ReconError, Result};

/// A scalar cell value with type information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            // Cross-type numeric comparison
            (CellValue::Int(a), CellValue::Float(b)) => (*a as f64) == *b,
            (CellValue::Float(a), CellValue::Int(b)) => *a == (*b as f64),
            _ => false,
        }
    }
}

impl CellValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Textual form used for comparison and key identity; null renders empty
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed(""),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            other => other.display(),
        }
    }

    /// Convert to a display string
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed("NULL"),
            CellValue::Bool(b) => Cow::Owned(b.to_string()),
            CellValue::Int(i) => Cow::Owned(i.to_string()),
            CellValue::Float(f) => Cow::Owned(f.to_string()),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// A row in the dataset, cells indexed by schema position
#[derive(Debug, Clone)]
pub struct Row {
    /// Cell values in column order
    pub cells: Vec<CellValue>,
    /// Original line/row number in source file (1-indexed)
    pub source_line: usize,
}

impl Row {
    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// An ordered set of rows over one fixed, ordered column schema
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Column definitions
    pub columns: Vec<Column>,
    /// All rows in source order
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Create an empty dataset; column names must be unique and non-blank
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for column in &columns {
            if column.name.trim().is_empty() {
                return Err(ReconError::InvalidArgument(format!(
                    "column {} has an empty name",
                    column.index
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(ReconError::InvalidArgument(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create an empty dataset from column names in order
    pub fn with_column_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column::new(name, i))
            .collect();
        Self::new(columns)
    }

    /// Build a dataset from column names and row cells
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let mut dataset = Self::with_column_names(names.iter().map(|n| n.as_ref().to_string()))?;
        for (i, cells) in rows.into_iter().enumerate() {
            dataset.add_row(cells, i + 1);
        }
        Ok(dataset)
    }

    /// Add a row, padding short rows with nulls and dropping extra cells
    pub fn add_row(&mut self, mut cells: Vec<CellValue>, source_line: usize) {
        cells.resize(self.columns.len(), CellValue::Null);
        self.rows.push(Row { cells, source_line });
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column names in schema order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Iterate one column's values in row order
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicate_and_blank_names() {
        assert!(Dataset::with_column_names(["id", "id"]).is_err());
        assert!(Dataset::with_column_names(["id", "  "]).is_err());
        assert!(Dataset::with_column_names(Vec::<String>::new()).is_ok());
    }

    #[test]
    fn test_add_row_pads_and_truncates() {
        let mut ds = Dataset::with_column_names(["a", "b"]).unwrap();
        ds.add_row(vec![CellValue::Int(1)], 2);
        ds.add_row(vec![1.into(), 2.into(), 3.into()], 3);

        assert_eq!(ds.rows[0].cells, vec![CellValue::Int(1), CellValue::Null]);
        assert_eq!(ds.rows[1].cells.len(), 2);
        assert_eq!(ds.rows[1].source_line, 3);
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(CellValue::Null.as_text(), "");
        assert_eq!(CellValue::Null.display(), "NULL");
        assert_eq!(CellValue::Float(105.0).as_text(), "105");
        assert_eq!(CellValue::from(" x ").as_text(), " x ");
        assert_eq!(CellValue::Int(3), CellValue::Float(3.0));
    }
}
