//! Long-format CSV export of cell differences

use std::path::Path;

use anyhow::Result;
use termcolor::WriteColor;

use crate::diff::DiffResult;

use super::OutputFormatter;

/// One `key,column,value_a,value_b` record per differing cell
pub struct CsvOutput;

impl CsvOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for CsvOutput {
    fn render(
        &self,
        result: &DiffResult,
        _path_a: &Path,
        _path_b: &Path,
        writer: &mut dyn WriteColor,
    ) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["key", "column", "value_a", "value_b"])?;

        for row in &result.detail {
            for (column, pair) in &row.differences {
                csv_writer.write_record([
                    row.key.as_str(),
                    column.as_str(),
                    &*pair.value_a.as_text(),
                    &*pair.value_b.as_text(),
                ])?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }
}
