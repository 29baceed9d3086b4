//! Colored terminal output

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::diff::DiffResult;

use super::OutputFormatter;

/// Keys listed per one-sided section before truncating
const MAX_LISTED_KEYS: usize = 50;

/// Terminal output with colors
pub struct TerminalOutput {
    max_listed_keys: usize,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self {
            max_listed_keys: MAX_LISTED_KEYS,
        }
    }

    pub fn with_max_listed_keys(max_listed_keys: usize) -> Self {
        Self { max_listed_keys }
    }

    fn write_heading(&self, writer: &mut dyn WriteColor, text: &str, color: Color) -> Result<()> {
        writer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        writeln!(writer, "{}", text)?;
        writer.reset()?;
        Ok(())
    }

    fn write_header(&self, writer: &mut dyn WriteColor, path_a: &Path, path_b: &Path) -> Result<()> {
        writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(writer, " datarecon: {} ⇄ {}", path_a.display(), path_b.display())?;
        writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_summary(&self, result: &DiffResult, writer: &mut dyn WriteColor) -> Result<()> {
        let summary = &result.summary;
        writeln!(
            writer,
            "Key: {} ⇄ {} ({} column(s) compared)",
            result.key_column_a,
            result.key_column_b,
            result.compared_columns.len()
        )?;

        let mut builder = Builder::default();
        builder.push_record(["Metric", "Value"]);
        for (metric, value) in [
            ("Total rows in A", summary.total_a),
            ("Total rows in B", summary.total_b),
            ("Matched keys", summary.matched),
            ("Mismatched rows", summary.mismatches),
            ("Only in A", summary.only_in_a.len()),
            ("Only in B", summary.only_in_b.len()),
        ] {
            builder.push_record([metric.to_string(), value.to_string()]);
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        writeln!(writer, "{}", table)?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_warnings(&self, result: &DiffResult, writer: &mut dyn WriteColor) -> Result<()> {
        if result.warnings.is_empty() {
            return Ok(());
        }

        self.write_heading(writer, "Warnings:", Color::Yellow)?;
        for warning in &result.warnings {
            writeln!(writer, "  ! {}", warning)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_keys(&self, title: &str, keys: &[String], color: Color, writer: &mut dyn WriteColor) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        self.write_heading(writer, title, color)?;
        for key in keys.iter().take(self.max_listed_keys) {
            writeln!(writer, "  {}", key)?;
        }
        if keys.len() > self.max_listed_keys {
            writeln!(writer, "  … and {} more", keys.len() - self.max_listed_keys)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_differences(&self, result: &DiffResult, writer: &mut dyn WriteColor) -> Result<()> {
        if result.detail.is_empty() {
            return Ok(());
        }

        self.write_heading(writer, "Differences:", Color::Red)?;

        let mut builder = Builder::default();
        builder.push_record(["Key", "Column", "Value in A", "Value in B"]);
        for row in &result.detail {
            for (column, pair) in &row.differences {
                builder.push_record([
                    row.key.clone(),
                    column.clone(),
                    pair.value_a.display().into_owned(),
                    pair.value_b.display().into_owned(),
                ]);
            }
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        writeln!(writer, "{}", table)?;
        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TerminalOutput {
    fn render(
        &self,
        result: &DiffResult,
        path_a: &Path,
        path_b: &Path,
        writer: &mut dyn WriteColor,
    ) -> Result<()> {
        self.write_header(writer, path_a, path_b)?;
        self.write_summary(result, writer)?;
        self.write_warnings(result, writer)?;

        if !result.has_differences() {
            self.write_heading(writer, "No differences found.", Color::Green)?;
            return Ok(());
        }

        self.write_keys("Only in A:", &result.summary.only_in_a, Color::Yellow, writer)?;
        self.write_keys("Only in B:", &result.summary.only_in_b, Color::Yellow, writer)?;
        self.write_differences(result, writer)?;

        Ok(())
    }
}
