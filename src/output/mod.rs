//! Output formatting for reconciliation results

mod csv;
mod json;
mod terminal;

use std::path::Path;

use anyhow::Result;
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::config::OutputFormat;
use crate::diff::DiffResult;

pub use self::csv::CsvOutput;
pub use self::json::JsonOutput;
pub use self::terminal::TerminalOutput;

/// Trait for output formatters
pub trait OutputFormatter {
    /// Render a reconciliation result to a writer
    fn render(
        &self,
        result: &DiffResult,
        path_a: &Path,
        path_b: &Path,
        writer: &mut dyn WriteColor,
    ) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create an output formatter based on format type
    pub fn create(format: OutputFormat) -> Box<dyn OutputFormatter> {
        match format {
            OutputFormat::Terminal => Box::new(TerminalOutput::new()),
            OutputFormat::Json => Box::new(JsonOutput::new()),
            OutputFormat::Csv => Box::new(CsvOutput::new()),
        }
    }
}

/// Render a reconciliation result to stdout
pub fn render_to_stdout(
    result: &DiffResult,
    path_a: &Path,
    path_b: &Path,
    format: OutputFormat,
    color_choice: ColorChoice,
) -> Result<()> {
    let formatter = OutputFactory::create(format);
    let mut stdout = StandardStream::stdout(color_choice);
    formatter.render(result, path_a, path_b, &mut stdout)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::diff::{reconcile, DiffResult};
    use crate::mapping::ColumnMapping;
    use crate::model::Dataset;

    /// A result with one mismatch, one key only in A, and one only in B
    pub fn sample_result() -> DiffResult {
        let a = Dataset::from_rows(
            &["Trade_Id", "CounterParty", "Price"],
            vec![
                vec![1.into(), "CITI".into(), 105.into()],
                vec![2.into(), "HSBC".into(), 99.into()],
                vec![3.into(), "JPM".into(), 10.into()],
            ],
        )
        .unwrap();
        let b = Dataset::from_rows(
            &["Trade_Id", "CounterParty", "Price"],
            vec![
                vec![1.into(), "CITI Bank".into(), 105.into()],
                vec![2.into(), "HSBC".into(), 99.into()],
                vec![4.into(), "BNP".into(), 1.into()],
            ],
        )
        .unwrap();
        let mapping = ColumnMapping::identity(&a.column_names());
        reconcile(&a, &b, "Trade_Id", &mapping, 0.0).unwrap()
    }
}
