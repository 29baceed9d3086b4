//! JSON output format

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use termcolor::WriteColor;

use crate::diff::DiffResult;

use super::OutputFormatter;

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    file_a: String,
    file_b: String,
    #[serde(flatten)]
    result: &'a DiffResult,
}

impl OutputFormatter for JsonOutput {
    fn render(
        &self,
        result: &DiffResult,
        path_a: &Path,
        path_b: &Path,
        writer: &mut dyn WriteColor,
    ) -> Result<()> {
        let report = JsonReport {
            file_a: path_a.display().to_string(),
            file_b: path_b.display().to_string(),
            result,
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &report)?;
        } else {
            serde_json::to_writer(&mut *writer, &report)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample_result;
    use termcolor::NoColor;

    #[test]
    fn test_json_shape() {
        let result = sample_result();
        let mut out = NoColor::new(Vec::new());
        JsonOutput::compact()
            .render(&result, Path::new("a.csv"), Path::new("b.csv"), &mut out)
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out.into_inner()).unwrap();
        assert_eq!(value["file_a"], "a.csv");
        assert_eq!(value["summary"]["matched"], 2);
        assert_eq!(value["summary"]["only_in_a"], serde_json::json!(["3"]));
        assert_eq!(value["detail"][0]["key"], "1");
        assert_eq!(
            value["detail"][0]["differences"]["CounterParty"],
            serde_json::json!({ "value_a": "CITI", "value_b": "CITI Bank" })
        );
    }
}
