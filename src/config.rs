//! Configuration handling for datarecon

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Result};
use crate::mapping::{suggest_mapping_with, suggest_primary_key, ColumnMapping, MappingStrategy};
use crate::model::Dataset;

/// Output format for reconciliation results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
    Csv,
}

/// Options for reading source files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadOptions {
    /// For Excel files: which sheet to read (first sheet when unset)
    #[serde(default)]
    pub sheet_name: Option<String>,
}

/// Options for a single reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconOptions {
    /// Key column in dataset A; suggested from A when unset
    pub key_column_a: Option<String>,
    /// A→B column mapping; suggested from both headers when unset
    pub mapping: Option<ColumnMapping>,
    /// Absolute numeric difference still treated as equal
    pub tolerance: f64,
    /// Strategy used when the mapping has to be suggested
    pub strategy: MappingStrategy,
}

impl Default for ReconOptions {
    fn default() -> Self {
        Self {
            key_column_a: None,
            mapping: None,
            tolerance: 0.0,
            strategy: MappingStrategy::default(),
        }
    }
}

impl ReconOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key column of dataset A
    pub fn with_key_column(mut self, key: impl Into<String>) -> Self {
        self.key_column_a = Some(key.into());
        self
    }

    /// Set an explicit column mapping
    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Set numeric tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the strategy used for suggested mappings
    pub fn with_strategy(mut self, strategy: MappingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Reject negative or non-finite tolerances
    pub fn validate(&self) -> Result<()> {
        validate_tolerance(self.tolerance)
    }

    /// Fill in the key column and mapping from suggestions where unset
    pub fn resolve(&self, a: &Dataset, b: &Dataset) -> Result<(String, ColumnMapping)> {
        let key = match &self.key_column_a {
            Some(key) => key.clone(),
            None => suggest_primary_key(a)?,
        };
        let mapping = match &self.mapping {
            Some(mapping) => mapping.clone(),
            None => suggest_mapping_with(&a.column_names(), &b.column_names(), self.strategy),
        };
        Ok((key, mapping))
    }
}

pub(crate) fn validate_tolerance(tolerance: f64) -> Result<()> {
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(())
    } else {
        Err(ReconError::InvalidArgument(format!(
            "tolerance must be a finite number >= 0, got {}",
            tolerance
        )))
    }
}

/// One A/B file pair in a job file; unset fields fall back to the job defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairConfig {
    pub file_a: PathBuf,
    pub file_b: PathBuf,
    #[serde(default)]
    pub key_column_a: Option<String>,
    #[serde(default)]
    pub mapping: Option<ColumnMapping>,
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub strategy: Option<MappingStrategy>,
}

impl PairConfig {
    pub fn new(file_a: impl Into<PathBuf>, file_b: impl Into<PathBuf>) -> Self {
        Self {
            file_a: file_a.into(),
            file_b: file_b.into(),
            key_column_a: None,
            mapping: None,
            tolerance: None,
            strategy: None,
        }
    }

    /// Merge this pair's overrides over the job defaults
    pub fn options(&self, defaults: &ReconOptions) -> ReconOptions {
        ReconOptions {
            key_column_a: self
                .key_column_a
                .clone()
                .or_else(|| defaults.key_column_a.clone()),
            mapping: self.mapping.clone().or_else(|| defaults.mapping.clone()),
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
            strategy: self.strategy.unwrap_or(defaults.strategy),
        }
    }
}

/// A batch job: shared defaults plus the file pairs to reconcile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub defaults: ReconOptions,
    #[serde(default)]
    pub read: ReadOptions,
    pub pairs: Vec<PairConfig>,
}

impl JobConfig {
    /// Parse and validate a job from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let job: JobConfig =
            serde_json::from_str(text).map_err(|e| ReconError::Config(e.to_string()))?;
        job.validate()?;
        Ok(job)
    }

    /// Load a job file; relative pair paths resolve against the file's directory
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file: {}", path.display()))?;
        let mut job = Self::from_json(&text)
            .with_context(|| format!("Invalid job file: {}", path.display()))?;

        if let Some(base) = path.parent() {
            for pair in &mut job.pairs {
                pair.file_a = rebase(base, &pair.file_a);
                pair.file_b = rebase(base, &pair.file_b);
            }
        }
        Ok(job)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pairs.is_empty() {
            return Err(ReconError::Config("job has no pairs".to_string()));
        }
        self.defaults.validate()?;
        for pair in &self.pairs {
            if let Some(tolerance) = pair.tolerance {
                validate_tolerance(tolerance)?;
            }
        }
        Ok(())
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_validation() {
        assert!(ReconOptions::new().with_tolerance(0.0).validate().is_ok());
        assert!(ReconOptions::new().with_tolerance(-0.1).validate().is_err());
        assert!(ReconOptions::new().with_tolerance(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_job_from_json_merges_defaults() {
        let job = JobConfig::from_json(
            r#"{
                "defaults": { "tolerance": 0.01, "strategy": "one_to_one" },
                "pairs": [
                    { "file_a": "a.csv", "file_b": "b.csv" },
                    { "file_a": "c.csv", "file_b": "d.csv", "key_column_a": "Ref",
                      "mapping": { "Ref": "Reference" }, "tolerance": 0.5 }
                ]
            }"#,
        )
        .unwrap();

        let first = job.pairs[0].options(&job.defaults);
        assert_eq!(first.tolerance, 0.01);
        assert_eq!(first.strategy, MappingStrategy::OneToOne);
        assert!(first.key_column_a.is_none());

        let second = job.pairs[1].options(&job.defaults);
        assert_eq!(second.tolerance, 0.5);
        assert_eq!(second.key_column_a.as_deref(), Some("Ref"));
        assert_eq!(second.mapping.unwrap().get("Ref"), Some("Reference"));
    }

    #[test]
    fn test_job_rejects_empty_and_bad_tolerance() {
        assert!(matches!(
            JobConfig::from_json(r#"{ "pairs": [] }"#),
            Err(ReconError::Config(_))
        ));
        assert!(JobConfig::from_json(
            r#"{ "pairs": [{ "file_a": "a", "file_b": "b", "tolerance": -1 }] }"#
        )
        .is_err());
        assert!(JobConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_resolve_suggests_missing_pieces() {
        let a = Dataset::from_rows(&["Trade_Id", "Price"], vec![vec![1.into(), 2.into()]]).unwrap();
        let b = Dataset::from_rows(&["TradeId", "price"], vec![vec![1.into(), 2.into()]]).unwrap();

        let (key, mapping) = ReconOptions::new().resolve(&a, &b).unwrap();
        assert_eq!(key, "Trade_Id");
        assert_eq!(mapping.get("Price"), Some("price"));
    }
}
