//! Batch reconciliation of many A/B file pairs

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{JobConfig, PairConfig, ReadOptions, ReconOptions};
use crate::diff::{reconcile_with, DiffResult};
use crate::parser::ParserFactory;

/// Final state of one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStatus {
    Success,
    Failed,
    /// Not started because the batch was cancelled
    Skipped,
}

/// Outcome of one pair in a batch
#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    pub file_a: PathBuf,
    pub file_b: PathBuf,
    pub status: PairStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DiffResult>,
    pub finished_at: DateTime<Utc>,
}

/// All outcomes of a batch, in job order
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<PairOutcome>,
}

impl BatchReport {
    pub fn count(&self, status: PairStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Any succeeded pair reported differences
    pub fn has_differences(&self) -> bool {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref())
            .any(DiffResult::has_differences)
    }
}

/// Read and reconcile one pair
pub fn run_pair(
    pair: &PairConfig,
    defaults: &ReconOptions,
    read: &ReadOptions,
    factory: &ParserFactory,
) -> Result<DiffResult> {
    let options = pair.options(defaults);
    options.validate()?;

    let a = factory
        .parse(&pair.file_a, read)
        .with_context(|| format!("Failed to parse file A: {}", pair.file_a.display()))?;
    let b = factory
        .parse(&pair.file_b, read)
        .with_context(|| format!("Failed to parse file B: {}", pair.file_b.display()))?;

    reconcile_with(&a, &b, &options).with_context(|| {
        format!(
            "Reconciliation failed for {} ⇄ {}",
            pair.file_a.display(),
            pair.file_b.display()
        )
    })
}

/// Run every pair of a job in parallel
pub fn run_batch(job: &JobConfig, factory: &ParserFactory) -> BatchReport {
    run_batch_until(job, factory, &AtomicBool::new(false))
}

/// Run a job, skipping pairs not yet started once `cancel` is set
pub fn run_batch_until(job: &JobConfig, factory: &ParserFactory, cancel: &AtomicBool) -> BatchReport {
    let started_at = Utc::now();
    log::info!("starting batch of {} pair(s)", job.pairs.len());

    let outcomes: Vec<PairOutcome> = job
        .pairs
        .par_iter()
        .map(|pair| {
            let (status, error, result) = if cancel.load(Ordering::Relaxed) {
                (PairStatus::Skipped, None, None)
            } else {
                match run_pair(pair, &job.defaults, &job.read, factory) {
                    Ok(result) => (PairStatus::Success, None, Some(result)),
                    Err(e) => {
                        log::warn!("pair failed: {:#}", e);
                        (PairStatus::Failed, Some(format!("{:#}", e)), None)
                    }
                }
            };

            PairOutcome {
                file_a: pair.file_a.clone(),
                file_b: pair.file_b.clone(),
                status,
                error,
                result,
                finished_at: Utc::now(),
            }
        })
        .collect();

    let report = BatchReport {
        started_at,
        finished_at: Utc::now(),
        outcomes,
    };
    log::info!(
        "batch finished: {} succeeded, {} failed, {} skipped",
        report.count(PairStatus::Success),
        report.count(PairStatus::Failed),
        report.count(PairStatus::Skipped)
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_pair(dir: &std::path::Path, name: &str, a: &str, b: &str) -> PairConfig {
        let path_a = dir.join(format!("{name}_a.csv"));
        let path_b = dir.join(format!("{name}_b.csv"));
        fs::write(&path_a, a).unwrap();
        fs::write(&path_b, b).unwrap();
        PairConfig::new(path_a, path_b)
    }

    #[test]
    fn test_failed_pair_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_pair(
            dir.path(),
            "good",
            "Trade_Id,Price\n1,105\n2,10\n",
            "TradeId,price\n1,105.001\n3,10\n",
        );
        let mut bad = write_pair(dir.path(), "bad", "Trade_Id,Price\n1,1\n", "Ref,Price\n1,1\n");
        bad.key_column_a = Some("Trade_Id".to_string());
        let missing = PairConfig::new(dir.path().join("nope.csv"), dir.path().join("nope2.csv"));

        let job = JobConfig {
            defaults: ReconOptions::new().with_tolerance(0.01),
            read: ReadOptions::default(),
            pairs: vec![good, bad, missing],
        };
        let report = run_batch(&job, &ParserFactory::new());

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.outcomes[0].status, PairStatus::Success);
        let summary = &report.outcomes[0].result.as_ref().unwrap().summary;
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.mismatches, 0);
        assert_eq!(summary.only_in_a, vec!["2"]);

        assert_eq!(report.outcomes[1].status, PairStatus::Failed);
        assert!(report.outcomes[1]
            .error
            .as_deref()
            .unwrap()
            .contains("could not be resolved in dataset B"));
        assert_eq!(report.outcomes[2].status, PairStatus::Failed);
        assert!(report.outcomes[2].error.as_deref().unwrap().contains("nope.csv"));
        assert!(report.has_differences());
    }

    #[test]
    fn test_cancelled_batch_skips_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let pair = write_pair(dir.path(), "p", "id\n1\n", "id\n1\n");
        let job = JobConfig {
            defaults: ReconOptions::new(),
            read: ReadOptions::default(),
            pairs: vec![pair.clone(), pair],
        };

        let report = run_batch_until(&job, &ParserFactory::new(), &AtomicBool::new(true));
        assert_eq!(report.count(PairStatus::Skipped), 2);
        assert!(!report.has_differences());
    }
}
