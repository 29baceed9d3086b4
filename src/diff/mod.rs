//! Reconciliation engine: key repair, key partitioning, and row comparison

pub mod cell_diff;
mod key_index;

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::{validate_tolerance, ReconOptions};
use crate::error::{ReconError, Result};
use crate::mapping::ColumnMapping;
use crate::model::{CellValue, Dataset, Row};
use crate::normalize::normalize_column_name;

pub use cell_diff::{values_equal, CellComparator};
pub use key_index::{KeyIndex, KeyPartition};

/// The differing values of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuePair {
    pub value_a: CellValue,
    pub value_b: CellValue,
}

/// A shared key with at least one differing mapped column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDiff {
    /// Normalized key value
    pub key: String,
    /// Differences by A-side column name, in mapping order
    pub differences: IndexMap<String, ValuePair>,
}

/// Which input a diagnostic refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    A,
    B,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Advisory conditions reported alongside a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconWarning {
    /// Several A columns are compared against the same B column
    AmbiguousMapping { target: String, sources: Vec<String> },
    /// Rows whose key repeated an earlier key; the last such row was compared
    DuplicateKeys { side: Side, count: usize },
    /// A mapping entry naming a column that does not exist; it was skipped
    UnknownMappedColumn { column_a: String, column_b: String },
}

impl std::fmt::Display for ReconWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconWarning::AmbiguousMapping { target, sources } => {
                write!(f, "column '{}' in B is mapped from {}", target, sources.join(", "))
            }
            ReconWarning::DuplicateKeys { side, count } => {
                write!(f, "{} duplicate key row(s) in dataset {}; last occurrence compared", count, side)
            }
            ReconWarning::UnknownMappedColumn { column_a, column_b } => {
                write!(f, "mapping '{}' -> '{}' names a missing column; skipped", column_a, column_b)
            }
        }
    }
}

/// Counts and one-sided keys
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_a: usize,
    pub total_b: usize,
    /// Keys present in both datasets
    pub matched: usize,
    /// Shared keys with at least one differing column
    pub mismatches: usize,
    /// Normalized keys only in A, in A order
    pub only_in_a: Vec<String>,
    /// Normalized keys only in B, in B order
    pub only_in_b: Vec<String>,
    pub duplicate_keys_a: usize,
    pub duplicate_keys_b: usize,
}

/// Result of reconciling two datasets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffResult {
    pub key_column_a: String,
    /// The B column the key was resolved to
    pub key_column_b: String,
    /// A-side names of every compared column
    pub compared_columns: Vec<String>,
    pub summary: Summary,
    pub detail: Vec<RowDiff>,
    pub warnings: Vec<ReconWarning>,
}

impl DiffResult {
    /// Any one-sided keys or differing rows
    pub fn has_differences(&self) -> bool {
        self.summary.mismatches > 0
            || !self.summary.only_in_a.is_empty()
            || !self.summary.only_in_b.is_empty()
    }

    /// Total differing cells across all rows
    pub fn cells_changed(&self) -> usize {
        self.detail.iter().map(|d| d.differences.len()).sum()
    }
}

/// A mapped column resolved to positions on both sides
#[derive(Debug, Clone)]
struct ColumnPlan {
    name: String,
    index_a: usize,
    index_b: usize,
}

/// Reconciliation engine; holds only the comparison policy
pub struct ReconEngine {
    cell_comparator: CellComparator,
}

impl ReconEngine {
    /// Create an engine with the given numeric tolerance
    pub fn new(tolerance: f64) -> Result<Self> {
        validate_tolerance(tolerance)?;
        Ok(Self {
            cell_comparator: CellComparator::new(tolerance),
        })
    }

    /// Reconcile `b` against `a` keyed on `key_column_a`
    pub fn reconcile(
        &self,
        a: &Dataset,
        b: &Dataset,
        key_column_a: &str,
        mapping: &ColumnMapping,
    ) -> Result<DiffResult> {
        if a.column_count() == 0 {
            return Err(ReconError::InvalidArgument("dataset A has no columns".to_string()));
        }
        if b.column_count() == 0 {
            return Err(ReconError::InvalidArgument("dataset B has no columns".to_string()));
        }
        let key_index_a = a.column_index(key_column_a).ok_or_else(|| {
            ReconError::InvalidArgument(format!(
                "key column '{}' does not exist in dataset A",
                key_column_a
            ))
        })?;

        let mut warnings = Vec::new();
        let (plan, key_column_b) = build_plan(a, b, key_column_a, mapping, &mut warnings)?;
        let key_index_b = b.column_index(&key_column_b).ok_or_else(|| {
            ReconError::KeyUnresolvedInOther {
                key_column: key_column_a.to_string(),
            }
        })?;
        log::debug!(
            "reconciling on '{}' -> '{}' over {} column(s)",
            key_column_a,
            key_column_b,
            plan.len()
        );

        let index_a = KeyIndex::build(a, key_index_a);
        let index_b = KeyIndex::build(b, key_index_b);
        for (side, count) in [
            (Side::A, index_a.duplicate_count()),
            (Side::B, index_b.duplicate_count()),
        ] {
            if count > 0 {
                warnings.push(ReconWarning::DuplicateKeys { side, count });
            }
        }

        let partition = KeyPartition::new(&index_a, &index_b);

        let mut detail = Vec::new();
        for key in &partition.common {
            let (Some(row_a), Some(row_b)) = (index_a.get(key), index_b.get(key)) else {
                continue;
            };
            let differences = self.compare_rows(row_a, row_b, &plan);
            if !differences.is_empty() {
                detail.push(RowDiff {
                    key: key.clone(),
                    differences,
                });
            }
        }

        for warning in &warnings {
            log::warn!("{}", warning);
        }

        let summary = Summary {
            total_a: a.row_count(),
            total_b: b.row_count(),
            matched: partition.common.len(),
            mismatches: detail.len(),
            only_in_a: partition.only_in_a,
            only_in_b: partition.only_in_b,
            duplicate_keys_a: index_a.duplicate_count(),
            duplicate_keys_b: index_b.duplicate_count(),
        };

        Ok(DiffResult {
            key_column_a: key_column_a.to_string(),
            key_column_b,
            compared_columns: plan.into_iter().map(|p| p.name).collect(),
            summary,
            detail,
            warnings,
        })
    }

    /// Compare the mapped cells of two rows
    fn compare_rows(&self, row_a: &Row, row_b: &Row, plan: &[ColumnPlan]) -> IndexMap<String, ValuePair> {
        let mut differences = IndexMap::new();

        for column in plan {
            let (Some(value_a), Some(value_b)) = (row_a.get(column.index_a), row_b.get(column.index_b))
            else {
                continue;
            };

            if !self.cell_comparator.equal(value_a, value_b) {
                differences.insert(
                    column.name.clone(),
                    ValuePair {
                        value_a: value_a.clone(),
                        value_b: value_b.clone(),
                    },
                );
            }
        }

        differences
    }
}

/// Find the B column standing for the A key column.
///
/// An existing mapping entry wins; otherwise the first B column with the same
/// normalized name, then a B column with the literal same name.
fn resolve_key_in_b(b: &Dataset, key_column_a: &str, mapping: &ColumnMapping) -> Option<String> {
    if let Some(mapped) = mapping.get(key_column_a) {
        if b.column_index(mapped).is_some() {
            return Some(mapped.to_string());
        }
    }

    let normalized = normalize_column_name(key_column_a);
    if !normalized.is_empty() {
        if let Some(col) = b
            .columns
            .iter()
            .find(|c| normalize_column_name(&c.name) == normalized)
        {
            return Some(col.name.clone());
        }
    }

    b.column_index(key_column_a).map(|_| key_column_a.to_string())
}

/// Resolve the key counterpart and every mapping entry to column positions
fn build_plan(
    a: &Dataset,
    b: &Dataset,
    key_column_a: &str,
    mapping: &ColumnMapping,
    warnings: &mut Vec<ReconWarning>,
) -> Result<(Vec<ColumnPlan>, String)> {
    let key_column_b = resolve_key_in_b(b, key_column_a, mapping).ok_or_else(|| {
        ReconError::KeyUnresolvedInOther {
            key_column: key_column_a.to_string(),
        }
    })?;

    let mut effective = ColumnMapping::new();
    for (col_a, col_b) in mapping.iter() {
        if a.column_index(col_a).is_none() || b.column_index(col_b).is_none() {
            warnings.push(ReconWarning::UnknownMappedColumn {
                column_a: col_a.to_string(),
                column_b: col_b.to_string(),
            });
            continue;
        }
        effective.insert(col_a, col_b);
    }
    if effective.get(key_column_a) != Some(key_column_b.as_str()) {
        log::debug!("key column '{}' paired with '{}' in B", key_column_a, key_column_b);
        effective.insert(key_column_a, key_column_b.as_str());
    }

    for (target, sources) in effective.ambiguous_targets() {
        warnings.push(ReconWarning::AmbiguousMapping { target, sources });
    }

    let plan = effective
        .iter()
        .filter_map(|(col_a, col_b)| {
            Some(ColumnPlan {
                name: col_a.to_string(),
                index_a: a.column_index(col_a)?,
                index_b: b.column_index(col_b)?,
            })
        })
        .collect();

    Ok((plan, key_column_b))
}

/// Reconcile two datasets with an explicit key, mapping, and tolerance
pub fn reconcile(
    a: &Dataset,
    b: &Dataset,
    key_column_a: &str,
    mapping: &ColumnMapping,
    tolerance: f64,
) -> Result<DiffResult> {
    ReconEngine::new(tolerance)?.reconcile(a, b, key_column_a, mapping)
}

/// Reconcile using options, suggesting the key and mapping where unset
pub fn reconcile_with(a: &Dataset, b: &Dataset, options: &ReconOptions) -> Result<DiffResult> {
    if a.column_count() == 0 || b.column_count() == 0 {
        return Err(ReconError::InvalidArgument("dataset has no columns".to_string()));
    }
    let (key, mapping) = options.resolve(a, b)?;
    reconcile(a, b, &key, &mapping, options.tolerance)
}
