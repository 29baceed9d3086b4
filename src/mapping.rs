//! Schema mapping: primary-key and column-correspondence suggestions

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Result};
use crate::model::Dataset;
use crate::normalize::{is_missing, normalize_column_name, normalize_key_value};

/// Name fragments that mark a column as a likely identifier
const KEY_HINTS: [&str; 5] = ["id", "ref", "no", "key", "code"];

/// How matched B columns are handed out while suggesting a mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStrategy {
    /// First normalized match wins; a B column may be targeted more than once
    #[default]
    Greedy,
    /// Each B column is reserved by the first A column that matches it
    OneToOne,
}

/// Ordered correspondence from A column names to B column names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(IndexMap<String, String>);

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an A column to a B column, replacing any earlier target
    pub fn insert(&mut self, a: impl Into<String>, b: impl Into<String>) {
        self.0.insert(a.into(), b.into());
    }

    pub fn get(&self, a: &str) -> Option<&str> {
        self.0.get(a).map(String::as_str)
    }

    pub fn contains(&self, a: &str) -> bool {
        self.0.contains_key(a)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    /// Map every column to itself
    pub fn identity<S: AsRef<str>>(columns: &[S]) -> Self {
        columns
            .iter()
            .map(|c| (c.as_ref().to_string(), c.as_ref().to_string()))
            .collect()
    }

    /// B columns targeted by more than one A column, with their sources in order
    pub fn ambiguous_targets(&self) -> Vec<(String, Vec<String>)> {
        let mut by_target: IndexMap<&str, Vec<String>> = IndexMap::new();
        for (a, b) in self.iter() {
            by_target.entry(b).or_default().push(a.to_string());
        }
        by_target
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(target, sources)| (target.to_string(), sources))
            .collect()
    }
}

impl FromIterator<(String, String)> for ColumnMapping {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Suggest the column most likely to identify rows uniquely.
///
/// Prefers a fully unique column whose name looks like an identifier, then any
/// fully unique column, then the first column. Missing values are ignored when
/// judging uniqueness; a column with no values at all never counts as unique.
pub fn suggest_primary_key(dataset: &Dataset) -> Result<String> {
    let first = dataset
        .columns
        .first()
        .ok_or_else(|| ReconError::InvalidArgument("dataset has no columns".to_string()))?;

    let unique: Vec<&str> = dataset
        .columns
        .iter()
        .filter(|col| is_unique_column(dataset, col.index))
        .map(|col| col.name.as_str())
        .collect();

    let hinted = unique.iter().find(|name| {
        let normalized = normalize_column_name(name);
        KEY_HINTS.iter().any(|hint| normalized.contains(hint))
    });

    let choice = hinted
        .or_else(|| unique.first())
        .copied()
        .unwrap_or(first.name.as_str());

    log::debug!("suggested primary key '{choice}' ({} unique candidates)", unique.len());
    Ok(choice.to_string())
}

fn is_unique_column(dataset: &Dataset, index: usize) -> bool {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    for value in dataset.column_values(index) {
        if is_missing(value) {
            continue;
        }
        if !seen.insert(normalize_key_value(value)) {
            return false;
        }
    }
    !seen.is_empty()
}

/// Suggest an A→B column mapping by normalized-name equality (greedy)
pub fn suggest_mapping<A, B>(columns_a: &[A], columns_b: &[B]) -> ColumnMapping
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    suggest_mapping_with(columns_a, columns_b, MappingStrategy::Greedy)
}

/// Suggest an A→B column mapping using the given strategy.
///
/// A columns are visited in order and take the first B column, in order,
/// whose non-empty normalized name is equal. Unmatched A columns are left out.
pub fn suggest_mapping_with<A, B>(
    columns_a: &[A],
    columns_b: &[B],
    strategy: MappingStrategy,
) -> ColumnMapping
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let normalized_b: Vec<String> = columns_b
        .iter()
        .map(|b| normalize_column_name(b.as_ref()))
        .collect();
    let mut reserved = vec![false; columns_b.len()];
    let mut mapping = ColumnMapping::new();

    for a in columns_a {
        let normalized_a = normalize_column_name(a.as_ref());
        if normalized_a.is_empty() {
            continue;
        }

        let found = normalized_b.iter().enumerate().position(|(i, nb)| {
            *nb == normalized_a && !(strategy == MappingStrategy::OneToOne && reserved[i])
        });

        if let Some(i) = found {
            reserved[i] = true;
            mapping.insert(a.as_ref(), columns_b[i].as_ref());
        }
    }

    mapping
}
