//! Key indexing and key-set partitioning

use indexmap::IndexMap;

use crate::model::{Dataset, Row};
use crate::normalize::normalize_key_value;

/// Rows of one dataset indexed by normalized key value.
///
/// Keys keep the position of their first appearance; when a key repeats, the
/// later row replaces the earlier one and the repeat is counted.
pub struct KeyIndex<'a> {
    rows: IndexMap<String, &'a Row>,
    duplicates: usize,
}

impl<'a> KeyIndex<'a> {
    /// Index every row of `dataset` by the column at `key_index`
    pub fn build(dataset: &'a Dataset, key_index: usize) -> Self {
        let mut rows = IndexMap::with_capacity(dataset.row_count());
        let mut duplicates = 0;

        for row in &dataset.rows {
            let key = row.get(key_index).map(normalize_key_value).unwrap_or_default();
            if rows.insert(key, row).is_some() {
                duplicates += 1;
            }
        }

        Self { rows, duplicates }
    }

    /// Look up a row by normalized key
    pub fn get(&self, key: &str) -> Option<&'a Row> {
        self.rows.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    /// Distinct keys in first-appearance order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose key repeated an earlier row's key
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }
}

/// Keys split into one-sided and shared sets
#[derive(Debug, Default, PartialEq, Eq)]
pub struct KeyPartition {
    /// Keys of A absent from B, in A order
    pub only_in_a: Vec<String>,
    /// Keys of B absent from A, in B order
    pub only_in_b: Vec<String>,
    /// Keys present on both sides, in A order
    pub common: Vec<String>,
}

impl KeyPartition {
    pub fn new(a: &KeyIndex<'_>, b: &KeyIndex<'_>) -> Self {
        let mut partition = Self::default();

        for key in a.keys() {
            if b.contains(key) {
                partition.common.push(key.to_string());
            } else {
                partition.only_in_a.push(key.to_string());
            }
        }

        partition.only_in_b = b
            .keys()
            .filter(|key| !a.contains(key))
            .map(str::to_string)
            .collect();

        partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn keyed(keys: &[CellValue]) -> Dataset {
        Dataset::from_rows(
            &["id", "n"],
            keys.iter()
                .enumerate()
                .map(|(i, k)| vec![k.clone(), CellValue::Int(i as i64)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_last_row_wins_and_duplicates_counted() {
        let ds = keyed(&["1".into(), "2".into(), " 1".into()]);
        let index = KeyIndex::build(&ds, 0);

        assert_eq!(index.len(), 2);
        assert_eq!(index.duplicate_count(), 1);
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(index.get("1").unwrap().cells[1], CellValue::Int(2));
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let a = keyed(&[1.into(), 2.into(), 3.into()]);
        let b = keyed(&["4".into(), "2".into(), "1".into()]);
        let ia = KeyIndex::build(&a, 0);
        let ib = KeyIndex::build(&b, 0);

        let partition = KeyPartition::new(&ia, &ib);
        assert_eq!(partition.common, vec!["1", "2"]);
        assert_eq!(partition.only_in_a, vec!["3"]);
        assert_eq!(partition.only_in_b, vec!["4"]);
    }
}
