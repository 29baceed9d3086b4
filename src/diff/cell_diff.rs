//! Cell-level comparison logic

use crate::model::CellValue;
use crate::normalize::{is_missing, try_parse_number};

/// Cell comparator applying the numeric tolerance policy
#[derive(Debug, Clone, Copy)]
pub struct CellComparator {
    tolerance: f64,
}

impl CellComparator {
    /// Create a new cell comparator
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Compare two cell values for equality.
    ///
    /// Two missing values are equal. Two numeric-like values are equal within
    /// the tolerance, whatever their representation. Anything else compares
    /// by trimmed text, so a number against a non-number is a difference.
    pub fn equal(&self, a: &CellValue, b: &CellValue) -> bool {
        if is_missing(a) && is_missing(b) {
            return true;
        }

        if let (Some(x), Some(y)) = (try_parse_number(a), try_parse_number(b)) {
            return (x - y).abs() <= self.tolerance;
        }

        a.as_text().trim() == b.as_text().trim()
    }
}

impl Default for CellComparator {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Check two values for equality under a tolerance
pub fn values_equal(a: &CellValue, b: &CellValue, tolerance: f64) -> bool {
    CellComparator::new(tolerance).equal(a, b)
}
