//! datarecon - Key-based reconciliation of tabular data
//!
//! Aligns two independently produced datasets by a key column, maps their
//! columns onto each other, and reports one-sided keys and field differences
//! under a numeric tolerance.

pub mod batch;
pub mod config;
pub mod diff;
pub mod error;
pub mod mapping;
pub mod model;
pub mod normalize;
pub mod output;
pub mod parser;

pub use config::ReconOptions;
pub use diff::{reconcile, reconcile_with, DiffResult};
pub use error::ReconError;
pub use mapping::{suggest_mapping, suggest_primary_key, ColumnMapping};
pub use model::Dataset;
