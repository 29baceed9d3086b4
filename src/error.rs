//! Error taxonomy for the reconciliation engine

use thiserror::Error;

/// Fatal conditions that stop a single reconciliation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// A caller precondition was violated (empty schema, unknown key column, bad tolerance)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No column of dataset B corresponds to the key column of dataset A
    #[error("key column '{key_column}' could not be resolved in dataset B")]
    KeyUnresolvedInOther { key_column: String },

    /// A job file could not be interpreted
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReconError>;
