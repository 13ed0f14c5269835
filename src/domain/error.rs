//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid use of the configuration tree.
/// Merging itself never fails: malformed input degrades to a no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid configuration key: '{0}'")]
    InvalidKey(String),

    #[error("configuration option '{path}' has not been set")]
    NotSet { path: String },
}
