//! Domain layer: raw values, the configuration tree and the merge engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod key;
pub mod merge;
pub mod tree;
pub mod value;

pub use error::DomainError;
pub use key::KeyPath;
pub use merge::{EmptyContainerPolicy, MergeEngine, MergePolicy, Source, SourceId};
pub use tree::{ConfigTree, Entry, Node, NodeContent, NodeRef, PATH_SEPARATOR, UNSPECIFIED};
pub use value::{RawMap, RawValue};

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
///
/// Uses shellexpand; on failure the input is returned unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
