//! Merge engine: folds raw source structures into the configuration tree
//!
//! Merge semantics, applied per key in source order:
//! - Keyed maps: deep merge into a branch (siblings already present survive)
//! - Positional lists: appended to the existing list (a non-list is reset first)
//! - Scalars: overwrite (last write wins)

use std::fmt;
use std::path::Path;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::tree::{ConfigTree, NodeContent};
use crate::domain::value::RawValue;

/// Identifies where a raw structure came from, for logs only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId(String);

impl SourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        SourceId(s.to_string())
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        SourceId(s)
    }
}

impl From<&Path> for SourceId {
    fn from(path: &Path) -> Self {
        SourceId(path.display().to_string())
    }
}

/// One parsed source, ready to merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: SourceId,
    pub value: RawValue,
}

impl Source {
    pub fn new(id: impl Into<SourceId>, value: RawValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// How an empty list or map is merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyContainerPolicy {
    /// Leave whatever is there untouched and create nothing
    #[default]
    Skip,
    /// Reset the target to an empty list (or empty branch for maps)
    Clear,
    /// Append nothing to a list: an existing list is kept, anything else
    /// (including a missing child) becomes an empty list
    Append,
}

impl fmt::Display for EmptyContainerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyContainerPolicy::Skip => write!(f, "skip"),
            EmptyContainerPolicy::Clear => write!(f, "clear"),
            EmptyContainerPolicy::Append => write!(f, "append"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergePolicy {
    pub empty_containers: EmptyContainerPolicy,
}

/// Folds sources into a tree, later sources overriding earlier ones.
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    policy: MergePolicy,
}

impl MergeEngine {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Merges every top-level key of `source` into the tree root.
    ///
    /// Returns false when the source was skipped because its top level is
    /// not a non-empty map.
    #[instrument(level = "debug", skip_all, fields(source = %source.id))]
    pub fn merge_source(&self, tree: &mut ConfigTree, source: &Source) -> bool {
        let map = match &source.value {
            RawValue::Map(map) if !map.is_empty() => map,
            other => {
                debug!(
                    "skipping source {}: top level is an empty or non-map {}",
                    source.id,
                    other.kind()
                );
                return false;
            }
        };

        let root = tree.root();
        for (name, value) in map {
            self.merge_into(tree, root, name, value);
        }
        debug!("merged {} top-level keys from {}", map.len(), source.id);
        true
    }

    /// Merges sources in order; returns how many were applied.
    pub fn merge_sources<'s, I>(&self, tree: &mut ConfigTree, sources: I) -> usize
    where
        I: IntoIterator<Item = &'s Source>,
    {
        sources
            .into_iter()
            .filter(|source| self.merge_source(tree, source))
            .count()
    }

    /// Merges `value` into the child `name` of `node`.
    pub fn merge_into(&self, tree: &mut ConfigTree, node: Index, name: &str, value: &RawValue) {
        if name.is_empty() {
            debug!("ignoring value with empty name: {}", value.kind());
            return;
        }

        if value.is_container() && value.is_empty_value() {
            self.merge_empty_container(tree, node, name, value);
            return;
        }

        if let RawValue::Map(map) = value {
            if value.is_keyed() {
                let Some(child) = tree.ensure_branch(node, name) else {
                    debug!("cannot attach '{}': parent is not a branch", name);
                    return;
                };
                for (sub_name, sub_value) in map {
                    self.merge_into(tree, child, sub_name, sub_value);
                }
                return;
            }
        }

        let attached = match value.sequence_items() {
            Some(items) => tree.append_to_list(node, name, items.into_iter().cloned()),
            None => tree.set_child(node, name, NodeContent::Scalar(value.clone())),
        };
        if attached.is_none() {
            debug!("cannot attach '{}': parent is not a branch", name);
        }
    }

    fn merge_empty_container(
        &self,
        tree: &mut ConfigTree,
        node: Index,
        name: &str,
        value: &RawValue,
    ) {
        match self.policy.empty_containers {
            EmptyContainerPolicy::Skip => {
                trace!("empty {} for '{}' leaves prior value", value.kind(), name);
            }
            EmptyContainerPolicy::Clear => {
                let content = match value {
                    RawValue::Map(_) => NodeContent::empty_branch(),
                    _ => NodeContent::List(Vec::new()),
                };
                tree.set_child(node, name, content);
            }
            EmptyContainerPolicy::Append => {
                tree.append_to_list(node, name, std::iter::empty());
            }
        }
    }
}
