//! Arena-backed configuration tree
//!
//! Nodes live in a generational arena; a child stores its parent's index so
//! paths can be rebuilt for diagnostics. Ownership runs strictly top-down
//! through the branch maps.

use std::fmt;

use generational_arena::{Arena, Index};
use indexmap::IndexMap;
use itertools::Itertools;
use termtree::Tree;
use tracing::instrument;

use crate::domain::value::{RawMap, RawValue};

/// Separator between path segments in diagnostics.
pub const PATH_SEPARATOR: &str = "->";

/// Placeholder for a node that has no name.
pub const UNSPECIFIED: &str = "{unspecified}";

/// What a node holds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    /// Single leaf value
    Scalar(RawValue),
    /// Ordered leaf values, appended across sources
    List(Vec<RawValue>),
    /// Named children, in insertion order
    Branch(IndexMap<String, Index>),
}

impl NodeContent {
    pub fn empty_branch() -> Self {
        NodeContent::Branch(IndexMap::new())
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, NodeContent::Branch(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, NodeContent::List(_))
    }
}

/// Tree node in the arena.
#[derive(Debug)]
pub struct Node {
    /// Key under which the parent reaches this node
    pub name: String,
    /// Index of the enclosing node, None for the root
    pub parent: Option<Index>,
    pub content: NodeContent,
}

/// Merged configuration tree.
#[derive(Debug)]
pub struct ConfigTree {
    arena: Arena<Node>,
    root: Index,
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new("")
    }
}

impl ConfigTree {
    /// Creates a tree holding only an empty root branch.
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(Node {
            name: root_name.into(),
            parent: None,
            content: NodeContent::empty_branch(),
        });
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn root_ref(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            idx: self.root,
        }
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root_ref().keys().next().is_none()
    }

    pub fn node(&self, idx: Index) -> Option<NodeRef<'_>> {
        self.arena.get(idx).map(|_| NodeRef { tree: self, idx })
    }

    /// Index of the child `name` of a branch node.
    #[instrument(level = "trace", skip(self))]
    pub fn child(&self, parent: Index, name: &str) -> Option<Index> {
        match &self.arena.get(parent)?.content {
            NodeContent::Branch(children) => children.get(name).copied(),
            _ => None,
        }
    }

    /// Replaces (or creates) the child `name` of the branch `parent`.
    ///
    /// An existing child keeps its arena slot; any subtree it held is freed
    /// first. Returns `None` when `parent` is not a branch.
    #[instrument(level = "trace", skip(self, content))]
    pub fn set_child(&mut self, parent: Index, name: &str, content: NodeContent) -> Option<Index> {
        if !self.arena.get(parent)?.content.is_branch() {
            return None;
        }

        if let Some(existing) = self.child(parent, name) {
            self.remove_descendants(existing);
            if let Some(node) = self.arena.get_mut(existing) {
                node.content = content;
            }
            return Some(existing);
        }

        let idx = self.arena.insert(Node {
            name: name.to_string(),
            parent: Some(parent),
            content,
        });
        if let Some(NodeContent::Branch(children)) =
            self.arena.get_mut(parent).map(|node| &mut node.content)
        {
            children.insert(name.to_string(), idx);
        }
        Some(idx)
    }

    /// Returns the child `name` if it is a branch, otherwise replaces it
    /// with a fresh empty branch.
    pub fn ensure_branch(&mut self, parent: Index, name: &str) -> Option<Index> {
        match self.child(parent, name) {
            Some(idx) if self.content(idx).is_some_and(NodeContent::is_branch) => Some(idx),
            _ => self.set_child(parent, name, NodeContent::empty_branch()),
        }
    }

    /// Appends to the list child `name`; a missing or non-list child is
    /// reset to an empty list first.
    pub fn append_to_list<I>(&mut self, parent: Index, name: &str, items: I) -> Option<Index>
    where
        I: IntoIterator<Item = RawValue>,
    {
        let idx = match self.child(parent, name) {
            Some(idx) if self.content(idx).is_some_and(NodeContent::is_list) => idx,
            _ => self.set_child(parent, name, NodeContent::List(Vec::new()))?,
        };
        if let Some(NodeContent::List(list)) = self.arena.get_mut(idx).map(|n| &mut n.content) {
            list.extend(items);
        }
        Some(idx)
    }

    /// Writes `value` under `parent` as-is, without merge semantics.
    ///
    /// Keyed maps become a fresh branch (recursively), positional values a
    /// list, everything else a scalar. Whatever was there before is dropped.
    pub fn set_value(&mut self, parent: Index, name: &str, value: RawValue) -> Option<Index> {
        let keyed = value.is_keyed();
        match value {
            RawValue::Map(map) if map.is_empty() => {
                self.set_child(parent, name, NodeContent::empty_branch())
            }
            RawValue::Map(map) if keyed => {
                let idx = self.set_child(parent, name, NodeContent::empty_branch())?;
                for (key, sub) in map {
                    self.set_value(idx, &key, sub);
                }
                Some(idx)
            }
            RawValue::Map(map) => {
                self.set_child(parent, name, NodeContent::List(map.into_values().collect()))
            }
            RawValue::List(items) => self.set_child(parent, name, NodeContent::List(items)),
            scalar => self.set_child(parent, name, NodeContent::Scalar(scalar)),
        }
    }

    fn content(&self, idx: Index) -> Option<&NodeContent> {
        self.arena.get(idx).map(|node| &node.content)
    }

    /// Frees every node below `idx`, leaving `idx` itself in place.
    #[instrument(level = "trace", skip(self))]
    fn remove_descendants(&mut self, idx: Index) {
        let doomed: Vec<Index> = self.iter_from(idx).skip(1).map(|(i, _)| i).collect();
        for i in doomed {
            self.arena.remove(i);
        }
        if let Some(NodeContent::Branch(children)) = self.arena.get_mut(idx).map(|n| &mut n.content)
        {
            children.clear();
        }
    }

    /// Pre-order traversal of the whole tree.
    pub fn iter(&self) -> TreeIterator<'_> {
        self.iter_from(self.root)
    }

    /// Pre-order traversal starting at `idx`.
    pub fn iter_from(&self, idx: Index) -> TreeIterator<'_> {
        TreeIterator {
            tree: self,
            stack: vec![idx],
        }
    }

    /// Plain nested value of the whole tree.
    pub fn flatten(&self) -> RawValue {
        self.root_ref().flatten()
    }
}

pub struct TreeIterator<'a> {
    tree: &'a ConfigTree,
    stack: Vec<Index>,
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.tree.arena.get(current) {
                if let NodeContent::Branch(children) = &node.content {
                    // Push in reverse for left-to-right traversal
                    self.stack.extend(children.values().rev().copied());
                }
                return Some((current, node));
            }
        }
        None
    }
}

/// Borrowed view of a node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a ConfigTree,
    idx: Index,
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("path", &self.path(None))
            .field("content", self.content())
            .finish()
    }
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a Node {
        // NodeRefs are only handed out for live indices and the tree is
        // borrowed immutably for 'a.
        &self.tree.arena[self.idx]
    }

    pub fn index(&self) -> Index {
        self.idx
    }

    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    pub fn content(&self) -> &'a NodeContent {
        &self.node().content
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.and_then(|p| self.tree.node(p))
    }

    pub fn is_branch(&self) -> bool {
        self.content().is_branch()
    }

    /// Path from the root to this node, `->`-joined, with `suffix` appended.
    ///
    /// Unnamed nodes render as `{unspecified}`.
    pub fn path(&self, suffix: Option<&str>) -> String {
        let mut segments = Vec::new();
        let mut current = Some(*self);
        while let Some(node) = current {
            let name = node.name();
            segments.push(if name.is_empty() { UNSPECIFIED } else { name });
            current = node.parent();
        }
        segments.reverse();
        if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
            segments.push(suffix);
        }
        segments.iter().join(PATH_SEPARATOR)
    }

    /// Child names of a branch; empty for leaves.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        let children = match self.content() {
            NodeContent::Branch(children) => Some(children),
            _ => None,
        };
        children
            .into_iter()
            .flat_map(|children| children.keys().map(String::as_str))
    }

    /// Child `key`, resolved to its value. Does not log.
    pub fn get(&self, key: &str) -> Option<Entry<'a>> {
        let idx = self.tree.child(self.idx, key)?;
        self.tree.node(idx).map(|node| node.entry())
    }

    /// True when the child exists and is not `null`.
    ///
    /// Unlike the emptiness check behind "not set" reads, `false`, `0` and
    /// `""` still count as present.
    pub fn has(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Entry::Scalar(RawValue::Null)) | None => false,
            Some(_) => true,
        }
    }

    /// This node as an access entry.
    pub fn entry(&self) -> Entry<'a> {
        match self.content() {
            NodeContent::Scalar(value) => Entry::Scalar(value),
            NodeContent::List(items) => Entry::List(items),
            NodeContent::Branch(_) => Entry::Node(*self),
        }
    }

    /// Plain nested value; names and parent links are not included.
    pub fn flatten(&self) -> RawValue {
        match self.content() {
            NodeContent::Scalar(value) => value.clone(),
            NodeContent::List(items) => RawValue::List(items.clone()),
            NodeContent::Branch(children) => {
                let map: RawMap = children
                    .iter()
                    .filter_map(|(key, &idx)| {
                        self.tree.node(idx).map(|child| (key.clone(), child.flatten()))
                    })
                    .collect();
                RawValue::Map(map)
            }
        }
    }

    /// Display tree rooted at this node.
    pub fn to_tree_string(&self) -> Tree<String> {
        let label = if self.name().is_empty() {
            UNSPECIFIED
        } else {
            self.name()
        };
        match self.content() {
            NodeContent::Scalar(value) => Tree::new(format!("{} = {}", label, value)),
            NodeContent::List(items) => Tree::new(format!(
                "{} = [{}]",
                label,
                items.iter().map(ToString::to_string).join(", ")
            )),
            NodeContent::Branch(children) => {
                let leaves: Vec<_> = children
                    .values()
                    .filter_map(|&idx| self.tree.node(idx))
                    .map(|child| child.to_tree_string())
                    .collect();
                Tree::new(label.to_string()).with_leaves(leaves)
            }
        }
    }
}

/// Resolved child value.
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    Scalar(&'a RawValue),
    List(&'a [RawValue]),
    Node(NodeRef<'a>),
}

impl<'a> Entry<'a> {
    /// Emptiness check; a branch is never empty.
    pub fn is_empty_value(&self) -> bool {
        match self {
            Entry::Scalar(value) => value.is_empty_value(),
            Entry::List(items) => items.is_empty(),
            Entry::Node(_) => false,
        }
    }

    pub fn to_raw(&self) -> RawValue {
        match self {
            Entry::Scalar(value) => (*value).clone(),
            Entry::List(items) => RawValue::List(items.to_vec()),
            Entry::Node(node) => node.flatten(),
        }
    }

    pub fn as_scalar(&self) -> Option<&'a RawValue> {
        match self {
            Entry::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&'a [RawValue]> {
        match self {
            Entry::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeRef<'a>> {
        match self {
            Entry::Node(node) => Some(*node),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.as_scalar().and_then(RawValue::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(RawValue::as_i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(RawValue::as_bool)
    }
}
