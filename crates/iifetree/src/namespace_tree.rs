//! The namespace tree shared by every module of a bundle.
//!
//! The tree mirrors the directory layout of the bundled files:
//!
//! ```text
//! src/
//!  |_ utilA/
//!  |_ utilB/
//!       |_ utilC/
//! ```
//!
//! becomes `{ "src": { "utilA": {}, "utilB": { "utilC": {} } } }`. Embedded
//! libraries are stored as `null` leaves because the library itself assigns
//! the value at runtime.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Serialize;

use crate::{namespace::NamespacePath, types::FxIndexMap};

/// What kind of entry the last segment of an inserted path denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// A namespace object that rewritten modules extend.
    Namespace,
    /// A concrete value published by an embedded library.
    Library,
}

/// One level of the tree: either a namespace with children or a library leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamespaceNode(Option<FxIndexMap<String, NamespaceNode>>);

impl NamespaceNode {
    fn namespace() -> Self {
        Self(Some(FxIndexMap::default()))
    }

    fn library() -> Self {
        Self(None)
    }

    /// Children of this node, or `None` for a library leaf.
    pub fn children(&self) -> Option<&FxIndexMap<String, NamespaceNode>> {
        self.0.as_ref()
    }

    pub fn is_library(&self) -> bool {
        self.0.is_none()
    }
}

/// Outcome of [`NamespaceTree::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The path was added.
    Inserted,
    /// Every level already existed; nothing changed.
    Existing,
    /// An intermediate segment is an existing library leaf.
    Blocked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamespaceTree {
    root: FxIndexMap<String, NamespaceNode>,
}

impl NamespaceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Look up the node at `path`.
    pub fn get(&self, path: &NamespacePath) -> Option<&NamespaceNode> {
        let (last, parents) = path.segments().split_last()?;
        let mut level = &self.root;
        for segment in parents {
            level = level.get(segment)?.children()?;
        }
        level.get(last)
    }

    /// Insert `path`, creating every missing level.
    ///
    /// Existing entries are never replaced: inserting a library leaf where a
    /// namespace already exists (or the reverse) keeps the first insertion.
    pub fn insert(&mut self, path: &NamespacePath, kind: LeafKind) -> InsertOutcome {
        let Some((last, parents)) = path.segments().split_last() else {
            return InsertOutcome::Existing;
        };

        let mut level = &mut self.root;
        for segment in parents {
            let node = level
                .entry(segment.clone())
                .or_insert_with(NamespaceNode::namespace);
            let Some(children) = node.0.as_mut() else {
                warn!("Cannot insert '{path}': '{segment}' is an embedded library value");
                return InsertOutcome::Blocked;
            };
            level = children;
        }

        if level.contains_key(last) {
            return InsertOutcome::Existing;
        }

        let node = match kind {
            LeafKind::Namespace => NamespaceNode::namespace(),
            LeafKind::Library => NamespaceNode::library(),
        };
        debug!("Tree: added '{path}' ({kind:?})");
        level.insert(last.clone(), node);
        InsertOutcome::Inserted
    }

    /// Compact JSON rendering, with library leaves as `null`.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize the namespace tree")
    }
}
