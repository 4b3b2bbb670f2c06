// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Content tree integration.
//!
//! The engine only needs read access to the authored tree, one write for
//! the replication stamp on a metadata child, and one commit per batch.
//! [`ContentTree`] captures exactly that, so the storage engine can be
//! swapped and tests can run against [`MemoryContentTree`].
//!
//! # Example
//!
//! ```rust
//! use content_replication::content_tree::{ContentTree, MemoryContentTree};
//! use content_replication::node::{ContentNode, NodePath};
//!
//! let tree = MemoryContentTree::new();
//! let page = NodePath::parse("/content/site").unwrap();
//! tree.insert(ContentNode::new(page.clone(), "per:Page"));
//!
//! assert!(tree.node(&page).is_some());
//! assert_eq!(tree.children(&NodePath::parse("/content").unwrap()).len(), 1);
//! ```

use crate::node::{ContentNode, NodePath, PropertyValue};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Property holding the replication timestamp.
pub const REPLICATED_PROPERTY: &str = "per:Replicated";
/// Property holding the replicating actor.
pub const REPLICATED_BY_PROPERTY: &str = "per:ReplicatedBy";
/// Property holding the stored artifact reference.
pub const REPLICATION_REF_PROPERTY: &str = "per:ReplicationRef";

/// Primary type used for intermediate nodes created by [`MemoryContentTree::insert`].
pub const UNSTRUCTURED_TYPE: &str = "nt:unstructured";

/// Simplified error for content tree operations.
#[derive(Debug, Clone)]
pub struct TreeError(pub String);

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TreeError {}

/// Replication bookkeeping persisted on a metadata child.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationStamp {
    /// When the artifact was stored.
    pub replicated_at: DateTime<Utc>,
    /// Who replicated it.
    pub replicated_by: String,
    /// Reference path returned by the target store.
    pub target_ref: String,
}

impl ReplicationStamp {
    /// Stamp the current time.
    pub fn now(replicated_by: impl Into<String>, target_ref: impl Into<String>) -> Self {
        Self {
            replicated_at: Utc::now(),
            replicated_by: replicated_by.into(),
            target_ref: target_ref.into(),
        }
    }

    /// Read a stamp back from node properties.
    pub fn from_node(node: &ContentNode) -> Option<Self> {
        Some(Self {
            replicated_at: node.property(REPLICATED_PROPERTY)?.as_date()?,
            replicated_by: node.property(REPLICATED_BY_PROPERTY)?.as_str()?.to_string(),
            target_ref: node.property(REPLICATION_REF_PROPERTY)?.as_str()?.to_string(),
        })
    }

    fn apply_to(&self, node: &mut ContentNode) {
        node.properties.insert(
            REPLICATED_PROPERTY.to_string(),
            PropertyValue::Date(self.replicated_at),
        );
        node.properties.insert(
            REPLICATED_BY_PROPERTY.to_string(),
            PropertyValue::String(self.replicated_by.clone()),
        );
        node.properties.insert(
            REPLICATION_REF_PROPERTY.to_string(),
            PropertyValue::String(self.target_ref.clone()),
        );
    }
}

/// What the engine needs from the authored content tree.
///
/// Navigation is synchronous and cheap; nodes are handed out as shared
/// snapshots. `stamp` and `commit` are the only mutations.
pub trait ContentTree: Send + Sync + 'static {
    /// Look up a node by absolute path.
    fn node(&self, path: &NodePath) -> Option<Arc<ContentNode>>;

    /// Direct children in document order.
    fn children(&self, path: &NodePath) -> Vec<Arc<ContentNode>> {
        match self.node(path) {
            Some(node) => node
                .children
                .iter()
                .filter_map(|name| self.node(&node.path.child(name)))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Write a replication stamp onto a metadata child.
    ///
    /// The write becomes durable on the next [`commit`](Self::commit).
    fn stamp(&self, path: &NodePath, stamp: &ReplicationStamp) -> Result<(), TreeError>;

    /// Persist pending writes. Called at most once per batch.
    fn commit(&self) -> Result<(), TreeError>;
}

/// Path-indexed in-memory content tree.
///
/// Stamps are staged and only applied to the nodes on `commit`, latest
/// stamp per path wins.
pub struct MemoryContentTree {
    nodes: DashMap<NodePath, Arc<ContentNode>>,
    pending: DashMap<NodePath, ReplicationStamp>,
    commits: AtomicUsize,
    fail_commit: AtomicBool,
}

impl MemoryContentTree {
    /// Create a tree containing only the root node.
    pub fn new() -> Self {
        let nodes = DashMap::new();
        nodes.insert(
            NodePath::root(),
            Arc::new(ContentNode::new(NodePath::root(), "rep:root")),
        );
        Self {
            nodes,
            pending: DashMap::new(),
            commits: AtomicUsize::new(0),
            fail_commit: AtomicBool::new(false),
        }
    }

    /// Insert or replace a node and link it into its parent.
    ///
    /// Missing ancestors are created as `nt:unstructured`. Replacing a node
    /// keeps the children already linked to it.
    pub fn insert(&self, mut node: ContentNode) {
        if let Some(parent) = node.path.parent() {
            if !self.nodes.contains_key(&parent) {
                self.insert(ContentNode::new(parent.clone(), UNSTRUCTURED_TYPE));
            }
            if let Some(mut entry) = self.nodes.get_mut(&parent) {
                if !entry.has_child(node.name()) {
                    Arc::make_mut(entry.value_mut()).children.push(node.name().to_string());
                }
            }
        }

        if let Some(existing) = self.nodes.get(&node.path) {
            for child in &existing.children {
                if !node.has_child(child) {
                    node.children.push(child.clone());
                }
            }
        }
        self.nodes.insert(node.path.clone(), Arc::new(node));
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Number of stamps waiting for a commit.
    pub fn pending_stamps(&self) -> usize {
        self.pending.len()
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Make every following commit fail (for testing).
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Committed stamp of a metadata child, if any.
    pub fn stamp_of(&self, path: &NodePath) -> Option<ReplicationStamp> {
        self.nodes.get(path).and_then(|n| ReplicationStamp::from_node(&n))
    }
}

impl Default for MemoryContentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTree for MemoryContentTree {
    fn node(&self, path: &NodePath) -> Option<Arc<ContentNode>> {
        self.nodes.get(path).map(|n| Arc::clone(n.value()))
    }

    fn stamp(&self, path: &NodePath, stamp: &ReplicationStamp) -> Result<(), TreeError> {
        if !self.nodes.contains_key(path) {
            return Err(TreeError(format!("No node at '{}'", path)));
        }
        self.pending.insert(path.clone(), stamp.clone());
        Ok(())
    }

    fn commit(&self) -> Result<(), TreeError> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(TreeError("Simulated commit failure".to_string()));
        }

        let staged: Vec<(NodePath, ReplicationStamp)> = self
            .pending
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        self.pending.clear();

        for (path, stamp) in staged {
            if let Some(mut entry) = self.nodes.get_mut(&path) {
                stamp.apply_to(Arc::make_mut(entry.value_mut()));
            }
        }

        self.commits.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(commits = self.commit_count(), "Content tree committed");
        Ok(())
    }
}
