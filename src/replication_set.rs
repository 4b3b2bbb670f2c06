// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Ordered, path-unique collection of nodes to replicate.
//!
//! Insertion order is the target write order. A path is kept at its first
//! position; later pushes of the same path are ignored (first wins).

use crate::node::{ContentNode, NodePath};
use std::collections::HashSet;
use std::sync::Arc;

/// Ordered set of nodes, unique by path.
#[derive(Debug, Clone, Default)]
pub struct ReplicationSet {
    nodes: Vec<Arc<ContentNode>>,
    index: HashSet<NodePath>,
}

impl ReplicationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node unless its path is already present.
    ///
    /// Returns `true` if the node was added.
    pub fn push(&mut self, node: Arc<ContentNode>) -> bool {
        if self.index.contains(&node.path) {
            return false;
        }
        self.index.insert(node.path.clone());
        self.nodes.push(node);
        true
    }

    /// Whether a node with this path is present.
    pub fn contains(&self, path: &NodePath) -> bool {
        self.index.contains(path)
    }

    /// Keep only nodes matching the predicate, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&ContentNode) -> bool) {
        let index = &mut self.index;
        self.nodes.retain(|node| {
            let kept = keep(node);
            if !kept {
                index.remove(&node.path);
            }
            kept
        });
    }

    /// Position of a path in write order.
    pub fn position(&self, path: &NodePath) -> Option<usize> {
        if !self.contains(path) {
            return None;
        }
        self.nodes.iter().position(|n| &n.path == path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in write order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<ContentNode>> {
        self.nodes.iter()
    }

    /// Paths in write order.
    pub fn paths(&self) -> Vec<NodePath> {
        self.nodes.iter().map(|n| n.path.clone()).collect()
    }
}

impl FromIterator<Arc<ContentNode>> for ReplicationSet {
    fn from_iter<I: IntoIterator<Item = Arc<ContentNode>>>(iter: I) -> Self {
        let mut set = ReplicationSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Arc<ContentNode>> for ReplicationSet {
    fn extend<I: IntoIterator<Item = Arc<ContentNode>>>(&mut self, iter: I) {
        for node in iter {
            self.push(node);
        }
    }
}

impl IntoIterator for ReplicationSet {
    type Item = Arc<ContentNode>;
    type IntoIter = std::vec::IntoIter<Arc<ContentNode>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReplicationSet {
    type Item = &'a Arc<ContentNode>;
    type IntoIter = std::slice::Iter<'a, Arc<ContentNode>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(path: &str) -> Arc<ContentNode> {
        Arc::new(ContentNode::new(NodePath::parse(path).unwrap(), "per:Page"))
    }

    #[test]
    fn test_push_deduplicates_by_path() {
        let mut set = ReplicationSet::new();
        assert!(set.push(node("/content/a")));
        assert!(set.push(node("/content/b")));
        assert!(!set.push(node("/content/a")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_first_position_wins() {
        let set: ReplicationSet = vec![
            node("/content/b"),
            node("/content/a"),
            node("/content/b"),
        ]
        .into_iter()
        .collect();
        let paths: Vec<String> = set.paths().iter().map(|p| p.to_string()).collect();
        assert_eq!(paths, vec!["/content/b", "/content/a"]);
    }

    #[test]
    fn test_retain_updates_index() {
        let mut set: ReplicationSet = vec![node("/content/a"), node("/content/a/jcr:content")]
            .into_iter()
            .collect();
        set.retain(|n| n.name() != "jcr:content");
        assert_eq!(set.len(), 1);
        assert!(!set.contains(&NodePath::parse("/content/a/jcr:content").unwrap()));

        // Removed path can be added again
        assert!(set.push(node("/content/a/jcr:content")));
    }

    #[test]
    fn test_position() {
        let set: ReplicationSet = vec![node("/x"), node("/y")].into_iter().collect();
        assert_eq!(set.position(&NodePath::parse("/y").unwrap()), Some(1));
        assert_eq!(set.position(&NodePath::parse("/z").unwrap()), None);
    }

    #[test]
    fn test_empty() {
        let set = ReplicationSet::new();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }
}
