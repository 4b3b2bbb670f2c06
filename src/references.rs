// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Reference graph discovery.
//!
//! # Forward references
//!
//! A forward reference is a property value that starts with one of the
//! configured prefixes (default `/content/`) and resolves to an existing
//! node. Values starting with `/` are looked up absolutely, anything else as
//! a relative path from the owning node.
//!
//! ```text
//! /content/site/home            (root: own properties always scanned)
//! ├── jcr:content               (ContentOnly: this subtree only)
//! │   └── hero  image=/content/assets/logo.png  ──►  /content/assets/logo.png
//! └── news                      (Subtree: scanned too)
//! ```
//!
//! # Reverse references
//!
//! A reverse scan walks every configured root and reports each node whose
//! properties contain the exact target path. A match found inside a metadata
//! child is attributed to the metadata child's parent (the page, not its
//! content).

use crate::config::Settings;
use crate::content_tree::ContentTree;
use crate::metrics;
use crate::node::{ContentNode, NodePath, SEPARATOR};
use crate::replication_set::ReplicationSet;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Which part of a root's subtree is scanned for properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanScope {
    /// Only the metadata child and its descendants.
    #[default]
    ContentOnly,
    /// Every descendant.
    Subtree,
}

/// One forward reference: `source.property` points at `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEdge {
    pub source: NodePath,
    pub property: String,
    pub target: NodePath,
}

/// One reverse reference.
#[derive(Debug, Clone)]
pub struct Reference {
    /// Node the reference is attributed to.
    pub matched: Arc<ContentNode>,
    /// Name of the property holding the path.
    pub property: String,
    /// Node that actually owns the property.
    pub referencing: NodePath,
}

/// Source and target roots of a local copy, used to pull in ancestors that
/// are missing or outdated below the target.
#[derive(Debug, Clone, Copy)]
struct CopyPair<'p> {
    source: &'p NodePath,
    target: &'p NodePath,
}

/// Walks the content tree for forward and reverse references.
pub struct ReferenceGraphBuilder<'a, T: ContentTree + ?Sized> {
    tree: &'a T,
    settings: &'a Settings,
}

impl<'a, T: ContentTree + ?Sized> ReferenceGraphBuilder<'a, T> {
    pub fn new(tree: &'a T, settings: &'a Settings) -> Self {
        Self { tree, settings }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Forward
    // ═══════════════════════════════════════════════════════════════════════

    /// Nodes referenced from `root`, in discovery order.
    ///
    /// With `traverse_deep`, every newly found node is scanned (same scope)
    /// before the scan of its referrer continues.
    pub fn forward(&self, root: &ContentNode, traverse_deep: bool, scope: ScanScope) -> ReplicationSet {
        self.collect_forward(root, traverse_deep, scope, None)
    }

    /// Like [`forward`](Self::forward), for a local copy from `source` to
    /// `target`: ancestors of a referenced node (below `source`) whose
    /// mirror under `target` is missing or older are inserted ahead of it.
    pub fn forward_between(
        &self,
        root: &ContentNode,
        traverse_deep: bool,
        scope: ScanScope,
        source: &NodePath,
        target: &NodePath,
    ) -> ReplicationSet {
        self.collect_forward(root, traverse_deep, scope, Some(CopyPair { source, target }))
    }

    fn collect_forward(
        &self,
        root: &ContentNode,
        traverse_deep: bool,
        scope: ScanScope,
        pair: Option<CopyPair<'_>>,
    ) -> ReplicationSet {
        let started = Instant::now();
        let mut result = ReplicationSet::new();
        self.traverse(root, traverse_deep, scope, pair, &mut result);
        metrics::record_reference_scan("forward", result.len(), started.elapsed());
        debug!(root = %root.path, found = result.len(), ?scope, traverse_deep, "Forward references collected");
        result
    }

    fn traverse(
        &self,
        root: &ContentNode,
        traverse_deep: bool,
        scope: ScanScope,
        pair: Option<CopyPair<'_>>,
        result: &mut ReplicationSet,
    ) {
        self.scan_properties(root, traverse_deep, scope, pair, result);
        match scope {
            ScanScope::ContentOnly => {
                let metadata = root.path.child(&self.settings.names.metadata_child);
                if let Some(content) = self.tree.node(&metadata) {
                    self.scan_subtree(&content, traverse_deep, scope, pair, result);
                }
            }
            ScanScope::Subtree => {
                for child in self.tree.children(&root.path) {
                    self.scan_subtree(&child, traverse_deep, scope, pair, result);
                }
            }
        }
    }

    fn scan_subtree(
        &self,
        node: &ContentNode,
        traverse_deep: bool,
        scope: ScanScope,
        pair: Option<CopyPair<'_>>,
        result: &mut ReplicationSet,
    ) {
        self.scan_properties(node, traverse_deep, scope, pair, result);
        for child in self.tree.children(&node.path) {
            self.scan_subtree(&child, traverse_deep, scope, pair, result);
        }
    }

    fn scan_properties(
        &self,
        node: &ContentNode,
        traverse_deep: bool,
        scope: ScanScope,
        pair: Option<CopyPair<'_>>,
        result: &mut ReplicationSet,
    ) {
        for edge in self.edges_of(node) {
            let Some(referenced) = self.tree.node(&edge.target) else {
                continue;
            };
            if result.contains(&referenced.path) {
                debug!(path = %referenced.path, "Reference already listed");
                continue;
            }
            if let Some(pair) = pair {
                for parent in self.missing_parents(&referenced.path, pair) {
                    result.push(parent);
                }
            }
            trace!(path = %referenced.path, property = %edge.property, "Found reference");
            result.push(Arc::clone(&referenced));
            if traverse_deep {
                self.traverse(&referenced, traverse_deep, scope, pair, result);
            }
        }
    }

    /// Forward edges declared directly on one node.
    ///
    /// Each string value produces at most one edge: the first matching
    /// prefix decides, unresolvable values are dropped.
    pub fn edges_of(&self, node: &ContentNode) -> Vec<ReferenceEdge> {
        let mut edges = Vec::new();
        for (property, value) in &node.properties {
            for value in value.string_values() {
                if !self.settings.prefixes.iter().any(|p| value.starts_with(p.as_str())) {
                    continue;
                }
                trace!(node = %node.path, %property, %value, "Reference candidate");
                if let Some(target) = self.resolve(node, &value) {
                    edges.push(ReferenceEdge {
                        source: node.path.clone(),
                        property: property.clone(),
                        target,
                    });
                }
            }
        }
        edges
    }

    fn resolve(&self, owner: &ContentNode, value: &str) -> Option<NodePath> {
        let path = if value.starts_with(SEPARATOR) {
            NodePath::parse(value).ok()?
        } else {
            owner.path.join(value)?
        };
        self.tree.node(&path).map(|n| n.path.clone())
    }

    /// Ancestors of `path` strictly below the source root that are missing
    /// or outdated under the target root, outermost first.
    fn missing_parents(&self, path: &NodePath, pair: CopyPair<'_>) -> Vec<Arc<ContentNode>> {
        let mut missing: Vec<Arc<ContentNode>> = path
            .ancestors()
            .take_while(|a| a.starts_with(pair.source) && a != pair.source)
            .filter_map(|a| self.tree.node(&a))
            .filter(|source_node| self.is_missing_or_outdated(source_node, pair))
            .collect();
        missing.reverse();
        missing
    }

    fn is_missing_or_outdated(&self, source_node: &ContentNode, pair: CopyPair<'_>) -> bool {
        let Some(mirror) = source_node.path.rebase(pair.source, pair.target) else {
            return false;
        };
        match self.tree.node(&mirror) {
            None => true,
            Some(target_node) => match (target_node.last_modified, source_node.last_modified) {
                (Some(target_at), Some(source_at)) => target_at < source_at,
                _ => false,
            },
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reverse
    // ═══════════════════════════════════════════════════════════════════════

    /// Nodes under the configured roots that reference `target`.
    ///
    /// Every matched node appears once; the first match wins.
    pub fn reverse(&self, target: &NodePath) -> Vec<Reference> {
        let started = Instant::now();
        let needle = target.to_string();
        let mut seen = HashSet::new();
        let mut result = Vec::new();

        for root in &self.settings.roots {
            let Some(root_node) = self.tree.node(root) else {
                debug!(root = %root, "Reference root not found");
                continue;
            };
            for child in self.tree.children(&root_node.path) {
                self.scan_reverse(&child, &needle, &mut seen, &mut result);
            }
        }

        metrics::record_reference_scan("reverse", result.len(), started.elapsed());
        debug!(target = %target, found = result.len(), "Reverse references collected");
        result
    }

    fn scan_reverse(
        &self,
        node: &Arc<ContentNode>,
        needle: &str,
        seen: &mut HashSet<NodePath>,
        result: &mut Vec<Reference>,
    ) {
        for (property, value) in &node.properties {
            if !value.string_values().iter().any(|v| v == needle) {
                continue;
            }
            let matched = self.attribute(node);
            if seen.insert(matched.path.clone()) {
                trace!(matched = %matched.path, %property, "Found referencing node");
                result.push(Reference {
                    matched,
                    property: property.clone(),
                    referencing: node.path.clone(),
                });
            }
        }
        for child in self.tree.children(&node.path) {
            self.scan_reverse(&child, needle, seen, result);
        }
    }

    /// The node a match on `owner` is reported for: the parent of the
    /// closest enclosing metadata child, else `owner` itself.
    ///
    /// If that parent cannot be read, the match stays with `owner`.
    fn attribute(&self, owner: &Arc<ContentNode>) -> Arc<ContentNode> {
        let metadata = &self.settings.names.metadata_child;
        let segments = owner.path.segments();
        let Some(index) = segments.iter().rposition(|s| s == metadata) else {
            return Arc::clone(owner);
        };

        let mut page = NodePath::root();
        for segment in &segments[..index] {
            page = page.child(segment);
        }
        match self.tree.node(&page) {
            Some(found) => found,
            None => {
                warn!(path = %owner.path, parent = %page, "Metadata child parent not readable, keeping owner");
                Arc::clone(owner)
            }
        }
    }
}
