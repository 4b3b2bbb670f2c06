// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Replication engine coordinator.
//!
//! The main orchestrator that ties together:
//! - Reference discovery via [`crate::references::ReferenceGraphBuilder`]
//! - Asset export via [`crate::rendition::RenditionResolver`]
//! - Generic export via [`crate::export::GenericExportPipeline`]
//! - The injected [`ContentTree`], [`TargetStore`] and [`Renderer`]
//!
//! # Architecture
//!
//! A batch runs on the caller's task and awaits one collaborator call at a
//! time:
//! 1. Resolves the forward reference closure of the start node
//! 2. Builds an ordered, path-unique plan
//! 3. Ensures target folders, then exports each node
//! 4. Commits replication stamps once
//!
//! Per-node failures never abort a batch. The returned set holds the nodes
//! that were fully replicated; callers diff it with what they asked for.

mod activation;
mod deactivation;
mod types;

pub use types::BatchState;

use crate::config::{ReplicationConfig, Settings};
use crate::content_tree::ContentTree;
use crate::error::Result;
use crate::export::ExportOutcome;
use crate::node::{ContentNode, NodePath};
use crate::references::{Reference, ReferenceGraphBuilder, ScanScope};
use crate::replication_set::ReplicationSet;
use crate::target::{NoOpRenderer, NoOpTarget, Renderer, TargetStore};
use activation::Batch;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// The replication engine for one target.
///
/// # Collaborators
///
/// The engine is handed the authored content tree, the target store it
/// writes to, and the renderer producing artifacts. It never writes to the
/// content tree except for replication stamps on metadata children.
///
/// # Configuration
///
/// Settings are validated up front and published through a watch channel.
/// [`reconfigure()`](Self::reconfigure) replaces them atomically; a running
/// batch keeps the snapshot it started with.
pub struct ReplicationEngine<T: ContentTree, S: TargetStore = NoOpTarget, R: Renderer = NoOpRenderer> {
    /// Authored content
    tree: Arc<T>,

    /// Replica store
    target: Arc<S>,

    /// Artifact renderer
    renderer: Arc<R>,

    /// Current validated settings
    settings_tx: watch::Sender<Arc<Settings>>,

    /// Batch state (broadcast to watchers)
    state_tx: watch::Sender<BatchState>,

    /// Batch state receiver (for internal use)
    state_rx: watch::Receiver<BatchState>,
}

impl<T: ContentTree> ReplicationEngine<T, NoOpTarget, NoOpRenderer> {
    /// Create an engine with no-op target and renderer (for testing/standalone).
    pub fn new(config: ReplicationConfig, tree: Arc<T>) -> Result<Self> {
        Self::with_collaborators(config, tree, Arc::new(NoOpTarget), Arc::new(NoOpRenderer))
    }
}

impl<T: ContentTree, S: TargetStore, R: Renderer> ReplicationEngine<T, S, R> {
    /// Create an engine with real collaborators.
    ///
    /// Fails with [`ReplicationError::Config`](crate::ReplicationError::Config)
    /// if the configuration does not validate.
    pub fn with_collaborators(
        config: ReplicationConfig,
        tree: Arc<T>,
        target: Arc<S>,
        renderer: Arc<R>,
    ) -> Result<Self> {
        let settings = config.validate()?;
        let (settings_tx, _) = watch::channel(Arc::new(settings));
        let (state_tx, state_rx) = watch::channel(BatchState::Idle);

        info!(
            actor = %config.actor,
            extensions = config.export.extensions.len(),
            "Replication engine created"
        );

        Ok(Self {
            tree,
            target,
            renderer,
            settings_tx,
            state_tx,
            state_rx,
        })
    }

    /// Get a reference to the content tree.
    pub fn tree(&self) -> &Arc<T> {
        &self.tree
    }

    /// Get a reference to the target store.
    pub fn target(&self) -> &Arc<S> {
        &self.target
    }

    /// Get a reference to the renderer.
    pub fn renderer(&self) -> &Arc<R> {
        &self.renderer
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Arc<Settings> {
        Arc::clone(&*self.settings_tx.borrow())
    }

    /// Validate and atomically replace the configuration.
    ///
    /// On error the previous settings stay in effect.
    pub fn reconfigure(&self, config: ReplicationConfig) -> Result<()> {
        let settings = config.validate()?;
        self.settings_tx.send_replace(Arc::new(settings));
        info!(actor = %config.actor, "Replication settings replaced");
        Ok(())
    }

    /// Get current batch state.
    pub fn state(&self) -> BatchState {
        *self.state_rx.borrow()
    }

    /// Get a receiver to watch state changes.
    pub fn state_receiver(&self) -> watch::Receiver<BatchState> {
        self.state_rx.clone()
    }

    fn batch<'a>(&'a self, settings: &'a Settings) -> Batch<'a, T, S, R> {
        Batch {
            tree: self.tree.as_ref(),
            target: self.target.as_ref(),
            renderer: self.renderer.as_ref(),
            settings,
            state: &self.state_tx,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // References
    // ═══════════════════════════════════════════════════════════════════════

    /// Forward references of `root`. Empty if `root` does not exist.
    pub fn forward_references(&self, root: &NodePath, traverse_deep: bool, scope: ScanScope) -> ReplicationSet {
        let settings = self.settings();
        match self.tree.node(root) {
            Some(node) => ReferenceGraphBuilder::new(self.tree.as_ref(), &settings).forward(&node, traverse_deep, scope),
            None => ReplicationSet::new(),
        }
    }

    /// Forward references of `root` for a local copy from `source` to `target`.
    pub fn forward_references_between(
        &self,
        root: &NodePath,
        traverse_deep: bool,
        scope: ScanScope,
        source: &NodePath,
        target: &NodePath,
    ) -> ReplicationSet {
        let settings = self.settings();
        match self.tree.node(root) {
            Some(node) => ReferenceGraphBuilder::new(self.tree.as_ref(), &settings)
                .forward_between(&node, traverse_deep, scope, source, target),
            None => ReplicationSet::new(),
        }
    }

    /// Nodes under the configured roots that reference `target`.
    pub fn reverse_references(&self, target: &NodePath) -> Vec<Reference> {
        let settings = self.settings();
        ReferenceGraphBuilder::new(self.tree.as_ref(), &settings).reverse(target)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Activation
    // ═══════════════════════════════════════════════════════════════════════

    /// Replicate `start`, everything it references, and its structural
    /// children (all descendants if `deep`).
    ///
    /// Returns the nodes that were fully replicated, in write order.
    #[instrument(skip(self, start), fields(start = %start))]
    pub async fn activate_tree(&self, start: &NodePath, deep: bool) -> ReplicationSet {
        let settings = self.settings();
        let batch = self.batch(&settings);

        let Some(start_node) = self.tree.node(start) else {
            warn!("Start node not found, nothing to replicate");
            return ReplicationSet::new();
        };

        batch.set_state(BatchState::ResolvingReferences);
        let closure =
            ReferenceGraphBuilder::new(self.tree.as_ref(), &settings).forward(&start_node, true, ScanScope::Subtree);

        batch.set_state(BatchState::BuildingSet);
        let plan = activation::build_plan(self.tree.as_ref(), &settings, &start_node, closure, deep);

        batch.run(plan).await
    }

    /// Replicate the given nodes in order.
    ///
    /// Duplicates are dropped (first position wins), metadata children are
    /// skipped. Returns the nodes that were fully replicated.
    #[instrument(skip_all)]
    pub async fn activate_set<I>(&self, nodes: I) -> ReplicationSet
    where
        I: IntoIterator<Item = Arc<ContentNode>>,
    {
        let settings = self.settings();
        let plan: ReplicationSet = nodes.into_iter().collect();
        self.batch(&settings).run(plan).await
    }

    /// Export one node without folder handling or commit.
    pub async fn replicate_resource(&self, node: &ContentNode) -> ExportOutcome {
        let settings = self.settings();
        self.batch(&settings).replicate_resource(node).await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Deactivation
    // ═══════════════════════════════════════════════════════════════════════

    /// Remove the replica of `path` from the target.
    ///
    /// Returns the source paths whose replicas were removed; empty if the
    /// node is missing, its type is not deactivatable, or removal failed.
    #[instrument(skip(self, path), fields(path = %path))]
    pub async fn deactivate_tree(&self, path: &NodePath) -> Vec<NodePath> {
        let settings = self.settings();
        let Some(node) = self.tree.node(path) else {
            warn!("Node not found, nothing to deactivate");
            return Vec::new();
        };
        deactivation::deactivate(self.tree.as_ref(), self.target.as_ref(), &settings, &node).await
    }
}
