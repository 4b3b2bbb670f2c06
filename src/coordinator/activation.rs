// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Activation: plan building and the replication loop.
//!
//! # Algorithm
//!
//! 1. Forward closure of the start node (deep, whole subtree)
//! 2. Drop closure entries with an excluded name (`jcr:content`, `renditions`)
//! 3. Add each remaining entry's direct structural children
//! 4. Add the start node and its structural children (recursively if deep)
//! 5. For each planned node: ensure target folders, export, collect success
//! 6. Commit the content tree once
//!
//! Failures in step 5 only drop the affected node from the result.

use super::types::BatchState;
use crate::config::Settings;
use crate::content_tree::ContentTree;
use crate::error::ReplicationError;
use crate::export::{ExportOutcome, GenericExportPipeline};
use crate::metrics;
use crate::node::{ContentNode, NodeKind, NodePath};
use crate::rendition::RenditionResolver;
use crate::replication_set::ReplicationSet;
use crate::target::{Renderer, TargetStore};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Turn a forward closure into the ordered activation plan.
pub(super) fn build_plan<T: ContentTree + ?Sized>(
    tree: &T,
    settings: &Settings,
    start: &Arc<ContentNode>,
    closure: ReplicationSet,
    deep: bool,
) -> ReplicationSet {
    let before = closure.len();
    let mut plan: ReplicationSet = closure
        .into_iter()
        .filter(|node| !settings.names.is_excluded(node.name()))
        .collect();
    metrics::record_plan_skipped("excluded_name", before - plan.len());

    let references: Vec<Arc<ContentNode>> = plan.iter().cloned().collect();
    for reference in &references {
        list_missing_resources(tree, settings, reference, &mut plan, false);
    }
    list_missing_resources(tree, settings, start, &mut plan, deep);

    debug!(start = %start.path, closure = before, planned = plan.len(), deep, "Activation plan built");
    plan
}

/// Add `node` and its structural children to `plan`, skipping excluded names.
fn list_missing_resources<T: ContentTree + ?Sized>(
    tree: &T,
    settings: &Settings,
    node: &Arc<ContentNode>,
    plan: &mut ReplicationSet,
    deep: bool,
) {
    if settings.names.is_excluded(node.name()) {
        return;
    }
    plan.push(Arc::clone(node));
    for child in tree.children(&node.path) {
        if settings.names.is_excluded(child.name()) {
            continue;
        }
        if deep {
            list_missing_resources(tree, settings, &child, plan, deep);
        } else {
            plan.push(child);
        }
    }
}

/// Borrowed collaborators of one batch.
pub(super) struct Batch<'a, T: ?Sized, S: ?Sized, R: ?Sized> {
    pub tree: &'a T,
    pub target: &'a S,
    pub renderer: &'a R,
    pub settings: &'a Settings,
    pub state: &'a watch::Sender<BatchState>,
}

impl<'a, T, S, R> Batch<'a, T, S, R>
where
    T: ContentTree + ?Sized,
    S: TargetStore + ?Sized,
    R: Renderer + ?Sized,
{
    pub fn set_state(&self, state: BatchState) {
        self.state.send_replace(state);
        metrics::set_batch_state(state.label());
    }

    /// Replicate every planned node in order, then commit once.
    pub async fn run(&self, mut plan: ReplicationSet) -> ReplicationSet {
        let started = Instant::now();
        let metadata = &self.settings.names.metadata_child;

        let before = plan.len();
        plan.retain(|node| !node.path.contains_segment(metadata));
        metrics::record_plan_skipped("metadata_child", before - plan.len());

        let total = plan.len();
        info!(total, "Replicating batch");

        let mut replicated = ReplicationSet::new();
        for (i, planned) in plan.iter().enumerate() {
            self.set_state(BatchState::Replicating { index: i + 1, total });

            let node = match self.prepare(planned).await {
                Ok(node) => node,
                Err(e) => {
                    skip(&planned.path, &e);
                    continue;
                }
            };

            let outcome = self.replicate_resource(&node).await;
            if outcome.is_success() {
                replicated.push(node);
            } else {
                debug!(path = %node.path, failed = ?outcome.failed, "Node left out of batch result");
            }
        }

        self.set_state(BatchState::Committing);
        self.commit();
        self.set_state(BatchState::Done);

        metrics::record_batch("activate", total, replicated.len(), started.elapsed());
        info!(
            planned = total,
            replicated = replicated.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Batch complete"
        );
        replicated
    }

    /// Dispatch one node to the asset or the generic pipeline.
    pub async fn replicate_resource(&self, node: &ContentNode) -> ExportOutcome {
        let kind = node.kind(&self.settings.types);
        debug!(path = %node.path, %kind, "Replicating resource");
        match kind {
            NodeKind::Asset => {
                RenditionResolver::new(self.tree, self.target, self.renderer, self.settings)
                    .replicate(node)
                    .await
            }
            _ => {
                GenericExportPipeline::new(self.tree, self.target, self.renderer, self.settings)
                    .export(node)
                    .await
            }
        }
    }

    /// Re-read a planned node and make sure its target folders exist.
    ///
    /// The plan holds snapshots; a node removed since planning is skipped.
    async fn prepare(&self, planned: &ContentNode) -> crate::error::Result<Arc<ContentNode>> {
        let node = self
            .tree
            .node(&planned.path)
            .ok_or_else(|| ReplicationError::NotFound(planned.path.to_string()))?;
        if let Some(parent) = node.path.parent() {
            self.ensure_folders(&parent).await?;
        }
        Ok(node)
    }

    /// Make sure `folder` and its ancestors exist on the target.
    ///
    /// Walks up until an existing folder is found, then creates the missing
    /// ones top-down. The root is never checked.
    async fn ensure_folders(&self, folder: &NodePath) -> crate::error::Result<()> {
        let mut missing = Vec::new();
        let candidates = std::iter::once(folder.clone()).chain(folder.ancestors());
        for path in candidates.filter(|p| !p.is_root()) {
            let exists = self
                .target
                .folder_exists(&path)
                .await
                .map_err(|e| ReplicationError::store("folder_exists", &path, e))?;
            if exists {
                break;
            }
            missing.push(path);
        }

        for path in missing.into_iter().rev() {
            self.target
                .create_folder(&path)
                .await
                .map_err(|e| ReplicationError::store("create_folder", &path, e))?;
            metrics::record_folder_created();
            debug!(path = %path, "Created target folder");
        }
        Ok(())
    }

    fn commit(&self) {
        let started = Instant::now();
        match self.tree.commit() {
            Ok(()) => metrics::record_commit(true, started.elapsed()),
            Err(e) => {
                metrics::record_commit(false, started.elapsed());
                let err = ReplicationError::from(e);
                // Target writes of this batch stay in place
                error!(error = %err, "Failed to commit replication stamps");
            }
        }
    }
}

fn skip(path: &NodePath, err: &ReplicationError) {
    if err.is_item_scoped() {
        warn!(path = %path, error = %err, "Node skipped");
    } else {
        error!(path = %path, error = %err, "Node skipped");
    }
    metrics::record_plan_skipped(err.kind(), 1);
}
