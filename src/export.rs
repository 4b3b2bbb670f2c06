// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Generic export pipeline for non-asset nodes.
//!
//! Every registered extension that applies to a node is rendered, stored on
//! the target and stamped onto the node's metadata child. Extensions are
//! independent: a failing `html` render does not keep `data.json` from being
//! stored and stamped.

use crate::config::Settings;
use crate::content_tree::{ContentTree, ReplicationStamp};
use crate::error::{ReplicationError, Result};
use crate::metrics;
use crate::node::{ContentNode, NodePath};
use crate::registry::{ExportExtension, RenderMode};
use crate::target::{RenderRequest, RenderedContent, Renderer, TargetStore};
use tracing::{debug, trace, warn};

/// One artifact written to the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Extension (or rendition name) the artifact was stored with.
    pub extension: String,
    /// Reference path returned by the target store.
    pub reference: String,
}

/// Result of exporting one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub path: NodePath,
    /// Labels of every artifact attempted, in order. Empty label is the
    /// primary representation of an asset.
    pub attempted: Vec<String>,
    pub stored: Vec<StoredArtifact>,
    /// Labels of attempts that failed.
    pub failed: Vec<String>,
}

impl ExportOutcome {
    pub fn new(path: NodePath) -> Self {
        Self {
            path,
            attempted: Vec::new(),
            stored: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// A node counts as replicated only if nothing failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn record_failure(&mut self, label: &str, error: &ReplicationError) {
        warn!(path = %self.path, artifact = %label, error = %error, "Export failed, skipping");
        metrics::record_artifact_failure(label, error.kind());
        self.failed.push(label.to_string());
    }
}

/// Render one request and decode the body for the given mode.
///
/// A non-`200` status is an error for this request only.
pub(crate) async fn render<R: Renderer + ?Sized>(
    renderer: &R,
    request: RenderRequest,
    mode: RenderMode,
) -> Result<RenderedContent> {
    let request_path = request.request_path();
    trace!(request_path = %request_path, post = request.post, "Rendering");

    let response = renderer
        .render(request)
        .await
        .map_err(|e| ReplicationError::renderer(request_path.clone(), e))?;

    if !response.is_success() {
        return Err(ReplicationError::RenderStatus {
            request_path,
            status: response.status,
        });
    }

    Ok(match mode {
        RenderMode::Raw => RenderedContent::Raw(response.body),
        RenderMode::Text => RenderedContent::Text(response.text()),
    })
}

/// Store one artifact and return its reference path.
pub(crate) async fn store<S: TargetStore + ?Sized>(
    target: &S,
    path: &NodePath,
    extension: &str,
    content: RenderedContent,
    kind: &str,
) -> Result<String> {
    let bytes = content.len();
    let reference = target
        .store(path, extension, content)
        .await
        .map_err(|e| ReplicationError::store("store", path, e))?;
    metrics::record_artifact_stored(kind, extension, bytes);
    trace!(path = %path, extension = %extension, reference = %reference, bytes, "Artifact stored");
    Ok(reference)
}

/// Exports components and other non-asset nodes through the registry.
pub struct GenericExportPipeline<'a, T: ?Sized, S: ?Sized, R: ?Sized> {
    tree: &'a T,
    target: &'a S,
    renderer: &'a R,
    settings: &'a Settings,
}

impl<'a, T, S, R> GenericExportPipeline<'a, T, S, R>
where
    T: ContentTree + ?Sized,
    S: TargetStore + ?Sized,
    R: Renderer + ?Sized,
{
    pub fn new(tree: &'a T, target: &'a S, renderer: &'a R, settings: &'a Settings) -> Self {
        Self {
            tree,
            target,
            renderer,
            settings,
        }
    }

    /// Export every applicable extension of `node`, in registration order.
    pub async fn export(&self, node: &ContentNode) -> ExportOutcome {
        let kind = node.kind(&self.settings.types);
        let mut outcome = ExportOutcome::new(node.path.clone());

        for extension in self.settings.registry.applicable(node, kind) {
            outcome.attempted.push(extension.name().to_string());
            match self.export_one(node, extension, kind.as_str()).await {
                Ok(artifact) => outcome.stored.push(artifact),
                Err(e) => outcome.record_failure(extension.name(), &e),
            }
        }

        if outcome.attempted.is_empty() {
            debug!(path = %node.path, primary_type = %node.primary_type, "No export extension applies");
        }
        outcome
    }

    async fn export_one(
        &self,
        node: &ContentNode,
        extension: &ExportExtension,
        kind: &str,
    ) -> Result<StoredArtifact> {
        let ext = extension.request_extension();
        let request = RenderRequest::get(node.path.clone(), ext);
        let content = render(self.renderer, request, extension.mode()).await?;
        let reference = store(self.target, &node.path, ext, content, kind).await?;

        // Stamp only after the artifact is on the target
        let metadata = node.path.child(&self.settings.names.metadata_child);
        if self.tree.node(&metadata).is_some() {
            let stamp = ReplicationStamp::now(self.settings.actor.clone(), reference.clone());
            let stamped = self.tree.stamp(&metadata, &stamp);
            metrics::record_stamp(stamped.is_ok());
            stamped.map_err(|e| ReplicationError::stamp(&metadata, e))?;
        }

        Ok(StoredArtifact {
            extension: ext.to_string(),
            reference,
        })
    }
}
