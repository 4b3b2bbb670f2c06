// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Asset export: primary representation plus renditions.
//!
//! ```text
//! /content/assets/logo.png          primary  GET  /content/assets/logo.png.
//! └── renditions
//!     ├── thumb.png   (nt:file)     existing POST /content/assets/logo.png.rendition.json/thumb.png
//!     └── web.png     (missing)     mandatory, rendered first, stored if it now exists
//! ```
//!
//! Every rendition name is attempted at most once per asset. All asset
//! artifacts are binary.

use crate::config::Settings;
use crate::content_tree::ContentTree;
use crate::error::Result;
use crate::export::{render, store, ExportOutcome, StoredArtifact};
use crate::node::{ContentNode, NodeKind};
use crate::registry::RenderMode;
use crate::target::{RenderRequest, Renderer, TargetStore};
use tracing::{debug, trace};

/// Selector of the rendition rendering endpoint.
pub const RENDITION_SELECTOR: &str = "rendition.json";

/// Label of the primary representation in an [`ExportOutcome`].
pub const PRIMARY: &str = "";

/// Replicates assets and their renditions.
pub struct RenditionResolver<'a, T: ?Sized, S: ?Sized, R: ?Sized> {
    tree: &'a T,
    target: &'a S,
    renderer: &'a R,
    settings: &'a Settings,
}

impl<'a, T, S, R> RenditionResolver<'a, T, S, R>
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

    /// Replicate the primary, then existing, then missing mandatory renditions.
    pub async fn replicate(&self, asset: &ContentNode) -> ExportOutcome {
        let mut outcome = ExportOutcome::new(asset.path.clone());

        outcome.attempted.push(PRIMARY.to_string());
        let request = RenderRequest::get(asset.path.clone(), PRIMARY);
        match self.render_and_store(asset, request, PRIMARY).await {
            Ok(artifact) => outcome.stored.push(artifact),
            Err(e) => outcome.record_failure(PRIMARY, &e),
        }

        let container = asset.path.child(&self.settings.names.renditions);
        for rendition in self.tree.children(&container) {
            if rendition.primary_type != self.settings.types.binary_file {
                trace!(path = %rendition.path, primary_type = %rendition.primary_type, "Not a rendition file");
                continue;
            }
            let name = rendition.name().to_string();
            if outcome.attempted.contains(&name) {
                continue;
            }
            outcome.attempted.push(name.clone());
            match self.render_and_store(asset, rendition_request(asset, &name), &name).await {
                Ok(artifact) => outcome.stored.push(artifact),
                Err(e) => outcome.record_failure(&name, &e),
            }
        }

        for name in &self.settings.mandatory_renditions {
            if outcome.attempted.contains(name) {
                continue;
            }
            outcome.attempted.push(name.clone());
            match self.create_mandatory(asset, name).await {
                Ok(Some(artifact)) => outcome.stored.push(artifact),
                Ok(None) => {
                    debug!(path = %asset.path, rendition = %name, "Mandatory rendition not created, skipping");
                }
                Err(e) => outcome.record_failure(name, &e),
            }
        }

        outcome
    }

    async fn render_and_store(
        &self,
        asset: &ContentNode,
        request: RenderRequest,
        extension: &str,
    ) -> Result<StoredArtifact> {
        let content = render(self.renderer, request, RenderMode::Raw).await?;
        let reference = store(self.target, &asset.path, extension, content, NodeKind::Asset.as_str()).await?;
        Ok(StoredArtifact {
            extension: extension.to_string(),
            reference,
        })
    }

    /// Rendering a missing rendition creates it in the content tree; it is
    /// only stored if it can be found afterwards.
    async fn create_mandatory(&self, asset: &ContentNode, name: &str) -> Result<Option<StoredArtifact>> {
        let content = render(self.renderer, rendition_request(asset, name), RenderMode::Raw).await?;
        let child = asset.path.child(&self.settings.names.renditions).child(name);
        if self.tree.node(&child).is_none() {
            return Ok(None);
        }
        let reference = store(self.target, &asset.path, name, content, NodeKind::Asset.as_str()).await?;
        Ok(Some(StoredArtifact {
            extension: name.to_string(),
            reference,
        }))
    }
}

fn rendition_request(asset: &ContentNode, name: &str) -> RenderRequest {
    RenderRequest::post(asset.path.clone(), format!("{}/{}", RENDITION_SELECTOR, name))
}
