// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Export extension registry.
//!
//! An export extension names one representation a node is exported as
//! (`html`, `data.json`, ...) and the primary or resource types it applies
//! to. The extension name also carries the render mode:
//!
//! | Name | Request extension | Mode |
//! |------|-------------------|------|
//! | `html` | `html` | text |
//! | `png~raw` | `png` | raw |
//! | `*` | *(empty)* | text |
//! | `*~raw` | *(empty)* | raw |

use crate::config::ExportExtensionConfig;
use crate::error::{ReplicationError, Result};
use crate::node::{ContentNode, NodeKind};

/// Suffix selecting binary output.
pub const RAW_MARKER: &str = "~raw";
/// Name standing for the empty extension.
pub const WILDCARD: &str = "*";

/// How the renderer output is handed to the target store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Bytes as produced.
    Raw,
    /// Decoded as text.
    Text,
}

/// One export extension. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportExtension {
    name: String,
    types: Vec<String>,
    export_folders: bool,
}

impl ExportExtension {
    /// Create an extension. Fails on an empty name or empty type list.
    pub fn new(name: impl Into<String>, types: Vec<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ReplicationError::Config(
                "Extension Name must be provided".to_string(),
            ));
        }
        let mut unique: Vec<String> = Vec::with_capacity(types.len());
        for t in types.into_iter().filter(|t| !t.is_empty()) {
            if !unique.contains(&t) {
                unique.push(t);
            }
        }
        if unique.is_empty() {
            return Err(ReplicationError::Config(format!(
                "Extension Types must be provided for '{}'",
                name
            )));
        }
        Ok(Self {
            name,
            types: unique,
            export_folders: false,
        })
    }

    /// Also export folder nodes (builder style).
    pub fn with_export_folders(mut self, export_folders: bool) -> Self {
        self.export_folders = export_folders;
        self
    }

    /// Configured name, including any mode marker.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applicable primary/resource types.
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// Whether folder nodes are exported with this extension.
    pub fn exports_folders(&self) -> bool {
        self.export_folders
    }

    /// Render mode derived from the name.
    pub fn mode(&self) -> RenderMode {
        if self.name.ends_with(RAW_MARKER) {
            RenderMode::Raw
        } else {
            RenderMode::Text
        }
    }

    /// Extension used for the render request and the stored artifact.
    pub fn request_extension(&self) -> &str {
        let stripped = self.name.strip_suffix(RAW_MARKER).unwrap_or(&self.name);
        if stripped == WILDCARD {
            ""
        } else {
            stripped
        }
    }

    /// Whether the primary type, then the resource type, is listed.
    pub fn supports(&self, primary_type: &str, resource_type: Option<&str>) -> bool {
        if self.types.iter().any(|t| t == primary_type) {
            return true;
        }
        resource_type.is_some_and(|rt| self.types.iter().any(|t| t == rt))
    }

    /// Whether this extension applies to a node of the given kind.
    pub fn applies_to(&self, node: &ContentNode, kind: NodeKind) -> bool {
        self.supports(&node.primary_type, node.resource_type.as_deref())
            || (self.export_folders && kind == NodeKind::Folder)
    }
}

/// Ordered, immutable list of export extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportExtensionRegistry {
    extensions: Vec<ExportExtension>,
}

impl ExportExtensionRegistry {
    /// Build a registry. A name may be registered more than once, each entry
    /// with its own type set.
    pub fn new(extensions: Vec<ExportExtension>) -> Self {
        Self { extensions }
    }

    /// Validate and build from configuration entries.
    pub fn from_config(entries: &[ExportExtensionConfig]) -> Result<Self> {
        let extensions = entries
            .iter()
            .map(|entry| {
                ExportExtension::new(entry.name.clone(), entry.types.clone())
                    .map(|ext| ext.with_export_folders(entry.export_folders))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(extensions))
    }

    /// Extensions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ExportExtension> {
        self.extensions.iter()
    }

    /// Extensions applicable to a node, in registration order.
    pub fn applicable<'a>(
        &'a self,
        node: &'a ContentNode,
        kind: NodeKind,
    ) -> impl Iterator<Item = &'a ExportExtension> + 'a {
        self.extensions.iter().filter(move |e| e.applies_to(node, kind))
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}
