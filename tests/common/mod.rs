//! Shared test utilities for integration, property and chaos tests.
//!
//! This module provides:
//! - Recording TargetStore and scripted Renderer
//! - Content tree fixtures

#![allow(dead_code)]

pub mod mock_target;

pub use mock_target::*;

use content_replication::{
    ContentNode, MemoryContentTree, NodePath, ReplicationConfig, ReplicationEngine,
};
use std::sync::Arc;

/// Parse a path, panicking on invalid input.
pub fn path(s: &str) -> NodePath {
    NodePath::parse(s).expect("valid test path")
}

/// Paths of a node list as strings.
pub fn strings<'a>(paths: impl IntoIterator<Item = &'a NodePath>) -> Vec<String> {
    paths.into_iter().map(|p| p.to_string()).collect()
}

/// Engine wired to recording collaborators.
pub type TestEngine = ReplicationEngine<MemoryContentTree, RecordingTarget, ScriptedRenderer>;

/// Build an engine over `tree` with fresh recording collaborators.
pub fn engine(tree: Arc<MemoryContentTree>, config: ReplicationConfig) -> TestEngine {
    engine_with(tree, config, RecordingTarget::new(), ScriptedRenderer::new())
}

/// Build an engine with the given collaborators.
pub fn engine_with(
    tree: Arc<MemoryContentTree>,
    config: ReplicationConfig,
    target: RecordingTarget,
    renderer: ScriptedRenderer,
) -> TestEngine {
    ReplicationEngine::with_collaborators(config, tree, Arc::new(target), Arc::new(renderer))
        .expect("valid test config")
}

/// A small site:
///
/// ```text
/// /content/site            per:Page
///   jcr:content            per:PageContent  logo -> /content/assets/logo.png
///     hero                 nt:unstructured  link -> /content/site/news
///   about                  per:Page
///     jcr:content          per:PageContent
///     team                 per:Page
/// /content/site/news       per:Page
/// /content/assets          sling:Folder
///   logo.png               per:Asset
///     renditions
///       thumb.png          nt:file
/// ```
pub fn site_tree() -> Arc<MemoryContentTree> {
    let tree = Arc::new(MemoryContentTree::new());
    tree.insert(ContentNode::new(path("/content/assets"), "sling:Folder"));
    tree.insert(ContentNode::new(path("/content/assets/logo.png"), "per:Asset"));
    tree.insert(ContentNode::new(
        path("/content/assets/logo.png/renditions/thumb.png"),
        "nt:file",
    ));
    tree.insert(ContentNode::new(path("/content/site"), "per:Page"));
    tree.insert(
        ContentNode::new(path("/content/site/jcr:content"), "per:PageContent")
            .with_property("logo", "/content/assets/logo.png"),
    );
    tree.insert(
        ContentNode::new(path("/content/site/jcr:content/hero"), "nt:unstructured")
            .with_property("link", "/content/site/news"),
    );
    tree.insert(ContentNode::new(path("/content/site/about"), "per:Page"));
    tree.insert(ContentNode::new(path("/content/site/about/jcr:content"), "per:PageContent"));
    tree.insert(ContentNode::new(path("/content/site/about/team"), "per:Page"));
    tree.insert(ContentNode::new(path("/content/site/news"), "per:Page"));
    tree
}
