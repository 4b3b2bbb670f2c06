//! Recording TargetStore and scripted Renderer for testing.
//!
//! `RecordingTarget` records every call in order so tests can assert on
//! write ordering (folders before artifacts). Folder existence and failures
//! are configurable.
//!
//! `ScriptedRenderer` answers `200` by default; statuses and transport
//! errors can be scripted per request path or per extension. It can also
//! create rendition nodes in a content tree the way a rendition endpoint
//! would.

use content_replication::content_tree::{ContentTree, MemoryContentTree};
use content_replication::node::{ContentNode, NodePath};
use content_replication::target::{
    BoxFuture, RenderRequest, RenderResponse, RenderedContent, Renderer, TargetError, TargetStore,
};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

// =============================================================================
// RecordingTarget
// =============================================================================

/// One recorded target call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetCall {
    FolderExists(String),
    CreateFolder(String),
    Store { path: String, extension: String },
    RemoveReplica { path: String, patterns: Vec<String>, is_folder: bool },
}

/// Mock implementation of TargetStore that records all calls.
///
/// # Example
/// ```rust,ignore
/// let target = RecordingTarget::new().with_folders(&["/content"]);
///
/// // Use in tests...
///
/// // Assert what was called
/// assert!(target.created_folders().await.is_empty());
/// ```
pub struct RecordingTarget {
    /// Every call, in order
    calls: RwLock<Vec<TargetCall>>,
    /// Folders that exist on the target
    folders: RwLock<HashSet<String>>,
    /// Stored references (`path.ext`) that fail
    failing_stores: RwLock<HashSet<String>>,
    /// Fail every n-th store (0 = never)
    fail_every_nth_store: AtomicUsize,
    /// Counter for store calls
    store_count: AtomicUsize,
    /// Fail all folder creations
    fail_create_folder: AtomicBool,
    /// Fail all replica removals
    fail_remove: AtomicBool,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self {
            calls: RwLock::new(Vec::new()),
            folders: RwLock::new(HashSet::new()),
            failing_stores: RwLock::new(HashSet::new()),
            fail_every_nth_store: AtomicUsize::new(0),
            store_count: AtomicUsize::new(0),
            fail_create_folder: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        }
    }

    /// Pre-create folders on the target.
    pub fn with_folders(mut self, folders: &[&str]) -> Self {
        self.folders.get_mut().extend(folders.iter().map(|f| f.to_string()));
        self
    }

    /// Make the store of `reference` (`path.ext`) fail.
    pub async fn fail_store(&self, reference: &str) {
        self.failing_stores.write().await.insert(reference.to_string());
    }

    /// Fail every n-th store call.
    pub fn fail_every_nth_store(&self, n: usize) {
        self.fail_every_nth_store.store(n, Ordering::SeqCst);
    }

    pub fn fail_create_folder(&self, fail: bool) {
        self.fail_create_folder.store(fail, Ordering::SeqCst);
    }

    pub fn fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    /// Forget recorded calls (folders are kept).
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    /// All calls in order.
    pub async fn calls(&self) -> Vec<TargetCall> {
        self.calls.read().await.clone()
    }

    /// `(path, extension)` of every successful store, in order.
    pub async fn stores(&self) -> Vec<(String, String)> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                TargetCall::Store { path, extension } => Some((path.clone(), extension.clone())),
                _ => None,
            })
            .collect()
    }

    /// Folders created, in order.
    pub async fn created_folders(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                TargetCall::CreateFolder(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Removal calls, in order.
    pub async fn removals(&self) -> Vec<TargetCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, TargetCall::RemoveReplica { .. }))
            .cloned()
            .collect()
    }
}

impl Default for RecordingTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetStore for RecordingTarget {
    fn folder_exists(&self, path: &NodePath) -> BoxFuture<'_, bool> {
        let path = path.to_string();
        Box::pin(async move {
            self.calls.write().await.push(TargetCall::FolderExists(path.clone()));
            Ok(self.folders.read().await.contains(&path))
        })
    }

    fn create_folder(&self, path: &NodePath) -> BoxFuture<'_, ()> {
        let path = path.to_string();
        Box::pin(async move {
            if self.fail_create_folder.load(Ordering::SeqCst) {
                return Err(TargetError(format!("Cannot create folder {}", path)));
            }
            self.calls.write().await.push(TargetCall::CreateFolder(path.clone()));
            self.folders.write().await.insert(path);
            Ok(())
        })
    }

    fn store(&self, path: &NodePath, extension: &str, _content: RenderedContent) -> BoxFuture<'_, String> {
        let path = path.to_string();
        let extension = extension.to_string();
        Box::pin(async move {
            let reference = format!("{}.{}", path, extension);
            let count = self.store_count.fetch_add(1, Ordering::SeqCst) + 1;
            let nth = self.fail_every_nth_store.load(Ordering::SeqCst);
            if (nth > 0 && count % nth == 0) || self.failing_stores.read().await.contains(&reference) {
                return Err(TargetError(format!("Simulated store failure for {}", reference)));
            }
            self.calls.write().await.push(TargetCall::Store { path, extension });
            Ok(reference)
        })
    }

    fn remove_replica(&self, path: &NodePath, patterns: &[Regex], is_folder: bool) -> BoxFuture<'_, ()> {
        let path = path.to_string();
        let patterns: Vec<String> = patterns.iter().map(|p| p.as_str().to_string()).collect();
        Box::pin(async move {
            if self.fail_remove.load(Ordering::SeqCst) {
                return Err(TargetError(format!("Simulated removal failure for {}", path)));
            }
            self.calls.write().await.push(TargetCall::RemoveReplica {
                path,
                patterns,
                is_folder,
            });
            Ok(())
        })
    }
}

// =============================================================================
// ScriptedRenderer
// =============================================================================

/// Mock Renderer with scripted responses.
pub struct ScriptedRenderer {
    /// Every request, in order
    calls: RwLock<Vec<RenderRequest>>,
    /// Status by request path
    statuses: RwLock<HashMap<String, u16>>,
    /// Status by request extension
    extension_statuses: RwLock<HashMap<String, u16>>,
    /// Request paths that fail with a transport error
    broken: RwLock<HashSet<String>>,
    /// Fail every n-th request with a 500 (0 = never)
    fail_every_nth: AtomicUsize,
    /// Counter for render calls
    render_count: AtomicUsize,
    /// Tree in which rendition requests create the rendition node
    rendition_tree: Option<Arc<MemoryContentTree>>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self {
            calls: RwLock::new(Vec::new()),
            statuses: RwLock::new(HashMap::new()),
            extension_statuses: RwLock::new(HashMap::new()),
            broken: RwLock::new(HashSet::new()),
            fail_every_nth: AtomicUsize::new(0),
            render_count: AtomicUsize::new(0),
            rendition_tree: None,
        }
    }

    /// Create requested renditions under `<asset>/renditions` in `tree`.
    pub fn creating_renditions_in(mut self, tree: Arc<MemoryContentTree>) -> Self {
        self.rendition_tree = Some(tree);
        self
    }

    /// Answer `request_path` with `status`.
    pub async fn respond_with(&self, request_path: &str, status: u16) {
        self.statuses.write().await.insert(request_path.to_string(), status);
    }

    /// Answer every request for `extension` with `status`.
    pub async fn respond_to_extension(&self, extension: &str, status: u16) {
        self.extension_statuses
            .write()
            .await
            .insert(extension.to_string(), status);
    }

    /// Fail `request_path` before any response is produced.
    pub async fn break_request(&self, request_path: &str) {
        self.broken.write().await.insert(request_path.to_string());
    }

    /// Answer every n-th request with a 500.
    pub fn fail_every_nth(&self, n: usize) {
        self.fail_every_nth.store(n, Ordering::SeqCst);
    }

    /// All requests in order.
    pub async fn calls(&self) -> Vec<RenderRequest> {
        self.calls.read().await.clone()
    }

    /// Request paths in order.
    pub async fn request_paths(&self) -> Vec<String> {
        self.calls.read().await.iter().map(|r| r.request_path()).collect()
    }

    fn create_rendition(&self, request: &RenderRequest) {
        let Some(tree) = &self.rendition_tree else {
            return;
        };
        let Some(name) = request.extension.strip_prefix("rendition.json/") else {
            return;
        };
        let path = request.resource_path.child("renditions").child(name);
        if tree.node(&path).is_none() {
            tree.insert(ContentNode::new(path, "nt:file"));
        }
    }
}

impl Default for ScriptedRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for ScriptedRenderer {
    fn render(&self, request: RenderRequest) -> BoxFuture<'_, RenderResponse> {
        Box::pin(async move {
            let request_path = request.request_path();
            let count = self.render_count.fetch_add(1, Ordering::SeqCst) + 1;
            self.calls.write().await.push(request.clone());

            if self.broken.read().await.contains(&request_path) {
                return Err(TargetError(format!("Renderer unavailable for {}", request_path)));
            }

            let nth = self.fail_every_nth.load(Ordering::SeqCst);
            let status = if nth > 0 && count % nth == 0 {
                500
            } else if let Some(status) = self.statuses.read().await.get(&request_path) {
                *status
            } else if let Some(status) = self.extension_statuses.read().await.get(&request.extension) {
                *status
            } else {
                200
            };

            if status == 200 {
                self.create_rendition(&request);
            }
            Ok(RenderResponse::with_status(
                status,
                format!("rendered:{}", request_path).into_bytes(),
            ))
        })
    }
}
