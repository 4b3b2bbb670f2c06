// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Target store and renderer integration traits.
//!
//! The engine writes to exactly one physical target per instance. Instead of
//! one engine type per target kind, the target is injected as a
//! [`TargetStore`] and the rendering engine as a [`Renderer`].
//!
//! # Example
//!
//! ```rust,no_run
//! use content_replication::node::NodePath;
//! use content_replication::target::{BoxFuture, RenderedContent, TargetStore};
//! use regex::Regex;
//!
//! struct MyBucket { /* ... */ }
//!
//! impl TargetStore for MyBucket {
//!     fn folder_exists(&self, _path: &NodePath) -> BoxFuture<'_, bool> {
//!         Box::pin(async move { Ok(true) })
//!     }
//!
//!     fn create_folder(&self, _path: &NodePath) -> BoxFuture<'_, ()> {
//!         Box::pin(async move { Ok(()) })
//!     }
//!
//!     fn store(&self, path: &NodePath, extension: &str, _content: RenderedContent) -> BoxFuture<'_, String> {
//!         let key = format!("{}.{}", path, extension);
//!         Box::pin(async move { Ok(key) })
//!     }
//!
//!     fn remove_replica(&self, _path: &NodePath, _patterns: &[Regex], _is_folder: bool) -> BoxFuture<'_, ()> {
//!         Box::pin(async move { Ok(()) })
//!     }
//! }
//! ```

use crate::node::NodePath;
use regex::Regex;
use std::future::Future;
use std::pin::Pin;

/// Result type for collaborator operations.
pub type TargetResult<T> = std::result::Result<T, TargetError>;

/// Type alias for boxed async futures (reduces trait signature complexity).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = TargetResult<T>> + Send + 'a>>;

/// HTTP-style status the renderer reports on success.
pub const STATUS_OK: u16 = 200;

/// Simplified error for target store and renderer operations.
#[derive(Debug, Clone)]
pub struct TargetError(pub String);

impl std::fmt::Display for TargetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TargetError {}

/// Rendered artifact handed to the target store.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedContent {
    /// Binary output (assets, renditions, `~raw` extensions).
    Raw(Vec<u8>),
    /// Text output (HTML, JSON).
    Text(String),
}

impl RenderedContent {
    /// Size in bytes.
    pub fn len(&self) -> usize {
        match self {
            RenderedContent::Raw(bytes) => bytes.len(),
            RenderedContent::Text(text) => text.len(),
        }
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A request to render one representation of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Path of the rendered resource.
    pub resource_path: NodePath,
    /// Request extension, possibly empty or carrying a suffix (`rendition.json/thumb`).
    pub extension: String,
    /// Whether the request is a POST.
    pub post: bool,
}

impl RenderRequest {
    /// Create a GET request.
    pub fn get(resource_path: NodePath, extension: impl Into<String>) -> Self {
        Self {
            resource_path,
            extension: extension.into(),
            post: false,
        }
    }

    /// Create a POST request.
    pub fn post(resource_path: NodePath, extension: impl Into<String>) -> Self {
        Self {
            post: true,
            ..Self::get(resource_path, extension)
        }
    }

    /// The request path: resource path, a `.` and the extension.
    ///
    /// The separator is kept even for an empty extension, so the primary
    /// representation of `/a/b.png` is requested as `/a/b.png.`.
    pub fn request_path(&self) -> String {
        format!("{}.{}", self.resource_path, self.extension)
    }
}

/// Response of the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResponse {
    /// HTTP-style status code, `200` on success.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl RenderResponse {
    /// Successful response with a body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: STATUS_OK,
            body: body.into(),
        }
    }

    /// Response with an arbitrary status.
    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status signals success.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Body decoded as text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The rendering engine that turns a resource into bytes.
pub trait Renderer: Send + Sync + 'static {
    /// Render one representation. Any status other than `200` is a failure
    /// of that single request.
    fn render(&self, request: RenderRequest) -> BoxFuture<'_, RenderResponse>;
}

/// The physical target receiving replicated artifacts.
pub trait TargetStore: Send + Sync + 'static {
    /// Whether the folder for this path exists on the target.
    fn folder_exists(&self, path: &NodePath) -> BoxFuture<'_, bool>;

    /// Create the folder for this path. Its parent exists already.
    fn create_folder(&self, path: &NodePath) -> BoxFuture<'_, ()>;

    /// Store an artifact and return the reference path it was stored under.
    ///
    /// `extension` has no leading dot and may be empty.
    fn store(&self, path: &NodePath, extension: &str, content: RenderedContent) -> BoxFuture<'_, String>;

    /// Remove the replica of a resource.
    ///
    /// With `patterns`, only artifacts whose name matches one of them are
    /// removed. With `is_folder`, everything below the path goes too.
    fn remove_replica(&self, path: &NodePath, patterns: &[Regex], is_folder: bool) -> BoxFuture<'_, ()>;
}

/// A no-op target for testing/standalone mode.
///
/// Logs operations but doesn't actually store anything.
#[derive(Clone, Default)]
pub struct NoOpTarget;

impl TargetStore for NoOpTarget {
    fn folder_exists(&self, path: &NodePath) -> BoxFuture<'_, bool> {
        let path = path.clone();
        Box::pin(async move {
            tracing::trace!(path = %path, "NoOp: folder_exists check (returning true)");
            Ok(true)
        })
    }

    fn create_folder(&self, path: &NodePath) -> BoxFuture<'_, ()> {
        let path = path.clone();
        Box::pin(async move {
            tracing::debug!(path = %path, "NoOp: would create folder");
            Ok(())
        })
    }

    fn store(&self, path: &NodePath, extension: &str, content: RenderedContent) -> BoxFuture<'_, String> {
        let reference = format!("{}.{}", path, extension);
        Box::pin(async move {
            tracing::debug!(
                reference = %reference,
                len = content.len(),
                "NoOp: would store artifact"
            );
            Ok(reference)
        })
    }

    fn remove_replica(&self, path: &NodePath, patterns: &[Regex], is_folder: bool) -> BoxFuture<'_, ()> {
        let path = path.clone();
        let pattern_count = patterns.len();
        Box::pin(async move {
            tracing::debug!(path = %path, pattern_count, is_folder, "NoOp: would remove replica");
            Ok(())
        })
    }
}

/// A renderer that answers every request with an empty `200`.
#[derive(Clone, Default)]
pub struct NoOpRenderer;

impl Renderer for NoOpRenderer {
    fn render(&self, request: RenderRequest) -> BoxFuture<'_, RenderResponse> {
        Box::pin(async move {
            tracing::trace!(request_path = %request.request_path(), "NoOp: render");
            Ok(RenderResponse::ok(Vec::new()))
        })
    }
}
