// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for the content replication engine.
//!
//! Errors are categorized by their scope. Only configuration errors ever
//! leave the engine; everything else is scoped to a single artifact and is
//! logged, counted and skipped by the orchestrator.
//!
//! # Error Categories
//!
//! | Error Type | Item scoped | Description |
//! |------------|-------------|-------------|
//! | `Config` | No | Invalid extension, pattern or path in configuration |
//! | `RenderStatus` | Yes | Renderer answered with a non-success status |
//! | `Renderer` | Yes | Renderer could not be invoked at all |
//! | `Store` | Yes | Target store rejected a folder, artifact or removal |
//! | `Stamp` | Yes | Replication stamp could not be written |
//! | `Commit` | No | The end-of-batch content tree commit failed |
//! | `NotFound` | Yes | A node vanished between planning and replication |
//! | `InvalidPath` | No | A string could not be parsed as a node path |
//!
//! # Partial Failure
//!
//! Use [`ReplicationError::is_item_scoped()`] to tell failures that only
//! exclude one node from a batch result apart from failures that concern
//! the batch or the engine as a whole.

use crate::content_tree::TreeError;
use crate::target::TargetError;
use thiserror::Error;

/// Result type alias for replication operations.
pub type Result<T> = std::result::Result<T, ReplicationError>;

/// Errors that can occur while planning or replicating content.
#[derive(Error, Debug)]
pub enum ReplicationError {
    /// Invalid or missing configuration.
    ///
    /// Raised while validating a [`ReplicationConfig`](crate::ReplicationConfig),
    /// never in the middle of a batch.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The renderer answered with something other than `200`.
    #[error("Request '{request_path}' failed with status {status}")]
    RenderStatus { request_path: String, status: u16 },

    /// The renderer itself failed before producing a response.
    #[error("Renderer error ({request_path}): {message}")]
    Renderer {
        request_path: String,
        message: String,
        #[source]
        source: Option<TargetError>,
    },

    /// A target store operation failed.
    #[error("Target store error ({operation} {path}): {message}")]
    Store {
        operation: String,
        path: String,
        message: String,
        #[source]
        source: Option<TargetError>,
    },

    /// Writing the replication stamp onto a metadata child failed.
    #[error("Stamp error ({path}): {message}")]
    Stamp {
        path: String,
        message: String,
        #[source]
        source: Option<TreeError>,
    },

    /// The single end-of-batch commit failed.
    ///
    /// Target artifacts written before the commit are not rolled back.
    #[error("Commit failed: {0}")]
    Commit(#[from] TreeError),

    /// A node that was planned is no longer in the content tree.
    #[error("Node not found: {0}")]
    NotFound(String),

    /// A string could not be parsed as an absolute node path.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl ReplicationError {
    /// Create a store error from a target error.
    pub fn store(operation: impl Into<String>, path: impl ToString, source: TargetError) -> Self {
        Self::Store {
            operation: operation.into(),
            path: path.to_string(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a renderer error from a target error.
    pub fn renderer(request_path: impl Into<String>, source: TargetError) -> Self {
        Self::Renderer {
            request_path: request_path.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a stamp error from a content tree error.
    pub fn stamp(path: impl ToString, source: TreeError) -> Self {
        Self::Stamp {
            path: path.to_string(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Check if this error only affects a single node of a batch.
    pub fn is_item_scoped(&self) -> bool {
        match self {
            Self::RenderStatus { .. } => true,
            Self::Renderer { .. } => true,
            Self::Store { .. } => true,
            Self::Stamp { .. } => true,
            Self::NotFound(_) => true,
            Self::Config(_) => false,
            Self::Commit(_) => false, // concerns the whole batch
            Self::InvalidPath { .. } => false,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::RenderStatus { .. } => "render_status",
            Self::Renderer { .. } => "renderer",
            Self::Store { .. } => "store",
            Self::Stamp { .. } => "stamp",
            Self::Commit(_) => "commit",
            Self::NotFound(_) => "not_found",
            Self::InvalidPath { .. } => "invalid_path",
        }
    }
}
