//! # Content Replication
//!
//! Publishes a bounded part of an authored content tree to an external
//! target (a static file tree, a bucket), keeping the replica in sync with
//! the source and preserving cross-resource references.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │                          ReplicationEngine                                │
//! │                                                                           │
//! │  ┌───────────────────────┐   ┌──────────────┐   ┌──────────────────────┐  │
//! │  │ ReferenceGraphBuilder │──►│ Plan (dedup, │──►│ per-node dispatch    │  │
//! │  │ (forward closure)     │   │ ordering)    │   │ Asset │ Generic      │  │
//! │  └───────────────────────┘   └──────────────┘   └──────────────────────┘  │
//! │              │                                      │           │         │
//! │              ▼                                      ▼           ▼         │
//! │  ┌───────────────────────┐              ┌────────────────┐ ┌───────────┐  │
//! │  │ ContentTree           │◄─ stamps ────│ Renderer       │ │TargetStore│  │
//! │  │ (read, stamp, commit) │              └────────────────┘ └───────────┘  │
//! │  └───────────────────────┘                                                │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Partial Failure
//!
//! A batch never fails as a whole. Activation returns the set of nodes that
//! were fully replicated; anything missing from it failed and was logged.
//! The content tree is committed once at the end of each batch.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use content_replication::{ContentNode, MemoryContentTree, NodePath, ReplicationConfig, ReplicationEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let tree = Arc::new(MemoryContentTree::new());
//!     let home = NodePath::parse("/content/site/home").expect("valid path");
//!     tree.insert(ContentNode::new(home.clone(), "per:Page"));
//!
//!     let engine = ReplicationEngine::new(ReplicationConfig::default(), tree).expect("valid config");
//!     let replicated = engine.activate_tree(&home, true).await;
//!     println!("replicated {} nodes", replicated.len());
//! }
//! ```

pub mod config;
pub mod content_tree;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod metrics;
pub mod node;
pub mod references;
pub mod registry;
pub mod rendition;
pub mod replication_set;
pub mod target;

// Re-exports for convenience
pub use config::{ExportExtensionConfig, ReplicationConfig, Settings};
pub use content_tree::{ContentTree, MemoryContentTree, ReplicationStamp, TreeError};
pub use coordinator::{BatchState, ReplicationEngine};
pub use error::{ReplicationError, Result};
pub use export::{ExportOutcome, StoredArtifact};
pub use node::{ContentNode, NodeKind, NodePath, PropertyValue};
pub use references::{Reference, ReferenceEdge, ScanScope};
pub use registry::{ExportExtension, ExportExtensionRegistry, RenderMode};
pub use replication_set::ReplicationSet;
pub use target::{
    NoOpRenderer, NoOpTarget, RenderRequest, RenderResponse, RenderedContent, Renderer, TargetError,
    TargetStore,
};
