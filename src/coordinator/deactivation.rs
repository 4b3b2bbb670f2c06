// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Deactivation: removing replicas from the target.
//!
//! | Kind | Patterns | Recursive | Reported |
//! |------|----------|-----------|----------|
//! | Asset | none (all renditions) | no | the node |
//! | Component | configured name patterns | no | the node |
//! | Folder | none | yes | the node and all descendants |
//! | Other | - | - | nothing, no store calls |

use crate::config::Settings;
use crate::content_tree::ContentTree;
use crate::error::ReplicationError;
use crate::metrics;
use crate::node::{ContentNode, NodeKind, NodePath};
use crate::target::TargetStore;
use regex::Regex;
use tracing::{debug, info, warn};

/// Remove the replica of `node` and report the removed source paths.
///
/// A failing removal is logged and reported as an empty list.
pub(super) async fn deactivate<T, S>(tree: &T, target: &S, settings: &Settings, node: &ContentNode) -> Vec<NodePath>
where
    T: ContentTree + ?Sized,
    S: TargetStore + ?Sized,
{
    let kind = node.kind(&settings.types);
    let (patterns, is_folder): (&[Regex], bool) = match kind {
        NodeKind::Asset => (&[][..], false),
        NodeKind::Component => (settings.name_patterns.as_slice(), false),
        NodeKind::Folder => (&[][..], true),
        NodeKind::Other => {
            debug!(path = %node.path, primary_type = %node.primary_type, "Type not deactivatable");
            metrics::record_deactivation(kind.as_str(), 0, true);
            return Vec::new();
        }
    };

    if let Err(e) = target.remove_replica(&node.path, patterns, is_folder).await {
        let err = ReplicationError::store("remove_replica", &node.path, e);
        warn!(path = %node.path, %kind, error = %err, "Deactivation failed");
        metrics::record_deactivation(kind.as_str(), 0, false);
        return Vec::new();
    }

    let removed = if is_folder {
        let mut removed = Vec::new();
        collect_subtree(tree, &node.path, &mut removed);
        removed
    } else {
        vec![node.path.clone()]
    };

    metrics::record_deactivation(kind.as_str(), removed.len(), true);
    info!(path = %node.path, %kind, removed = removed.len(), "Deactivated");
    removed
}

fn collect_subtree<T: ContentTree + ?Sized>(tree: &T, path: &NodePath, out: &mut Vec<NodePath>) {
    out.push(path.clone());
    for child in tree.children(path) {
        collect_subtree(tree, &child.path, out);
    }
}
