// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Content node model.
//!
//! Nodes are identified by an absolute [`NodePath`]. A node never stores a
//! reference to its parent: the parent is derived by truncating the path, so
//! the content tree is a plain path-indexed map without back-reference
//! cycles.
//!
//! ```text
//! /                         (root, no segments)
//! └── content
//!     └── site
//!         ├── jcr:content   (metadata child)
//!         └── about
//! ```

use crate::config::TypeConfig;
use crate::error::{ReplicationError, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

// ═══════════════════════════════════════════════════════════════════════════════
// NodePath
// ═══════════════════════════════════════════════════════════════════════════════

/// Absolute path of a node, stored as its ordered segments.
///
/// The root has no segments and displays as `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// The tree root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse an absolute path such as `/content/site`.
    ///
    /// A single trailing separator is tolerated. Empty, `.` and `..`
    /// segments are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| ReplicationError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        let rest = raw
            .strip_prefix(SEPARATOR)
            .ok_or_else(|| invalid("must be absolute"))?;
        let rest = rest.strip_suffix(SEPARATOR).unwrap_or(rest);
        if rest.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in rest.split(SEPARATOR) {
            match segment {
                "" => return Err(invalid("empty segment")),
                "." | ".." => return Err(invalid("relative segment in absolute path")),
                s => segments.push(s.to_string()),
            }
        }
        Ok(Self { segments })
    }

    /// Whether this is the tree root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, empty for the root.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Ancestors from the direct parent up to and including the root.
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> + '_ {
        (0..self.segments.len()).rev().map(move |len| Self {
            segments: self.segments[..len].to_vec(),
        })
    }

    /// Path of a direct child.
    pub fn child(&self, name: &str) -> NodePath {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Resolve a relative path (`a/b`, `../c`) against this path.
    ///
    /// Returns `None` if the relative path is empty or climbs above the root.
    pub fn join(&self, relative: &str) -> Option<NodePath> {
        let mut segments = self.segments.clone();
        let mut any = false;
        for segment in relative.split(SEPARATOR) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop()?;
                }
                s => segments.push(s.to_string()),
            }
            any = true;
        }
        any.then_some(Self { segments })
    }

    /// Whether `self` equals `other` or lies below it.
    pub fn starts_with(&self, other: &NodePath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Whether any segment equals `name`.
    pub fn contains_segment(&self, name: &str) -> bool {
        self.segments.iter().any(|s| s == name)
    }

    /// Move this path from below `from` to below `to`.
    ///
    /// Returns `None` if `self` is not below `from`.
    pub fn rebase(&self, from: &NodePath, to: &NodePath) -> Option<NodePath> {
        let rest = self.segments.strip_prefix(from.segments.as_slice())?;
        let mut segments = to.segments.clone();
        segments.extend(rest.iter().cloned());
        Some(Self { segments })
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "{}", SEPARATOR);
        }
        for segment in &self.segments {
            write!(f, "{}{}", SEPARATOR, segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for NodePath {
    type Err = ReplicationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PropertyValue
// ═══════════════════════════════════════════════════════════════════════════════

/// A scalar or array property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Array(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Stringified values used for reference matching.
    ///
    /// Scalars yield one string; arrays yield one string per element.
    pub fn string_values(&self) -> Vec<String> {
        match self {
            PropertyValue::Array(items) => items.iter().flat_map(|v| v.string_values()).collect(),
            scalar => vec![scalar.to_string()],
        }
    }

    /// Borrow the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the value as a date, if it is one.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{}", s),
            PropertyValue::Long(v) => write!(f, "{}", v),
            PropertyValue::Double(v) => write!(f, "{}", v),
            PropertyValue::Boolean(v) => write!(f, "{}", v),
            PropertyValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            PropertyValue::Array(items) => {
                let joined: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", joined.join(", "))
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Long(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Boolean(v)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(d: DateTime<Utc>) -> Self {
        PropertyValue::Date(d)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(items: Vec<&str>) -> Self {
        PropertyValue::Array(items.into_iter().map(PropertyValue::from).collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ContentNode
// ═══════════════════════════════════════════════════════════════════════════════

/// A node of the content tree as seen by the replication engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode {
    /// Unique absolute path.
    pub path: NodePath,
    /// Primary type tag (e.g. `per:Page`, `per:Asset`, `nt:folder`).
    pub primary_type: String,
    /// Effective resource type, used as a fallback when matching export extensions.
    pub resource_type: Option<String>,
    /// Child names in document order.
    pub children: Vec<String>,
    /// Property name → value.
    pub properties: BTreeMap<String, PropertyValue>,
    /// Last modification of the node, if tracked.
    pub last_modified: Option<DateTime<Utc>>,
}

impl ContentNode {
    /// Create a node without children or properties.
    pub fn new(path: NodePath, primary_type: impl Into<String>) -> Self {
        Self {
            path,
            primary_type: primary_type.into(),
            resource_type: None,
            children: Vec::new(),
            properties: BTreeMap::new(),
            last_modified: None,
        }
    }

    /// Set a property (builder style).
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Set the resource type (builder style).
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Set the last-modified timestamp (builder style).
    pub fn modified_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    /// Node name (last path segment).
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Look up a property.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Whether a direct child with this name exists.
    pub fn has_child(&self, name: &str) -> bool {
        self.children.iter().any(|c| c == name)
    }

    /// Classify the node by its primary type.
    pub fn kind(&self, types: &TypeConfig) -> NodeKind {
        NodeKind::classify(&self.primary_type, types)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NodeKind
// ═══════════════════════════════════════════════════════════════════════════════

/// Closed classification of primary types, matched once at dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Binary asset with renditions.
    Asset,
    /// Node of the custom component namespace (pages, objects, templates).
    Component,
    /// Structural folder.
    Folder,
    /// Anything else.
    Other,
}

impl NodeKind {
    /// Classify a primary type. Asset wins over the component namespace,
    /// which wins over folder types.
    pub fn classify(primary_type: &str, types: &TypeConfig) -> Self {
        if primary_type == types.asset {
            NodeKind::Asset
        } else if !types.component_namespace.is_empty()
            && primary_type.starts_with(&types.component_namespace)
        {
            NodeKind::Component
        } else if types.folders.iter().any(|f| f == primary_type) {
            NodeKind::Folder
        } else {
            NodeKind::Other
        }
    }

    /// Metric/log label.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Asset => "asset",
            NodeKind::Component => "component",
            NodeKind::Folder => "folder",
            NodeKind::Other => "other",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
