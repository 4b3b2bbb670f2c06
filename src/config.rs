// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the replication engine.
//!
//! [`ReplicationConfig`] is the serializable form, supplied by the host
//! application. [`ReplicationConfig::validate()`] turns it into immutable
//! [`Settings`]: every export extension and name pattern is checked and
//! compiled before any replication begins.
//!
//! # Quick Start
//!
//! ```rust
//! use content_replication::config::{ExportExtensionConfig, ReplicationConfig};
//!
//! let mut config = ReplicationConfig::default();
//! config.export.extensions = vec![
//!     ExportExtensionConfig::new("html", &["per:Page"]),
//!     ExportExtensionConfig::new("data.json", &["per:Page", "per:Object"]),
//! ];
//! config.export.mandatory_renditions = vec!["thumbnail.png".into()];
//!
//! let settings = config.validate().expect("valid config");
//! assert_eq!(settings.registry.len(), 2);
//! ```
//!
//! # Configuration Structure
//!
//! ```text
//! ReplicationConfig
//! ├── actor: String                  # Recorded in replication stamps
//! ├── references: ReferenceConfig    # Forward prefixes, reverse roots
//! ├── export: ExportConfig           # Extensions, mandatory renditions
//! ├── names: NamingConfig            # Metadata child, renditions, exclusions
//! ├── types: TypeConfig              # Primary type classification
//! └── deactivation: DeactivationConfig # Component artifact name patterns
//! ```
//!
//! # JSON Example
//!
//! ```json
//! {
//!   "actor": "publisher",
//!   "references": { "prefixes": ["/content/"], "roots": ["/content"] },
//!   "export": {
//!     "extensions": [
//!       { "name": "html", "types": ["per:Page"] },
//!       { "name": "*~raw", "types": ["nt:file"] }
//!     ],
//!     "mandatory_renditions": ["thumbnail.png"]
//!   }
//! }
//! ```

use crate::error::{ReplicationError, Result};
use crate::node::NodePath;
use crate::registry::ExportExtensionRegistry;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// Top-level config
// ═══════════════════════════════════════════════════════════════════════════════

/// The top-level config object passed to `ReplicationEngine::new()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Actor recorded in replication stamps.
    #[serde(default = "default_actor")]
    pub actor: String,

    /// Where references are looked for.
    #[serde(default)]
    pub references: ReferenceConfig,

    /// Which representations are exported.
    #[serde(default)]
    pub export: ExportConfig,

    /// Reserved node names.
    #[serde(default)]
    pub names: NamingConfig,

    /// Primary type classification.
    #[serde(default)]
    pub types: TypeConfig,

    /// Deactivation behaviour.
    #[serde(default)]
    pub deactivation: DeactivationConfig,
}

fn default_actor() -> String {
    "replication-service".to_string()
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            actor: default_actor(),
            references: ReferenceConfig::default(),
            export: ExportConfig::default(),
            names: NamingConfig::default(),
            types: TypeConfig::default(),
            deactivation: DeactivationConfig::default(),
        }
    }
}

impl ReplicationConfig {
    /// Create a config for testing: `html` and `data.json` for pages.
    pub fn for_testing() -> Self {
        Self {
            actor: "test-actor".to_string(),
            export: ExportConfig {
                extensions: vec![
                    ExportExtensionConfig::new("html", &["per:Page"]),
                    ExportExtensionConfig::new("data.json", &["per:Page"]),
                ],
                mandatory_renditions: Vec::new(),
            },
            ..Default::default()
        }
    }

    /// Parse a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ReplicationError::Config(e.to_string()))
    }

    /// Validate and compile into immutable [`Settings`].
    ///
    /// Empty prefixes and roots are dropped; everything else that is
    /// malformed fails the whole config.
    pub fn validate(&self) -> Result<Settings> {
        let prefixes: Vec<String> = self
            .references
            .prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect();

        let roots = self
            .references
            .roots
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| {
                NodePath::parse(r).map_err(|e| {
                    ReplicationError::Config(format!("Invalid reference root: {}", e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if self.names.metadata_child.is_empty() {
            return Err(ReplicationError::Config(
                "Metadata child name must be provided".to_string(),
            ));
        }
        if self.names.renditions.is_empty() {
            return Err(ReplicationError::Config(
                "Renditions container name must be provided".to_string(),
            ));
        }

        let name_patterns = self
            .deactivation
            .name_patterns
            .iter()
            .map(|p| {
                // Anchored like a full-string match
                Regex::new(&format!("^(?:{})$", p)).map_err(|e| {
                    ReplicationError::Config(format!("Invalid name pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let registry = ExportExtensionRegistry::from_config(&self.export.extensions)?;

        let mut mandatory_renditions: Vec<String> = Vec::new();
        for name in &self.export.mandatory_renditions {
            if !name.is_empty() && !mandatory_renditions.contains(name) {
                mandatory_renditions.push(name.clone());
            }
        }

        Ok(Settings {
            actor: self.actor.clone(),
            prefixes,
            roots,
            registry,
            mandatory_renditions,
            names: self.names.clone(),
            types: self.types.clone(),
            name_patterns,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ReferenceConfig
// ═══════════════════════════════════════════════════════════════════════════════

/// Reference discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// A property value starting with one of these is a reference candidate.
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,

    /// Roots scanned for reverse references.
    #[serde(default = "default_roots")]
    pub roots: Vec<String>,
}

fn default_prefixes() -> Vec<String> {
    vec!["/content/".to_string()]
}

fn default_roots() -> Vec<String> {
    vec!["/content".to_string()]
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            roots: default_roots(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ExportConfig
// ═══════════════════════════════════════════════════════════════════════════════

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportConfig {
    /// Export extensions in processing order.
    #[serde(default)]
    pub extensions: Vec<ExportExtensionConfig>,

    /// Renditions produced for every asset even if they do not exist yet.
    #[serde(default)]
    pub mandatory_renditions: Vec<String>,
}

/// One export extension entry.
///
/// A `~raw` suffix on the name selects binary output; `*` stands for the
/// empty extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportExtensionConfig {
    pub name: String,
    pub types: Vec<String>,
    /// Also export folder nodes with this extension.
    #[serde(default)]
    pub export_folders: bool,
}

impl ExportExtensionConfig {
    /// Create an entry without folder export.
    pub fn new(name: &str, types: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
            export_folders: false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NamingConfig / TypeConfig / DeactivationConfig
// ═══════════════════════════════════════════════════════════════════════════════

/// Reserved node names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Child holding a resource's content and replication stamp.
    #[serde(default = "default_metadata_child")]
    pub metadata_child: String,

    /// Child of an asset holding its renditions.
    #[serde(default = "default_renditions")]
    pub renditions: String,

    /// Names never replicated as top-level entries.
    #[serde(default = "default_excluded")]
    pub excluded: Vec<String>,
}

fn default_metadata_child() -> String {
    "jcr:content".to_string()
}

fn default_renditions() -> String {
    "renditions".to_string()
}

fn default_excluded() -> Vec<String> {
    vec![default_metadata_child(), default_renditions()]
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            metadata_child: default_metadata_child(),
            renditions: default_renditions(),
            excluded: default_excluded(),
        }
    }
}

impl NamingConfig {
    /// Whether a node with this name is excluded from replication lists.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.iter().any(|e| e == name)
    }
}

/// Primary type names used for classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeConfig {
    /// Primary type of assets.
    #[serde(default = "default_asset_type")]
    pub asset: String,

    /// Prefix of the custom component namespace.
    #[serde(default = "default_component_namespace")]
    pub component_namespace: String,

    /// Folder-like primary types.
    #[serde(default = "default_folder_types")]
    pub folders: Vec<String>,

    /// Primary type of binary rendition files.
    #[serde(default = "default_binary_file_type")]
    pub binary_file: String,
}

fn default_asset_type() -> String {
    "per:Asset".to_string()
}

fn default_component_namespace() -> String {
    "per:".to_string()
}

fn default_folder_types() -> Vec<String> {
    vec![
        "nt:folder".to_string(),
        "sling:Folder".to_string(),
        "sling:OrderedFolder".to_string(),
    ]
}

fn default_binary_file_type() -> String {
    "nt:file".to_string()
}

impl Default for TypeConfig {
    fn default() -> Self {
        Self {
            asset: default_asset_type(),
            component_namespace: default_component_namespace(),
            folders: default_folder_types(),
            binary_file: default_binary_file_type(),
        }
    }
}

/// Deactivation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeactivationConfig {
    /// Artifact name patterns removed when deactivating a component node.
    #[serde(default = "default_name_patterns")]
    pub name_patterns: Vec<String>,
}

fn default_name_patterns() -> Vec<String> {
    vec![r".*\.data\.json".to_string()]
}

impl Default for DeactivationConfig {
    fn default() -> Self {
        Self {
            name_patterns: default_name_patterns(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Settings: validated, immutable snapshot
// ═══════════════════════════════════════════════════════════════════════════════

/// Validated configuration. Read-only for the duration of a batch.
#[derive(Debug, Clone)]
pub struct Settings {
    pub actor: String,
    pub prefixes: Vec<String>,
    pub roots: Vec<NodePath>,
    pub registry: ExportExtensionRegistry,
    pub mandatory_renditions: Vec<String>,
    pub names: NamingConfig,
    pub types: TypeConfig,
    pub name_patterns: Vec<Regex>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
