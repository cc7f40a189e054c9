//! Policy document
//!
//! The on-disk TOML schema: one map per policy group (short asset name →
//! native type reference), path overrides, search paths, skip lists,
//! validation targets, extraction categories, data patches, and tunables.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::registry::PolicyError;

/// Extraction of named fields out of one struct-typed property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructExtraction {
    /// Property holding the struct, e.g. `ItemInformation`.
    pub property: String,
    /// Field names to pull out of it.
    pub fields: Vec<String>,
}

/// One extraction category: a directory of assets and the properties to
/// snapshot from each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionCategory {
    pub name: String,
    pub directory: String,
    #[serde(default)]
    pub recursive: bool,
    /// Properties read directly off the asset.
    #[serde(default)]
    pub properties: Vec<String>,
    /// Struct-typed properties whose fields are extracted individually.
    #[serde(default)]
    pub struct_properties: Vec<StructExtraction>,
}

/// A validation target: properties that must be readable off the asset's
/// default object after migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationTarget {
    pub asset: String,
    pub properties: Vec<String>,
}

/// An idempotent post-migration repair. Each kind checks whether its target
/// is already populated and does nothing when it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchSpec {
    /// Point an object-reference property at a fixed asset.
    SetObjectRef {
        asset: String,
        property: String,
        value: String,
    },
    /// Fill a property on every asset under a directory from the extraction
    /// cache.
    FillFromCache {
        directory: String,
        property: String,
        category: String,
        field: String,
    },
    /// Populate a map-of-montages property from a cached struct.
    MontageMap {
        asset: String,
        property: String,
        category: String,
        source_property: String,
    },
    /// Append a key entry to a mapping-context list property.
    AppendKey {
        asset: String,
        property: String,
        key: String,
    },
}

/// Flush-barrier tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushConfig {
    /// Wait after garbage collection when the host cannot drain its
    /// deferred-work queues deterministically.
    pub delay_ms: u64,
}

impl Default for FlushConfig {
    fn default() -> Self {
        // Empirically enough for the host to settle cascaded loads.
        Self { delay_ms: 2000 }
    }
}

/// The full policy document as persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Policy-group maps, keyed by group name (`regular`, `keep_vars`,
    /// `reparent_only`, `priority_state`, `anim_graph_safe`,
    /// `priority_character`, `npc_character`, `data_asset`, `interface`).
    /// Values map short asset names to native type references; the
    /// `anim_graph_safe` group accepts an empty string for clear-only
    /// entries with no native counterpart.
    #[serde(default)]
    pub maps: BTreeMap<String, BTreeMap<String, String>>,

    /// Assets the engine must never touch.
    #[serde(default)]
    pub skip: Vec<String>,

    /// Assets known to bring the host down during load.
    #[serde(default)]
    pub load_skip: Vec<String>,

    /// Assets known to bring the host down during reparent.
    #[serde(default)]
    pub reparent_skip: Vec<String>,

    /// Exact logical paths for assets that live off the search paths.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,

    /// Directories probed, in order, when no override exists.
    #[serde(default)]
    pub search_paths: Vec<String>,

    #[serde(default)]
    pub validation: Vec<ValidationTarget>,

    #[serde(default)]
    pub extraction: Vec<ExtractionCategory>,

    #[serde(default)]
    pub patches: Vec<PatchSpec>,

    #[serde(default)]
    pub flush: FlushConfig,

    /// Directory for the extraction cache, relative to the working dir.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

fn default_cache_dir() -> String {
    "cache".to_string()
}

impl PolicyDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| PolicyError::Read(path.display().to_string(), e))?;
        let doc: PolicyDocument = toml::from_str(&content)?;
        info!(
            "Loaded policy: {} groups, {} overrides, {} search paths ({})",
            doc.maps.len(),
            doc.overrides.len(),
            doc.search_paths.len(),
            path.display()
        );
        Ok(doc)
    }
}
