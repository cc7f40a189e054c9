//! Content snapshots
//!
//! A serde-able description of a content tree: assets, the host type table,
//! and the redirect tables active at load time. `MemoryHost` is constructed
//! from a snapshot and can be written back out after a run.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::asset::AssetRecord;

/// Error type for snapshot IO.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A native type known to the host, with the interfaces it declares and the
/// reflected properties its default object exposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeTypeDecl {
    pub name: String,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub properties: Vec<String>,
}

/// Serialized form of a host content tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSnapshot {
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
    /// Resolvable native types, keyed by full `<module>.<name>` reference.
    #[serde(default)]
    pub native_types: Vec<NativeTypeDecl>,
    /// Load-time struct/enum redirects: old logical type path → native ref.
    #[serde(default)]
    pub type_redirects: BTreeMap<String, String>,
    /// Load-time member renames: `Struct.OldMember` → new member name.
    #[serde(default)]
    pub property_redirects: BTreeMap<String, String>,
}

impl ContentSnapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let snapshot: ContentSnapshot = serde_json::from_str(&content)?;
        info!(
            "Loaded content snapshot: {} assets, {} native types ({})",
            snapshot.assets.len(),
            snapshot.native_types.len(),
            path.display()
        );
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassRef;
    use tempfile::TempDir;

    #[test]
    fn round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("content.json");

        let mut asset = AssetRecord::new("/Game/B_Thing");
        asset.parent_class = Some(ClassRef::generated("Actor_C"));
        let snapshot = ContentSnapshot {
            assets: vec![asset],
            native_types: vec![NativeTypeDecl { name: "/Script/SLF.Thing".into(), ..Default::default() }],
            ..Default::default()
        };

        snapshot.save(&file).unwrap();
        let loaded = ContentSnapshot::load(&file).unwrap();
        assert_eq!(loaded.assets, snapshot.assets);
        assert_eq!(loaded.native_types, snapshot.native_types);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ContentSnapshot::load("/nonexistent/content.json").unwrap_err();
        assert!(matches!(err, SnapshotError::Read(_)));
    }
}
