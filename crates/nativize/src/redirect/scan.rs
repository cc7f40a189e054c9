//! Affected-asset scan
//!
//! The project keeps an exported JSON document per asset (its "DNA") listing
//! every object path the asset references. Scanning those files for the
//! legacy type paths yields the set of assets the redirect will touch,
//! without loading anything into the host.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use editor_host::AssetPath;
use serde_json::Value;
use tracing::{debug, warn};

/// Walk `dna_dir` for JSON files mentioning any of `needles`; each hit's
/// top-level `Path` field names the affected asset.
pub fn scan_affected(dna_dir: &Path, needles: &[String]) -> io::Result<Vec<AssetPath>> {
    let mut affected = BTreeSet::new();
    scan_dir(dna_dir, needles, &mut affected)?;
    Ok(affected.into_iter().collect())
}

fn scan_dir(dir: &Path, needles: &[String], affected: &mut BTreeSet<AssetPath>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            scan_dir(&path, needles, affected)?;
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("skipping unreadable {}: {}", path.display(), e);
                continue;
            }
        };
        if !needles.iter().any(|n| content.contains(n.as_str())) {
            continue;
        }
        let doc: Value = match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("skipping unparseable {}: {}", path.display(), e);
                continue;
            }
        };
        if let Some(asset) = doc.get("Path").and_then(Value::as_str) {
            debug!("affected: {} ({})", asset, path.display());
            affected.insert(AssetPath::new(asset).package());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn finds_assets_referencing_a_legacy_path() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("B_Stat.json"),
            r#"{"Path":"/Game/Blueprints/B_Stat","Refs":["/Game/Structs/FStatInfo"]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("B_Other.json"),
            r#"{"Path":"/Game/Blueprints/B_Other","Refs":["/Game/Tex/T_Icon"]}"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(
            dir.path().join("sub/B_Nested.json"),
            r#"{"Path":"/Game/Blueprints/B_Nested","Refs":["/Game/Structs/FStatInfo"]}"#,
        )
        .unwrap();

        let affected =
            scan_affected(dir.path(), &["/Game/Structs/FStatInfo".to_string()]).unwrap();
        assert_eq!(
            affected,
            vec![
                AssetPath::new("/Game/Blueprints/B_Nested"),
                AssetPath::new("/Game/Blueprints/B_Stat"),
            ]
        );
    }
}
