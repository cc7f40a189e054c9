//! Direct struct retyper
//!
//! The single-session alternative to the redirect workflow: rewrite pins
//! in place while the legacy struct assets are still on disk, so nothing
//! ever dangles. Legacy assets are deleted only after every affected asset
//! compiles; one failed compile withholds all deletions.

use editor_host::{AssetPath, EditorHost, NativeTypeRef};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One in-place mapping: every pin typed as `old_path` becomes `new_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetypeMapping {
    pub old_path: String,
    pub new_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct RetypeReport {
    pub rewrites: usize,
    pub compiled: usize,
    pub compile_failures: Vec<String>,
    pub deleted: usize,
}

impl RetypeReport {
    /// Deletion only happens on a fully clean pass.
    pub fn is_clean(&self) -> bool {
        self.compile_failures.is_empty()
    }
}

pub struct Retyper<'a> {
    host: &'a dyn EditorHost,
}

impl<'a> Retyper<'a> {
    pub fn new(host: &'a dyn EditorHost) -> Self {
        Self { host }
    }

    pub fn run(&self, mappings: &[RetypeMapping], affected: &[AssetPath]) -> RetypeReport {
        let mut report = RetypeReport::default();
        let mut handles = Vec::new();

        for path in affected {
            let handle = match self.host.load_asset(path) {
                Ok(Some(handle)) => handle,
                Ok(None) => {
                    warn!("{}: not found, skipping", path);
                    continue;
                }
                Err(e) => {
                    warn!("{}: load failed: {}", path, e);
                    continue;
                }
            };

            for mapping in mappings {
                let old = object_form(&mapping.old_path);
                let Ok(new_type) = NativeTypeRef::parse(mapping.new_type.clone()) else {
                    warn!("bad native type {}", mapping.new_type);
                    continue;
                };
                match self.host.migrate_struct_type(&handle, &old, &new_type) {
                    Ok(0) => {}
                    Ok(n) => {
                        info!("{}: {} pins retyped {} -> {}", handle.short_name(), n, old, new_type);
                        report.rewrites += n;
                    }
                    Err(e) => warn!("{}: retype failed: {}", handle.short_name(), e),
                }
            }
            handles.push(handle);
        }

        for handle in &handles {
            match self.host.compile_and_save(handle) {
                Ok(true) => report.compiled += 1,
                Ok(false) => {
                    let diagnostics = self
                        .host
                        .get_blueprint_diagnostics(handle)
                        .unwrap_or_else(|e| e.to_string());
                    warn!("{}: compile failed: {}", handle.short_name(), diagnostics);
                    report.compile_failures.push(handle.short_name().to_string());
                }
                Err(e) => {
                    warn!("{}: compile errored: {}", handle.short_name(), e);
                    report.compile_failures.push(handle.short_name().to_string());
                }
            }
        }

        if report.is_clean() {
            for mapping in mappings {
                let path = AssetPath::new(mapping.old_path.clone());
                match self.host.delete_asset(&path) {
                    Ok(true) => {
                        info!("deleted legacy struct {}", path);
                        report.deleted += 1;
                    }
                    Ok(false) => warn!("{}: nothing to delete", path),
                    Err(e) => warn!("{}: delete failed: {}", path, e),
                }
            }
        } else {
            warn!(
                "{} compile failures; keeping legacy structs on disk",
                report.compile_failures.len()
            );
        }
        report
    }
}

/// Pins carry the full object path of the struct they are typed as.
fn object_form(package: &str) -> String {
    let path = AssetPath::new(package);
    format!("{}.{}", path.package(), path.short_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use editor_host::{AssetRecord, Graph, GraphKind, MemoryHost, NativeTypeDecl, Node, Pin};

    const OLD: &str = "/Game/Structs/FStatInfo";
    const OLD_OBJ: &str = "/Game/Structs/FStatInfo.FStatInfo";

    fn affected_asset(path: &str) -> AssetRecord {
        let mut asset = AssetRecord::new(path);
        asset.graphs.push(Graph {
            name: "EventGraph".into(),
            kind: GraphKind::Event,
            nodes: vec![Node {
                title: "BreakStatInfo".into(),
                target_class: None,
                struct_type: Some(OLD_OBJ.into()),
                binding_owner: None,
                pins: vec![Pin { name: "Value".into(), struct_type: Some(OLD_OBJ.into()) }],
                stale: false,
            }],
        });
        asset
    }

    fn mapping() -> RetypeMapping {
        RetypeMapping { old_path: OLD.into(), new_type: "/Script/SLF.StatInfo".into() }
    }

    #[test]
    fn retypes_pins_then_deletes_legacy_struct() {
        let host = MemoryHost::new();
        host.insert_asset(AssetRecord::new(OLD));
        host.insert_asset(affected_asset("/Game/Blueprints/B_Stat"));
        host.declare_native_type(NativeTypeDecl { name: "/Script/SLF.StatInfo".into(), ..Default::default() });

        let report =
            Retyper::new(&host).run(&[mapping()], &["/Game/Blueprints/B_Stat".into()]);
        assert_eq!(report.rewrites, 2);
        assert_eq!(report.compiled, 1);
        assert_eq!(report.deleted, 1);
        assert!(host.record(&OLD.into()).is_none());

        let record = host.record(&"/Game/Blueprints/B_Stat".into()).unwrap();
        let node = &record.graphs[0].nodes[0];
        assert_eq!(node.struct_type.as_deref(), Some("/Script/SLF.StatInfo"));
    }

    #[test]
    fn compile_failure_withholds_deletion() {
        let host = MemoryHost::new();
        host.insert_asset(AssetRecord::new(OLD));
        host.insert_asset(affected_asset("/Game/Blueprints/B_Stat"));
        // A second affected asset whose struct type has no mapping stays
        // dangling once the legacy struct would be deleted.
        let mut other = affected_asset("/Game/Blueprints/B_Other");
        other.graphs[0].nodes[0].struct_type = Some("/Game/Structs/FGone.FGone".into());
        other.graphs[0].nodes[0].pins.clear();
        host.insert_asset(other);
        host.declare_native_type(NativeTypeDecl { name: "/Script/SLF.StatInfo".into(), ..Default::default() });

        let report = Retyper::new(&host).run(
            &[mapping()],
            &["/Game/Blueprints/B_Stat".into(), "/Game/Blueprints/B_Other".into()],
        );
        assert!(!report.is_clean());
        assert_eq!(report.deleted, 0);
        assert!(host.record(&OLD.into()).is_some());
    }
}
