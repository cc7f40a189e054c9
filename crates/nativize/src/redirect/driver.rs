//! Redirect driver
//!
//! Phase 1 (`prepare`) runs in the session that still has the legacy
//! assets: verify every prerequisite, record the affected assets, back up
//! and delete the legacy files, persist the state file, and stop. Phase 2
//! (`apply`) runs after the host restarts with the redirects active: load
//! and recompile every affected asset, then reparent the component the
//! plan names. `apply` refuses to run unless phase 1 completed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use editor_host::{AssetPath, EditorHost, NativeTypeRef};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::ini::{RedirectEntry, RedirectKind, missing_entries, remediation_lines};
use super::scan::scan_affected;
use super::RedirectPlan;
use crate::ops::MutationOps;

/// Error type for the redirect workflow. These are the only errors in the
/// engine that abort a run: proceeding past a failed prerequisite here
/// destroys assets.
#[derive(Debug, thiserror::Error)]
pub enum RedirectError {
    #[error("failed to read {0}: {1}")]
    Read(String, #[source] io::Error),

    #[error("failed to parse redirect plan: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("native type `{0}` does not resolve; compile the native module first")]
    UnresolvedType(String),

    #[error("legacy asset `{0}` does not exist")]
    MissingLegacyAsset(String),

    #[error("host configuration is missing {0} redirect entries")]
    ConfigMissing(usize),

    #[error("phase 1 has not completed; run `redirect prepare` first")]
    PhaseNotComplete,

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("state file error: {0}")]
    State(#[from] serde_json::Error),
}

/// Persisted between the two processes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedirectState {
    pub phase1_complete: bool,
    pub timestamp: String,
    pub affected: Vec<AssetPath>,
    pub backup_dir: String,
}

impl RedirectState {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RedirectError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| RedirectError::Read(path.display().to_string(), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RedirectError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectReport {
    pub repaired: usize,
    pub failed: usize,
    pub component_reparented: bool,
}

pub struct RedirectDriver<'a> {
    host: &'a dyn EditorHost,
    plan: &'a RedirectPlan,
}

impl<'a> RedirectDriver<'a> {
    pub fn new(host: &'a dyn EditorHost, plan: &'a RedirectPlan) -> Self {
        Self { host, plan }
    }

    /// The configuration lines this plan requires.
    fn required_entries(&self) -> Vec<RedirectEntry> {
        let mut entries = Vec::new();
        for swap in &self.plan.structs {
            entries.push(RedirectEntry::new(
                RedirectKind::Struct,
                object_path(&swap.old_path),
                swap.new_type.clone(),
            ));
        }
        for swap in &self.plan.enums {
            entries.push(RedirectEntry::new(
                RedirectKind::Enum,
                object_path(&swap.old_path),
                swap.new_type.clone(),
            ));
        }
        for rename in &self.plan.properties {
            entries.push(RedirectEntry::new(
                RedirectKind::Property,
                rename.old.clone(),
                rename.new.clone(),
            ));
        }
        entries
    }

    /// Phase 1. Terminates the workflow on success; the host must restart
    /// before `apply`.
    pub fn prepare(&self) -> Result<RedirectState, RedirectError> {
        let swaps = self.plan.structs.iter().chain(&self.plan.enums);

        // Every replacement type must already be compiled in.
        for swap in swaps.clone() {
            let resolves = NativeTypeRef::parse(swap.new_type.clone())
                .ok()
                .map(|r| self.host.resolve_native_type(&r).unwrap_or(false))
                .unwrap_or(false);
            if !resolves {
                return Err(RedirectError::UnresolvedType(swap.new_type.clone()));
            }
        }

        // And every legacy asset must still be where the plan says it is.
        for swap in swaps.clone() {
            let path = AssetPath::new(swap.old_path.clone());
            if !self.host.does_asset_exist(&path).unwrap_or(false) {
                return Err(RedirectError::MissingLegacyAsset(swap.old_path.clone()));
            }
        }

        let config_path = &self.plan.engine_config;
        let config = fs::read_to_string(config_path)
            .map_err(|e| RedirectError::Read(config_path.clone(), e))?;
        let missing = missing_entries(&config, &self.required_entries());
        if !missing.is_empty() {
            error!("{}", remediation_lines(&missing));
            return Err(RedirectError::ConfigMissing(missing.len()));
        }

        let needles: Vec<String> = swaps.clone().map(|s| s.old_path.clone()).collect();
        let affected = scan_affected(Path::new(&self.plan.dna_dir), &needles)?;
        info!("{} assets reference the legacy types", affected.len());

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let backup_dir = PathBuf::from(&self.plan.backup_root).join(format!("backup_{}", timestamp));
        fs::create_dir_all(&backup_dir)?;

        for swap in swaps {
            let logical = AssetPath::new(swap.old_path.clone());
            let file = content_file(&self.plan.content_dir, &logical);
            if file.exists() {
                let dest = backup_dir.join(file.file_name().unwrap_or_default());
                fs::copy(&file, &dest)?;
                info!("backed up {} -> {}", file.display(), dest.display());
                fs::remove_file(&file)?;
            } else {
                warn!("{}: no file at {}", swap.old_path, file.display());
            }
            match self.host.delete_asset(&logical) {
                Ok(true) => info!("deleted legacy asset {}", logical),
                Ok(false) => warn!("{}: host had no asset to delete", logical),
                Err(e) => warn!("{}: delete failed: {}", logical, e),
            }
        }

        let state = RedirectState {
            phase1_complete: true,
            timestamp,
            affected,
            backup_dir: backup_dir.display().to_string(),
        };
        state.save(&self.plan.state_file)?;
        info!("phase 1 complete; restart the host, then run `redirect apply`");
        Ok(state)
    }

    /// Phases 2 and 3, in the restarted host.
    pub fn apply(&self) -> Result<RedirectReport, RedirectError> {
        let state = RedirectState::load(&self.plan.state_file)?;
        if !state.phase1_complete {
            return Err(RedirectError::PhaseNotComplete);
        }

        let mut report = RedirectReport::default();
        for path in &state.affected {
            // Loading applies the redirects; the compile confirms them.
            match self.host.load_asset(path) {
                Ok(Some(handle)) => match self.host.compile_and_save(&handle) {
                    Ok(true) => {
                        info!("repaired {}", path);
                        report.repaired += 1;
                    }
                    Ok(false) => {
                        warn!("{}: compile failed after redirect", path);
                        report.failed += 1;
                    }
                    Err(e) => {
                        warn!("{}: compile errored: {}", path, e);
                        report.failed += 1;
                    }
                },
                Ok(None) => {
                    warn!("{}: affected asset no longer exists", path);
                    report.failed += 1;
                }
                Err(e) => {
                    warn!("{}: load failed: {}", path, e);
                    report.failed += 1;
                }
            }
        }

        if let Some(component) = &self.plan.component {
            report.component_reparented = self.reparent_component(component);
        }
        Ok(report)
    }

    fn reparent_component(&self, component: &super::ComponentTarget) -> bool {
        let path = AssetPath::new(component.asset.clone());
        let Ok(target) = NativeTypeRef::parse(component.target.clone()) else {
            warn!("{}: bad component target {}", component.asset, component.target);
            return false;
        };
        let handle = match self.host.load_asset(&path) {
            Ok(Some(handle)) => handle,
            _ => {
                warn!("{}: component asset did not load", component.asset);
                return false;
            }
        };
        let ops = MutationOps::new(self.host);
        match ops.reparent_verified(&handle, &target) {
            Ok(true) => {
                info!("component {} reparented to {}", component.asset, target);
                let _ = ops.compile_and_save(&handle);
                true
            }
            _ => {
                warn!("{}: component reparent not confirmed", component.asset);
                false
            }
        }
    }
}

/// Redirect tables address types by full object path, package plus object
/// name: `/Game/Structs/FStatInfo.FStatInfo`.
fn object_path(package: &str) -> String {
    let path = AssetPath::new(package);
    format!("{}.{}", path.package(), path.short_name())
}

/// Map a logical path under `/Game` to its on-disk asset file.
fn content_file(content_dir: &str, logical: &AssetPath) -> PathBuf {
    let relative = logical.as_str().trim_start_matches("/Game/");
    PathBuf::from(content_dir).join(format!("{}.uasset", relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::TypeSwap;
    use editor_host::{AssetRecord, MemoryHost, NativeTypeDecl};
    use tempfile::TempDir;

    fn plan(root: &Path) -> RedirectPlan {
        RedirectPlan {
            engine_config: root.join("DefaultEngine.ini").display().to_string(),
            dna_dir: root.join("dna").display().to_string(),
            content_dir: root.join("Content").display().to_string(),
            backup_root: root.join("backups").display().to_string(),
            state_file: root.join("redirect_state.json").display().to_string(),
            structs: vec![TypeSwap {
                old_path: "/Game/Structs/FStatInfo".to_string(),
                new_type: "/Script/SLF.StatInfo".to_string(),
            }],
            enums: vec![],
            properties: vec![],
            component: None,
        }
    }

    fn seed(root: &Path) {
        fs::write(
            root.join("DefaultEngine.ini"),
            "+StructRedirects=(OldName=\"/Game/Structs/FStatInfo.FStatInfo\",NewName=\"/Script/SLF.StatInfo\")\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("dna")).unwrap();
        fs::write(
            root.join("dna/B_Stat.json"),
            r#"{"Path":"/Game/Blueprints/B_Stat","Refs":["/Game/Structs/FStatInfo"]}"#,
        )
        .unwrap();
        fs::create_dir_all(root.join("Content/Structs")).unwrap();
        fs::write(root.join("Content/Structs/FStatInfo.uasset"), b"binary").unwrap();
    }

    fn host() -> MemoryHost {
        let host = MemoryHost::new();
        host.insert_asset(AssetRecord::new("/Game/Structs/FStatInfo"));
        host.insert_asset(AssetRecord::new("/Game/Blueprints/B_Stat"));
        host.declare_native_type(NativeTypeDecl { name: "/Script/SLF.StatInfo".into(), ..Default::default() });
        host
    }

    #[test]
    fn apply_without_prepare_fails_fast() {
        let dir = TempDir::new().unwrap();
        let plan = plan(dir.path());
        let host = host();
        let err = RedirectDriver::new(&host, &plan).apply().unwrap_err();
        assert!(matches!(err, RedirectError::Read(..)));

        RedirectState::default().save(&plan.state_file).unwrap();
        let err = RedirectDriver::new(&host, &plan).apply().unwrap_err();
        assert!(matches!(err, RedirectError::PhaseNotComplete));
    }

    #[test]
    fn prepare_backs_up_deletes_and_persists_state() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());
        let plan = plan(dir.path());
        let host = host();

        let state = RedirectDriver::new(&host, &plan).prepare().unwrap();
        assert!(state.phase1_complete);
        assert_eq!(state.affected, vec![AssetPath::new("/Game/Blueprints/B_Stat")]);

        // Legacy file moved to the backup tree, asset gone from the host.
        assert!(!dir.path().join("Content/Structs/FStatInfo.uasset").exists());
        assert!(PathBuf::from(&state.backup_dir).join("FStatInfo.uasset").exists());
        assert!(host.record(&"/Game/Structs/FStatInfo".into()).is_none());

        let reloaded = RedirectState::load(&plan.state_file).unwrap();
        assert!(reloaded.phase1_complete);
    }

    #[test]
    fn prepare_refuses_missing_config_entries() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());
        fs::write(dir.path().join("DefaultEngine.ini"), "; empty\n").unwrap();
        let plan = plan(dir.path());
        let host = host();

        let err = RedirectDriver::new(&host, &plan).prepare().unwrap_err();
        assert!(matches!(err, RedirectError::ConfigMissing(1)));
        // Nothing was deleted.
        assert!(dir.path().join("Content/Structs/FStatInfo.uasset").exists());
        assert!(host.record(&"/Game/Structs/FStatInfo".into()).is_some());
    }

    #[test]
    fn prepare_refuses_unresolved_native_type() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());
        let plan = plan(dir.path());
        let host = MemoryHost::new();
        host.insert_asset(AssetRecord::new("/Game/Structs/FStatInfo"));

        let err = RedirectDriver::new(&host, &plan).prepare().unwrap_err();
        assert!(matches!(err, RedirectError::UnresolvedType(_)));
    }
}
