//! Dependency refresh
//!
//! After a class moves native, assets that called into it still hold stale
//! node references: call nodes targeting the old generated class
//! (`<Name>_C`) and event bindings owned by it. This pass reconstructs
//! nodes, re-targets calls, re-binds dispatchers, and recompiles. Safe to
//! run on assets that never referenced the class at all.

use editor_host::{AssetPath, EditorHost};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct DepfixReport {
    pub refreshed: usize,
    pub calls_retargeted: usize,
    pub bindings_fixed: usize,
    pub compile_failures: usize,
}

pub struct DependencyRefresher<'a> {
    host: &'a dyn EditorHost,
}

impl<'a> DependencyRefresher<'a> {
    pub fn new(host: &'a dyn EditorHost) -> Self {
        Self { host }
    }

    /// Repair `dependents` after `old_class` (a generated-class name like
    /// `B_ActionManager_C`) was replaced by the native `new_class`.
    pub fn run(&self, dependents: &[AssetPath], old_class: &str, new_class: &str) -> DepfixReport {
        let mut report = DepfixReport::default();

        for path in dependents {
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

            if let Err(e) = self.host.reconstruct_all_nodes(&handle) {
                warn!("{}: node reconstruction failed: {}", handle.short_name(), e);
                continue;
            }
            match self.host.refresh_function_calls_for_class(&handle, old_class, new_class) {
                Ok(n) if n > 0 => {
                    info!("{}: {} call nodes retargeted", handle.short_name(), n);
                    report.calls_retargeted += n;
                }
                Ok(_) => {}
                Err(e) => warn!("{}: call refresh failed: {}", handle.short_name(), e),
            }
            match self.host.fix_event_dispatcher_bindings(&handle, old_class) {
                Ok(n) if n > 0 => {
                    info!("{}: {} dispatcher bindings re-bound", handle.short_name(), n);
                    report.bindings_fixed += n;
                }
                Ok(_) => {}
                Err(e) => warn!("{}: binding fix failed: {}", handle.short_name(), e),
            }

            match self.host.compile_and_save(&handle) {
                Ok(true) => report.refreshed += 1,
                Ok(false) => {
                    warn!("{}: compile failed after refresh", handle.short_name());
                    report.compile_failures += 1;
                }
                Err(e) => {
                    warn!("{}: compile errored: {}", handle.short_name(), e);
                    report.compile_failures += 1;
                }
            }
        }
        info!(
            "Dependency refresh: {} repaired, {} calls, {} bindings, {} compile failures",
            report.refreshed, report.calls_retargeted, report.bindings_fixed, report.compile_failures
        );
        report
    }
}
