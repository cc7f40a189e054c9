//! Asset resolver
//!
//! Turns a short asset name into a loaded handle. Resolution order: skip
//! set (no host call at all), then the explicit path override (which never
//! falls through), then the ordered search paths. Host faults resolve to
//! `None` with a warning; resolution never aborts a run.

use std::collections::{BTreeMap, BTreeSet};

use editor_host::{AssetHandle, AssetPath, EditorHost};
use tracing::{debug, warn};

pub struct Resolver {
    skip: BTreeSet<String>,
    overrides: BTreeMap<String, AssetPath>,
    search_paths: Vec<AssetPath>,
}

impl Resolver {
    pub fn new(
        skip: BTreeSet<String>,
        overrides: BTreeMap<String, AssetPath>,
        search_paths: Vec<AssetPath>,
    ) -> Self {
        Self { skip, overrides, search_paths }
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        self.skip.contains(name)
    }

    /// Resolve and load an asset by short name.
    pub fn resolve(&self, host: &dyn EditorHost, name: &str) -> Option<AssetHandle> {
        if self.skip.contains(name) {
            debug!("{}: on the skip list, not loading", name);
            return None;
        }

        if let Some(path) = self.overrides.get(name) {
            // An override is authoritative; a miss here is a miss, period.
            return self.try_load(host, name, path);
        }

        for dir in &self.search_paths {
            let candidate = dir.join(name);
            match host.does_asset_exist(&candidate) {
                Ok(true) => return self.try_load(host, name, &candidate),
                Ok(false) => continue,
                Err(e) => {
                    warn!("{}: existence probe failed at {}: {}", name, candidate, e);
                    continue;
                }
            }
        }

        debug!("{}: not found on any search path", name);
        None
    }

    fn try_load(&self, host: &dyn EditorHost, name: &str, path: &AssetPath) -> Option<AssetHandle> {
        match host.does_asset_exist(path) {
            Ok(true) => {}
            Ok(false) => {
                debug!("{}: {} does not exist", name, path);
                return None;
            }
            Err(e) => {
                warn!("{}: existence probe failed at {}: {}", name, path, e);
                return None;
            }
        }
        match host.load_asset(path) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("{}: load failed at {}: {}", name, path, e);
                None
            }
        }
    }
}
