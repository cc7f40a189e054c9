//! Type-redirect workflow
//!
//! Struct and enum swaps cannot be done in one editor session: the host
//! applies redirect tables at load time, so the legacy assets must be gone
//! and the configuration in place before the next launch. The driver splits
//! the work into a prepare step (verify, back up, delete, persist state)
//! and an apply step run after the host restarts.

mod driver;
mod ini;
mod scan;

pub use driver::{RedirectDriver, RedirectError, RedirectReport, RedirectState};
pub use ini::{RedirectEntry, RedirectKind, missing_entries, parse_config, remediation_lines};
pub use scan::scan_affected;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One struct or enum swap: the legacy asset's package path and the native
/// type replacing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSwap {
    pub old_path: String,
    pub new_type: String,
}

/// A property rename carried by the redirect tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRename {
    pub old: String,
    pub new: String,
}

/// The component asset reparented in the final step, once its pin types
/// resolve natively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentTarget {
    pub asset: String,
    pub target: String,
}

/// The redirect plan as persisted (TOML).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedirectPlan {
    /// Host configuration file carrying the redirect entries.
    pub engine_config: String,
    /// Directory of exported per-asset JSON used to find referencing assets.
    pub dna_dir: String,
    /// On-disk content directory the logical `/Game` root maps to.
    pub content_dir: String,
    pub backup_root: String,
    pub state_file: String,
    #[serde(default)]
    pub structs: Vec<TypeSwap>,
    #[serde(default)]
    pub enums: Vec<TypeSwap>,
    #[serde(default)]
    pub properties: Vec<PropertyRename>,
    pub component: Option<ComponentTarget>,
}

impl RedirectPlan {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RedirectError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| RedirectError::Read(path.display().to_string(), e))?;
        Ok(toml::from_str(&content)?)
    }
}
