//! Migration policy
//!
//! Which asset gets which treatment is data, not code: a TOML policy
//! document (`config.rs`) compiled into a validated registry
//! (`registry.rs`) before any phase runs.

mod config;
mod registry;

pub use config::{
    ExtractionCategory, FlushConfig, PatchSpec, PolicyDocument, StructExtraction, ValidationTarget,
};
pub use registry::{MigrationEntry, PolicyError, PolicyRegistry, Treatment};
