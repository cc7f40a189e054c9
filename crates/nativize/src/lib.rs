//! Nativize - Blueprint-to-Native Migration Engine
//!
//! This crate automates moving a project's visual-script assets onto freshly
//! authored native classes:
//! - Policy registry: which asset gets which treatment, as data
//! - Asset resolver: overrides, search paths, skip set
//! - Phase orchestrator: load, clear, flush, reparent, save, compile, validate
//! - Type-redirect driver: two-process struct/enum swaps via host redirects
//! - Direct struct retyper: in-place pin retyping without a restart
//! - Extractor / rehydrator: carry property data across the class change
//! - Dependency refresh: repair assets that referenced a migrated class
//! - Data patches: idempotent post-migration repairs
//!
//! All editor access goes through `editor_host::EditorHost`.

// Policy registry and policy document
pub mod policy;

// Asset resolution
pub mod resolver;

// Session bookkeeping and phase ordering
pub mod phase;
pub mod session;

// Verified mutation wrappers
pub mod ops;

// The six-phase migration pipeline
pub mod orchestrator;

// Property extraction and rehydration
pub mod extract;

// Two-process type-redirect workflow
pub mod redirect;

// In-place struct retyping
pub mod retyper;

// Dependent-asset repair
pub mod depfix;

// Post-migration data repairs
pub mod patches;

pub use policy::{PolicyDocument, PolicyError, PolicyRegistry, Treatment};
pub use session::{MigrationSession, SummaryReport};
