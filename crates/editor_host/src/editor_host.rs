//! Editor Host Port
//!
//! The narrow capability set a migration engine needs from a game editor:
//! asset resolution, graph mutation, reparenting, compilation, and property
//! access. The production implementation of [`EditorHost`] lives in a native
//! editor plugin; this crate ships [`MemoryHost`], a snapshot-driven
//! in-memory host used for offline runs and tests.

pub mod asset;
pub mod host;
pub mod memory;
pub mod snapshot;
pub mod types;

pub use asset::{AssetRecord, ComponentNode, Graph, GraphKind, Node, Pin, Variable};
pub use host::{AssetHandle, EditorHost, HostError, HostResult};
pub use memory::MemoryHost;
pub use snapshot::{ContentSnapshot, NativeTypeDecl, SnapshotError};
pub use types::{AssetPath, ClassRef, NativeTypeRef, PropertyValue, TypeRefError};
