// The Graph-Mutation Port.
//
// Everything the migration engine may do to the editor goes through this
// trait. Implementations must keep two properties the engine relies on:
//
// - `load_asset` and `reparent` are the only suspension points; they may
//   cascade-load referenced assets and queue deferred host work. Save,
//   clear, and property access are synchronous.
// - The `no_compile` clear variants must not trigger any compile; compiling
//   a cleared-but-unreparented asset cascades failures into every dependent.

use crate::types::{AssetPath, ClassRef, NativeTypeRef, PropertyValue};

/// Error type for host calls.
///
/// The engine converts every `HostError` at a phase boundary into a logged,
/// counted, continue outcome; nothing here aborts a session.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("asset is not loaded: {0}")]
    NotLoaded(AssetPath),

    #[error("host fault: {0}")]
    Fault(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Opaque handle to a loaded asset. Cheap to clone; owned by the host's
/// object graph, never by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    path: AssetPath,
}

impl AssetHandle {
    pub fn new(path: AssetPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &AssetPath {
        &self.path
    }

    pub fn short_name(&self) -> &str {
        self.path.short_name()
    }
}

/// The capability set the migration engine consumes.
pub trait EditorHost {
    // ── Asset library ────────────────────────────────────────────────────

    /// Resolve a logical path; `None` on miss. May cascade-load references.
    fn load_asset(&self, path: &AssetPath) -> HostResult<Option<AssetHandle>>;

    /// Existence probe that never loads.
    fn does_asset_exist(&self, path: &AssetPath) -> HostResult<bool>;

    /// Logical paths under a directory.
    fn list_assets(&self, directory: &AssetPath, recursive: bool) -> HostResult<Vec<AssetPath>>;

    /// Persist a loaded asset.
    fn save_asset(&self, handle: &AssetHandle) -> HostResult<()>;

    /// Remove an asset from the content tree. `false` when absent or in use.
    fn delete_asset(&self, path: &AssetPath) -> HostResult<bool>;

    // ── Reflection ───────────────────────────────────────────────────────

    /// Whether a native type reference resolves against the host type table.
    fn resolve_native_type(&self, type_ref: &NativeTypeRef) -> HostResult<bool>;

    fn parent_class(&self, handle: &AssetHandle) -> HostResult<Option<ClassRef>>;

    fn implemented_interfaces(&self, handle: &AssetHandle) -> HostResult<Vec<String>>;

    fn member_variables(&self, handle: &AssetHandle) -> HostResult<Vec<String>>;

    fn graph_node_count(&self, handle: &AssetHandle) -> HostResult<usize>;

    // ── Graph mutation ───────────────────────────────────────────────────

    /// Delete all graph content, member variables, and dispatchers.
    fn clear_all_graph_logic(&self, handle: &AssetHandle, no_compile: bool) -> HostResult<()>;

    /// Delete event and function graph content but keep declared variables
    /// and the animation graph.
    fn clear_graphs_keep_variables(&self, handle: &AssetHandle, no_compile: bool) -> HostResult<()>;

    fn remove_implemented_interfaces(&self, handle: &AssetHandle) -> HostResult<()>;

    /// Change the asset's parent class. Triggers an internal compile; the
    /// returned flag is advisory — callers must confirm by re-reading the
    /// parent class.
    fn reparent(&self, handle: &AssetHandle, new_parent: &NativeTypeRef) -> HostResult<bool>;

    fn compile_and_save(&self, handle: &AssetHandle) -> HostResult<bool>;

    // ── Struct retyping and dependent repair ─────────────────────────────

    /// Rewrite every pin and node typed as `old_type_path` to `new_type`.
    /// Returns the number of rewrites.
    fn migrate_struct_type(
        &self,
        handle: &AssetHandle,
        old_type_path: &str,
        new_type: &NativeTypeRef,
    ) -> HostResult<usize>;

    /// Reconstruct every struct node, re-resolving its type through the
    /// active redirect table. Returns the number of nodes touched.
    fn refresh_all_struct_nodes(&self, handle: &AssetHandle) -> HostResult<usize>;

    /// Re-target call nodes whose target is `old_class` to `new_class`.
    fn refresh_function_calls_for_class(
        &self,
        handle: &AssetHandle,
        old_class: &str,
        new_class: &str,
    ) -> HostResult<usize>;

    /// Re-bind multicast-event subscriptions whose owner was `old_owner`.
    fn fix_event_dispatcher_bindings(&self, handle: &AssetHandle, old_owner: &str) -> HostResult<usize>;

    /// Force a re-lookup of every node's referenced symbol.
    fn reconstruct_all_nodes(&self, handle: &AssetHandle) -> HostResult<()>;

    fn get_blueprint_diagnostics(&self, handle: &AssetHandle) -> HostResult<String>;

    // ── Property access ──────────────────────────────────────────────────

    fn get_property(&self, handle: &AssetHandle, name: &str) -> HostResult<Option<PropertyValue>>;

    /// Write a property. `false` when no property of that name exists on the
    /// asset's class — callers probing alternate spellings rely on this.
    fn set_property(&self, handle: &AssetHandle, name: &str, value: PropertyValue) -> HostResult<bool>;

    /// Textual export of a (usually struct-typed) property, or `None` when
    /// the property does not exist.
    fn export_property_text(&self, handle: &AssetHandle, name: &str) -> HostResult<Option<String>>;

    /// Read a property from the generated class's default object.
    fn default_object_property(&self, handle: &AssetHandle, name: &str) -> HostResult<Option<PropertyValue>>;

    // ── Scheduling ───────────────────────────────────────────────────────

    /// Run a host garbage-collection pass.
    fn collect_garbage(&self);

    /// Drain the host's deferred load/compile queues, when supported.
    /// Returns `false` when the host offers no deterministic drain and the
    /// caller must fall back to a timed wait.
    fn drain_deferred_work(&self) -> HostResult<bool>;
}
