//! Verified mutation wrappers
//!
//! The host's mutation primitives return void or an advisory flag; this
//! wrapper verifies each one by probing its postcondition. It also binds
//! only the no-compile clear variants, so a compile cannot be triggered on
//! a cleared-but-unreparented asset.

use editor_host::{AssetHandle, ClassRef, EditorHost, HostResult, NativeTypeRef};
use tracing::debug;

pub struct MutationOps<'a> {
    host: &'a dyn EditorHost,
}

impl<'a> MutationOps<'a> {
    pub fn new(host: &'a dyn EditorHost) -> Self {
        Self { host }
    }

    /// Clear all graph logic, member variables, and dispatchers. Verified
    /// by re-reading the node count.
    pub fn clear_full(&self, handle: &AssetHandle) -> HostResult<bool> {
        self.host.clear_all_graph_logic(handle, true)?;
        let remaining = self.host.graph_node_count(handle)?;
        debug!("{}: cleared, {} nodes remain", handle.short_name(), remaining);
        Ok(remaining == 0)
    }

    /// Clear event and function graphs, keep variables and the anim graph.
    /// The anim graph legitimately keeps nodes, so only the variable
    /// postcondition is checkable; a disappearing variable list means the
    /// host ran the wrong clear.
    pub fn clear_keep_vars(&self, handle: &AssetHandle) -> HostResult<bool> {
        let vars_before = self.host.member_variables(handle)?;
        self.host.clear_graphs_keep_variables(handle, true)?;
        let vars_after = self.host.member_variables(handle)?;
        Ok(vars_after == vars_before)
    }

    /// Remove implemented interfaces. Returns the interfaces that were
    /// removed, empty when there were none.
    pub fn remove_interfaces(&self, handle: &AssetHandle) -> HostResult<Vec<String>> {
        let interfaces = self.host.implemented_interfaces(handle)?;
        if interfaces.is_empty() {
            return Ok(interfaces);
        }
        self.host.remove_implemented_interfaces(handle)?;
        Ok(interfaces)
    }

    /// Reparent, then confirm by re-reading the parent class. The host's
    /// returned flag is advisory only.
    pub fn reparent_verified(&self, handle: &AssetHandle, target: &NativeTypeRef) -> HostResult<bool> {
        let claimed = self.host.reparent(handle, target)?;
        let confirmed = matches!(
            self.host.parent_class(handle)?,
            Some(ClassRef::Native { type_ref }) if type_ref == *target
        );
        if claimed && !confirmed {
            debug!("{}: host claimed reparent but parent class disagrees", handle.short_name());
        }
        Ok(confirmed)
    }

    pub fn save(&self, handle: &AssetHandle) -> HostResult<()> {
        self.host.save_asset(handle)
    }

    pub fn compile_and_save(&self, handle: &AssetHandle) -> HostResult<bool> {
        self.host.compile_and_save(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use editor_host::{AssetRecord, Graph, GraphKind, MemoryHost, NativeTypeDecl, Node, Variable};

    fn simple_node(title: &str) -> Node {
        Node {
            title: title.into(),
            target_class: None,
            struct_type: None,
            binding_owner: None,
            pins: vec![],
            stale: false,
        }
    }

    #[test]
    fn reparent_is_confirmed_by_reading_back() {
        let host = MemoryHost::new();
        host.insert_asset(AssetRecord::new("/Game/B_Thing"));
        host.declare_native_type(NativeTypeDecl { name: "/Script/SLF.Thing".into(), ..Default::default() });

        let handle = host.load_asset(&"/Game/B_Thing".into()).unwrap().unwrap();
        let ops = MutationOps::new(&host);
        let target = NativeTypeRef::parse("/Script/SLF.Thing").unwrap();
        assert!(ops.reparent_verified(&handle, &target).unwrap());

        let unknown = NativeTypeRef::parse("/Script/SLF.NoSuchType").unwrap();
        assert!(!ops.reparent_verified(&handle, &unknown).unwrap());
    }

    #[test]
    fn clear_full_checks_node_count() {
        let host = MemoryHost::new();
        let mut asset = AssetRecord::new("/Game/B_Thing");
        asset.graphs.push(Graph {
            name: "EventGraph".into(),
            kind: GraphKind::Event,
            nodes: vec![simple_node("Tick")],
        });
        host.insert_asset(asset);

        let handle = host.load_asset(&"/Game/B_Thing".into()).unwrap().unwrap();
        assert!(MutationOps::new(&host).clear_full(&handle).unwrap());
    }

    #[test]
    fn clear_keep_vars_checks_variables_survive() {
        let host = MemoryHost::new();
        let mut asset = AssetRecord::new("/Game/AC_Thing");
        asset.variables.push(Variable { name: "Speed".into(), var_type: "float".into() });
        host.insert_asset(asset);

        let handle = host.load_asset(&"/Game/AC_Thing".into()).unwrap().unwrap();
        assert!(MutationOps::new(&host).clear_keep_vars(&handle).unwrap());
    }
}
