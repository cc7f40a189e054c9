//! In-memory editor host
//!
//! A snapshot-driven implementation of [`EditorHost`] that models the host
//! behaviors the migration engine depends on: cascade loads, load-time type
//! redirects, deferred-work queues, interface-blocked reparenting, and
//! compile outcomes. Used by the CLI for offline runs and by every test.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::Mutex;
use tracing::debug;

use crate::asset::{AssetRecord, GraphKind};
use crate::host::{AssetHandle, EditorHost, HostError, HostResult};
use crate::snapshot::{ContentSnapshot, NativeTypeDecl};
use crate::types::{AssetPath, ClassRef, NativeTypeRef, PropertyValue};

#[derive(Default)]
struct HostState {
    assets: BTreeMap<AssetPath, AssetRecord>,
    loaded: BTreeSet<AssetPath>,
    native_types: BTreeMap<String, NativeTypeDecl>,
    type_redirects: BTreeMap<String, String>,
    property_redirects: BTreeMap<String, String>,
    /// Deferred loads/compiles queued by suspension points.
    deferred: usize,
    saves: BTreeMap<AssetPath, usize>,
    /// Short names whose host calls fault (test hook).
    faulting: BTreeSet<String>,
}

impl HostState {
    fn record(&self, path: &AssetPath) -> Option<&AssetRecord> {
        self.assets.get(path).or_else(|| self.assets.get(&path.package()))
    }

    fn check_fault(&self, path: &AssetPath) -> HostResult<()> {
        if self.faulting.contains(path.short_name()) {
            return Err(HostError::Fault(format!("injected fault on {}", path.short_name())));
        }
        Ok(())
    }

    fn loaded_record_key(&self, handle: &AssetHandle) -> HostResult<AssetPath> {
        self.check_fault(handle.path())?;
        let key = handle.path().package();
        if !self.assets.contains_key(&key) || !self.loaded.contains(&key) {
            return Err(HostError::NotLoaded(handle.path().clone()));
        }
        Ok(key)
    }

    /// Rewrite struct types and decorated member names per the active
    /// redirect tables. The host applies this during load, before any graph
    /// node resolves type references.
    fn apply_redirects(&mut self, key: &AssetPath) {
        let type_redirects = self.type_redirects.clone();
        let property_redirects = self.property_redirects.clone();
        let Some(record) = self.assets.get_mut(key) else { return };

        for graph in &mut record.graphs {
            for node in &mut graph.nodes {
                if let Some(st) = &node.struct_type {
                    if let Some(new) = type_redirects.get(st) {
                        node.struct_type = Some(new.clone());
                        node.stale = false;
                    }
                }
                for pin in &mut node.pins {
                    if let Some(st) = &pin.struct_type {
                        if let Some(new) = type_redirects.get(st) {
                            pin.struct_type = Some(new.clone());
                        }
                    }
                    // Decorated member names carry a `Struct.Member_N_GUID`
                    // redirect entry; match on the member part.
                    if let Some(new_name) = property_redirects
                        .iter()
                        .find(|(old, _)| old.split_once('.').map(|(_, m)| m) == Some(pin.name.as_str()))
                        .map(|(_, new)| new.clone())
                    {
                        pin.name = new_name;
                    }
                }
            }
        }
        for var in &mut record.variables {
            if let Some(new) = type_redirects.get(&var.var_type) {
                var.var_type = new.clone();
            }
        }
    }

    /// Whether the record would compile: no stale nodes, and every struct
    /// type that still points into the content tree must resolve.
    fn compiles(&self, record: &AssetRecord) -> bool {
        for graph in &record.graphs {
            for node in &graph.nodes {
                if node.stale {
                    return false;
                }
                let types = node
                    .struct_type
                    .iter()
                    .chain(node.pins.iter().filter_map(|p| p.struct_type.as_ref()));
                for st in types {
                    if st.starts_with("/Game") {
                        let path = AssetPath::new(st.clone()).package();
                        if !self.assets.contains_key(&path) && !self.type_redirects.contains_key(st) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    fn native_decl_for(&self, record: &AssetRecord) -> Option<&NativeTypeDecl> {
        match &record.parent_class {
            Some(ClassRef::Native { type_ref }) => self.native_types.get(type_ref.as_str()),
            _ => None,
        }
    }

    /// A property "exists" when it is set on the asset or declared by the
    /// native parent class.
    fn property_exists(&self, record: &AssetRecord, name: &str) -> bool {
        record.properties.contains_key(name)
            || record.variables.iter().any(|v| v.name == name)
            || self
                .native_decl_for(record)
                .map(|d| d.properties.iter().any(|p| p == name))
                .unwrap_or(false)
    }
}

/// Snapshot-backed [`EditorHost`].
pub struct MemoryHost {
    state: Mutex<HostState>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self { state: Mutex::new(HostState::default()) }
    }

    pub fn from_snapshot(snapshot: ContentSnapshot) -> Self {
        let host = Self::new();
        {
            let mut state = host.state.lock();
            for asset in snapshot.assets {
                state.assets.insert(asset.path.clone(), asset);
            }
            for decl in snapshot.native_types {
                state.native_types.insert(decl.name.clone(), decl);
            }
            state.type_redirects = snapshot.type_redirects;
            state.property_redirects = snapshot.property_redirects;
        }
        host
    }

    pub fn to_snapshot(&self) -> ContentSnapshot {
        let state = self.state.lock();
        ContentSnapshot {
            assets: state.assets.values().cloned().collect(),
            native_types: state.native_types.values().cloned().collect(),
            type_redirects: state.type_redirects.clone(),
            property_redirects: state.property_redirects.clone(),
        }
    }

    // ── Fixture and assertion helpers ────────────────────────────────────

    pub fn insert_asset(&self, asset: AssetRecord) {
        self.state.lock().assets.insert(asset.path.clone(), asset);
    }

    pub fn declare_native_type(&self, decl: NativeTypeDecl) {
        self.state.lock().native_types.insert(decl.name.clone(), decl);
    }

    pub fn add_type_redirect(&self, old: impl Into<String>, new: impl Into<String>) {
        self.state.lock().type_redirects.insert(old.into(), new.into());
    }

    pub fn add_property_redirect(&self, old: impl Into<String>, new: impl Into<String>) {
        self.state.lock().property_redirects.insert(old.into(), new.into());
    }

    /// Make every host call against this short name fault (test hook).
    pub fn inject_fault(&self, short_name: impl Into<String>) {
        self.state.lock().faulting.insert(short_name.into());
    }

    /// Current state of an asset record, loaded or not.
    pub fn record(&self, path: &AssetPath) -> Option<AssetRecord> {
        let state = self.state.lock();
        state.record(path).cloned()
    }

    pub fn is_loaded(&self, path: &AssetPath) -> bool {
        self.state.lock().loaded.contains(&path.package())
    }

    pub fn save_count(&self, path: &AssetPath) -> usize {
        self.state.lock().saves.get(&path.package()).copied().unwrap_or(0)
    }

    pub fn deferred_work(&self) -> usize {
        self.state.lock().deferred
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorHost for MemoryHost {
    fn load_asset(&self, path: &AssetPath) -> HostResult<Option<AssetHandle>> {
        let mut state = self.state.lock();
        state.check_fault(path)?;
        let key = path.package();
        if !state.assets.contains_key(&key) {
            return Ok(None);
        }

        // Cascade: loading an asset pulls in everything it references, each
        // of which queues deferred host work.
        let mut queue = vec![key.clone()];
        while let Some(next) = queue.pop() {
            if state.loaded.contains(&next) || !state.assets.contains_key(&next) {
                continue;
            }
            state.apply_redirects(&next);
            state.loaded.insert(next.clone());
            state.deferred += 1;
            let refs: Vec<AssetPath> = state.assets[&next].references.iter().map(|r| r.package()).collect();
            for r in refs {
                debug!("cascade load: {} -> {}", next, r);
                queue.push(r);
            }
        }

        Ok(Some(AssetHandle::new(key)))
    }

    fn does_asset_exist(&self, path: &AssetPath) -> HostResult<bool> {
        let state = self.state.lock();
        state.check_fault(path)?;
        Ok(state.record(path).is_some())
    }

    fn list_assets(&self, directory: &AssetPath, recursive: bool) -> HostResult<Vec<AssetPath>> {
        let state = self.state.lock();
        let dir_depth = directory.as_str().matches('/').count();
        Ok(state
            .assets
            .keys()
            .filter(|p| p.is_under(directory) && p.as_str() != directory.as_str())
            .filter(|p| recursive || p.as_str().matches('/').count() == dir_depth + 1)
            .cloned()
            .collect())
    }

    fn save_asset(&self, handle: &AssetHandle) -> HostResult<()> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        *state.saves.entry(key).or_insert(0) += 1;
        Ok(())
    }

    fn delete_asset(&self, path: &AssetPath) -> HostResult<bool> {
        let mut state = self.state.lock();
        state.check_fault(path)?;
        let key = path.package();
        state.loaded.remove(&key);
        Ok(state.assets.remove(&key).is_some())
    }

    fn resolve_native_type(&self, type_ref: &NativeTypeRef) -> HostResult<bool> {
        Ok(self.state.lock().native_types.contains_key(type_ref.as_str()))
    }

    fn parent_class(&self, handle: &AssetHandle) -> HostResult<Option<ClassRef>> {
        let state = self.state.lock();
        state.check_fault(handle.path())?;
        Ok(state.record(handle.path()).and_then(|r| r.parent_class.clone()))
    }

    fn implemented_interfaces(&self, handle: &AssetHandle) -> HostResult<Vec<String>> {
        let state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        Ok(state.assets[&key].interfaces.clone())
    }

    fn member_variables(&self, handle: &AssetHandle) -> HostResult<Vec<String>> {
        let state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        Ok(state.assets[&key].variable_names())
    }

    fn graph_node_count(&self, handle: &AssetHandle) -> HostResult<usize> {
        let state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        Ok(state.assets[&key].node_count())
    }

    fn clear_all_graph_logic(&self, handle: &AssetHandle, no_compile: bool) -> HostResult<()> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        if !no_compile {
            state.deferred += 1;
        }
        let record = state.assets.get_mut(&key).unwrap();
        for graph in &mut record.graphs {
            graph.nodes.clear();
        }
        record.variables.clear();
        Ok(())
    }

    fn clear_graphs_keep_variables(&self, handle: &AssetHandle, no_compile: bool) -> HostResult<()> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        if !no_compile {
            state.deferred += 1;
        }
        let record = state.assets.get_mut(&key).unwrap();
        for graph in &mut record.graphs {
            if graph.kind != GraphKind::AnimGraph {
                graph.nodes.clear();
            }
        }
        Ok(())
    }

    fn remove_implemented_interfaces(&self, handle: &AssetHandle) -> HostResult<()> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        state.assets.get_mut(&key).unwrap().interfaces.clear();
        Ok(())
    }

    fn reparent(&self, handle: &AssetHandle, new_parent: &NativeTypeRef) -> HostResult<bool> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        let Some(decl) = state.native_types.get(new_parent.as_str()).cloned() else {
            return Ok(false);
        };
        // Interfaces the native parent does not declare block the reparent.
        let blocked = state.assets[&key]
            .interfaces
            .iter()
            .any(|i| !decl.interfaces.contains(i));
        if blocked {
            return Ok(false);
        }
        state.deferred += 1; // internal compile may schedule loads
        let record = state.assets.get_mut(&key).unwrap();
        record.parent_class = Some(ClassRef::native(new_parent.clone()));
        Ok(true)
    }

    fn compile_and_save(&self, handle: &AssetHandle) -> HostResult<bool> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        let ok = state.compiles(&state.assets[&key]);
        if ok {
            *state.saves.entry(key).or_insert(0) += 1;
        }
        Ok(ok)
    }

    fn migrate_struct_type(
        &self,
        handle: &AssetHandle,
        old_type_path: &str,
        new_type: &NativeTypeRef,
    ) -> HostResult<usize> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        let record = state.assets.get_mut(&key).unwrap();
        let mut count = 0;
        for graph in &mut record.graphs {
            for node in &mut graph.nodes {
                if node.struct_type.as_deref() == Some(old_type_path) {
                    node.struct_type = Some(new_type.as_str().to_string());
                    node.stale = false;
                    count += 1;
                }
                for pin in &mut node.pins {
                    if pin.struct_type.as_deref() == Some(old_type_path) {
                        pin.struct_type = Some(new_type.as_str().to_string());
                        count += 1;
                    }
                }
            }
        }
        for var in &mut record.variables {
            if var.var_type == old_type_path {
                var.var_type = new_type.as_str().to_string();
                count += 1;
            }
        }
        Ok(count)
    }

    fn refresh_all_struct_nodes(&self, handle: &AssetHandle) -> HostResult<usize> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        let redirects = state.type_redirects.clone();
        let record = state.assets.get_mut(&key).unwrap();
        let mut count = 0;
        for graph in &mut record.graphs {
            for node in &mut graph.nodes {
                if node.struct_type.is_some() {
                    if let Some(new) = node.struct_type.as_ref().and_then(|st| redirects.get(st)) {
                        node.struct_type = Some(new.clone());
                    }
                    node.stale = false;
                    count += 1;
                }
                for pin in &mut node.pins {
                    if let Some(new) = pin.struct_type.as_ref().and_then(|st| redirects.get(st)) {
                        pin.struct_type = Some(new.clone());
                    }
                }
            }
        }
        Ok(count)
    }

    fn refresh_function_calls_for_class(
        &self,
        handle: &AssetHandle,
        old_class: &str,
        new_class: &str,
    ) -> HostResult<usize> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        let record = state.assets.get_mut(&key).unwrap();
        let mut count = 0;
        for graph in &mut record.graphs {
            for node in &mut graph.nodes {
                if node.target_class.as_deref() == Some(old_class) {
                    node.target_class = Some(new_class.to_string());
                    node.stale = false;
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    fn fix_event_dispatcher_bindings(&self, handle: &AssetHandle, old_owner: &str) -> HostResult<usize> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        let record = state.assets.get_mut(&key).unwrap();
        let mut count = 0;
        for graph in &mut record.graphs {
            for node in &mut graph.nodes {
                if node.binding_owner.as_deref() == Some(old_owner) {
                    node.binding_owner = None;
                    node.stale = false;
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    fn reconstruct_all_nodes(&self, handle: &AssetHandle) -> HostResult<()> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        state.apply_redirects(&key);
        let record = state.assets.get_mut(&key).unwrap();
        for graph in &mut record.graphs {
            for node in &mut graph.nodes {
                node.stale = false;
            }
        }
        Ok(())
    }

    fn get_blueprint_diagnostics(&self, handle: &AssetHandle) -> HostResult<String> {
        let state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        let record = &state.assets[&key];
        let stale: usize = record
            .graphs
            .iter()
            .flat_map(|g| &g.nodes)
            .filter(|n| n.stale)
            .count();
        Ok(format!(
            "{}: parent={} graphs={} nodes={} vars={} interfaces={} stale_nodes={}",
            record.short_name(),
            record.parent_class.as_ref().map(|c| c.display_name()).unwrap_or("None"),
            record.graphs.len(),
            record.node_count(),
            record.variables.len(),
            record.interfaces.len(),
            stale,
        ))
    }

    fn get_property(&self, handle: &AssetHandle, name: &str) -> HostResult<Option<PropertyValue>> {
        let state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        Ok(state.assets[&key].properties.get(name).cloned())
    }

    fn set_property(&self, handle: &AssetHandle, name: &str, value: PropertyValue) -> HostResult<bool> {
        let mut state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        if !state.property_exists(&state.assets[&key], name) {
            return Ok(false);
        }
        state.assets.get_mut(&key).unwrap().properties.insert(name.to_string(), value);
        Ok(true)
    }

    fn export_property_text(&self, handle: &AssetHandle, name: &str) -> HostResult<Option<String>> {
        let state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        Ok(state.assets[&key].properties.get(name).map(render_export_text))
    }

    fn default_object_property(&self, handle: &AssetHandle, name: &str) -> HostResult<Option<PropertyValue>> {
        let state = self.state.lock();
        let key = state.loaded_record_key(handle)?;
        let record = &state.assets[&key];
        if let Some(value) = record.properties.get(name) {
            return Ok(Some(value.clone()));
        }
        // Properties inherited from the native parent read as class defaults.
        if state
            .native_decl_for(record)
            .map(|d| d.properties.iter().any(|p| p == name))
            .unwrap_or(false)
        {
            return Ok(Some(PropertyValue::text("<class default>")));
        }
        Ok(None)
    }

    fn collect_garbage(&self) {
        debug!("collect_garbage");
    }

    fn drain_deferred_work(&self) -> HostResult<bool> {
        let mut state = self.state.lock();
        state.deferred = 0;
        Ok(true)
    }
}

/// Textual export of a property value, in the host's `Field="path"` form.
fn render_export_text(value: &PropertyValue) -> String {
    fn object_path(path: &AssetPath) -> String {
        // Exports carry the object suffix: /Game/X/T_Icon.T_Icon
        if path.as_str().rsplit('/').next().map(|s| s.contains('.')).unwrap_or(false) {
            path.as_str().to_string()
        } else {
            format!("{}.{}", path.as_str(), path.short_name())
        }
    }
    match value {
        PropertyValue::ObjectRef { path } => format!("\"{}\"", object_path(path)),
        PropertyValue::Text { value } => format!("\"{}\"", value),
        PropertyValue::Bool { value } => value.to_string(),
        PropertyValue::Number { value } => value.to_string(),
        PropertyValue::List { items } => {
            let inner: Vec<String> = items.iter().map(render_export_text).collect();
            format!("({})", inner.join(","))
        }
        PropertyValue::Struct { fields } => {
            let inner: Vec<String> = fields
                .iter()
                .map(|(name, v)| format!("{}={}", name, render_export_text(v)))
                .collect();
            format!("({})", inner.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Graph, Node, Pin, Variable};

    fn node(title: &str) -> Node {
        Node {
            title: title.into(),
            target_class: None,
            struct_type: None,
            binding_owner: None,
            pins: vec![],
            stale: false,
        }
    }

    fn host_with(assets: Vec<AssetRecord>) -> MemoryHost {
        let host = MemoryHost::new();
        for a in assets {
            host.insert_asset(a);
        }
        host
    }

    #[test]
    fn load_cascades_through_references() {
        let mut a = AssetRecord::new("/Game/A");
        a.references.push("/Game/B".into());
        let b = AssetRecord::new("/Game/B");
        let host = host_with(vec![a, b]);

        host.load_asset(&"/Game/A".into()).unwrap().unwrap();
        assert!(host.is_loaded(&"/Game/B".into()));
        assert_eq!(host.deferred_work(), 2);
        assert!(host.drain_deferred_work().unwrap());
        assert_eq!(host.deferred_work(), 0);
    }

    #[test]
    fn load_applies_type_redirects() {
        let mut a = AssetRecord::new("/Game/A");
        a.graphs.push(Graph {
            name: "EventGraph".into(),
            kind: GraphKind::Event,
            nodes: vec![Node {
                struct_type: Some("/Game/Structs/FStatInfo.FStatInfo".into()),
                stale: true,
                ..node("MakeStatInfo")
            }],
        });
        let host = host_with(vec![a]);
        host.add_type_redirect("/Game/Structs/FStatInfo.FStatInfo", "/Script/SLF.StatInfo");

        host.load_asset(&"/Game/A".into()).unwrap().unwrap();
        let record = host.record(&"/Game/A".into()).unwrap();
        assert_eq!(record.graphs[0].nodes[0].struct_type.as_deref(), Some("/Script/SLF.StatInfo"));
        assert!(!record.graphs[0].nodes[0].stale);
    }

    #[test]
    fn reparent_blocked_by_undeclared_interface() {
        let mut a = AssetRecord::new("/Game/A");
        a.interfaces.push("BPI_Thing".into());
        let host = host_with(vec![a]);
        host.declare_native_type(NativeTypeDecl { name: "/Script/SLF.Thing".into(), ..Default::default() });

        let handle = host.load_asset(&"/Game/A".into()).unwrap().unwrap();
        let ty = NativeTypeRef::parse("/Script/SLF.Thing").unwrap();
        assert!(!host.reparent(&handle, &ty).unwrap());

        host.remove_implemented_interfaces(&handle).unwrap();
        assert!(host.reparent(&handle, &ty).unwrap());
        assert_eq!(
            host.parent_class(&handle).unwrap(),
            Some(ClassRef::native(ty))
        );
    }

    #[test]
    fn keep_variables_clear_spares_anim_graph() {
        let mut a = AssetRecord::new("/Game/ABP_Thing");
        a.variables.push(Variable { name: "Speed".into(), var_type: "float".into() });
        a.graphs.push(Graph { name: "EventGraph".into(), kind: GraphKind::Event, nodes: vec![node("Tick")] });
        a.graphs.push(Graph { name: "AnimGraph".into(), kind: GraphKind::AnimGraph, nodes: vec![node("StateMachine")] });
        let host = host_with(vec![a]);

        let handle = host.load_asset(&"/Game/ABP_Thing".into()).unwrap().unwrap();
        host.clear_graphs_keep_variables(&handle, true).unwrap();

        let record = host.record(&"/Game/ABP_Thing".into()).unwrap();
        assert_eq!(record.graphs[0].nodes.len(), 0);
        assert_eq!(record.graphs[1].nodes.len(), 1);
        assert_eq!(record.variables.len(), 1);
    }

    #[test]
    fn full_clear_removes_variables_too() {
        let mut a = AssetRecord::new("/Game/AC_Thing");
        a.variables.push(Variable { name: "Count".into(), var_type: "int".into() });
        a.graphs.push(Graph { name: "EventGraph".into(), kind: GraphKind::Event, nodes: vec![node("Tick")] });
        let host = host_with(vec![a]);

        let handle = host.load_asset(&"/Game/AC_Thing".into()).unwrap().unwrap();
        host.clear_all_graph_logic(&handle, true).unwrap();

        let record = host.record(&"/Game/AC_Thing".into()).unwrap();
        assert_eq!(record.node_count(), 0);
        assert!(record.variables.is_empty());
    }

    #[test]
    fn migrate_struct_type_counts_pins_nodes_and_vars() {
        let old = "/Game/Structs/FStatInfo.FStatInfo";
        let mut a = AssetRecord::new("/Game/B_Stat");
        a.variables.push(Variable { name: "Info".into(), var_type: old.into() });
        a.graphs.push(Graph {
            name: "EventGraph".into(),
            kind: GraphKind::Event,
            nodes: vec![Node {
                struct_type: Some(old.into()),
                pins: vec![Pin { name: "Value".into(), struct_type: Some(old.into()) }],
                ..node("BreakStatInfo")
            }],
        });
        let host = host_with(vec![a]);

        let handle = host.load_asset(&"/Game/B_Stat".into()).unwrap().unwrap();
        let new = NativeTypeRef::parse("/Script/SLF.StatInfo").unwrap();
        assert_eq!(host.migrate_struct_type(&handle, old, &new).unwrap(), 3);
    }

    #[test]
    fn compile_fails_while_legacy_struct_missing_without_redirect() {
        let mut a = AssetRecord::new("/Game/B_Stat");
        a.graphs.push(Graph {
            name: "EventGraph".into(),
            kind: GraphKind::Event,
            nodes: vec![Node { struct_type: Some("/Game/Structs/FGone.FGone".into()), ..node("Make") }],
        });
        let host = host_with(vec![a]);

        let handle = host.load_asset(&"/Game/B_Stat".into()).unwrap().unwrap();
        assert!(!host.compile_and_save(&handle).unwrap());

        host.add_type_redirect("/Game/Structs/FGone.FGone", "/Script/SLF.Gone");
        assert!(host.compile_and_save(&handle).unwrap());
    }

    #[test]
    fn set_property_refuses_unknown_names() {
        let mut a = AssetRecord::new("/Game/DA_Apple");
        a.properties.insert("IconSmall".into(), PropertyValue::object("/Game/T_Apple"));
        let host = host_with(vec![a]);

        let handle = host.load_asset(&"/Game/DA_Apple".into()).unwrap().unwrap();
        assert!(host.set_property(&handle, "IconSmall", PropertyValue::object("/Game/T_Other")).unwrap());
        assert!(!host.set_property(&handle, "NoSuchProperty", PropertyValue::text("x")).unwrap());
    }

    #[test]
    fn export_text_renders_struct_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("IconSmall".to_string(), PropertyValue::object("/Game/Tex/T_Apple"));
        let mut a = AssetRecord::new("/Game/DA_Apple");
        a.properties.insert("ItemInformation".into(), PropertyValue::Struct { fields });
        let host = host_with(vec![a]);

        let handle = host.load_asset(&"/Game/DA_Apple".into()).unwrap().unwrap();
        let text = host.export_property_text(&handle, "ItemInformation").unwrap().unwrap();
        assert_eq!(text, "(IconSmall=\"/Game/Tex/T_Apple.T_Apple\")");
    }

    #[test]
    fn injected_faults_surface_as_host_errors() {
        let host = host_with(vec![AssetRecord::new("/Game/B_Bad")]);
        host.inject_fault("B_Bad");
        assert!(host.load_asset(&"/Game/B_Bad".into()).is_err());
    }
}
