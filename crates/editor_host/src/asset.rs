// Asset data model.
//
// This is the shape of a persisted editor object as the migration engine
// sees it: a parent class, owned graphs of nodes with typed pins, member
// variables, implemented interfaces, a component sub-object tree, and a bag
// of reflected properties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{AssetPath, ClassRef, PropertyValue};

/// Kind of graph owned by an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    /// The main event graph.
    Event,
    /// A user-defined function graph.
    Function,
    /// The animation state graph; survives keep-variables clears.
    AnimGraph,
}

/// A typed connection point on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub name: String,
    /// Logical path of a struct type flowing through this pin, if any.
    /// Rewritten in place by redirects and by the direct retyper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub struct_type: Option<String>,
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub title: String,
    /// Class a call node targets (generated `<Name>_C` or native type name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_class: Option<String>,
    /// Struct type a make/break node operates on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub struct_type: Option<String>,
    /// Owner class of a multicast-delegate binding, if this node is a bind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pins: Vec<Pin>,
    /// Set when the node's referenced symbol no longer resolves; cleared by
    /// node reconstruction.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
}

/// A node-and-edge graph inside an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    pub kind: GraphKind,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// A declared member variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Type description; logical struct paths here are rewritten by redirects.
    pub var_type: String,
}

/// One entry of the component sub-object tree (SCS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    pub name: String,
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// A persisted content object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub path: AssetPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<ClassRef>,
    /// Name of the runtime class this asset compiles to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_class: Option<String>,
    #[serde(default)]
    pub graphs: Vec<Graph>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub components: Vec<ComponentNode>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Assets this one references; the host cascade-loads them.
    #[serde(default)]
    pub references: Vec<AssetPath>,
}

impl AssetRecord {
    /// A bare asset with nothing but a path.
    pub fn new(path: impl Into<AssetPath>) -> Self {
        fn inner(path: AssetPath) -> AssetRecord {
            AssetRecord {
                path,
                parent_class: None,
                generated_class: None,
                graphs: Vec::new(),
                variables: Vec::new(),
                interfaces: Vec::new(),
                components: Vec::new(),
                properties: BTreeMap::new(),
                references: Vec::new(),
            }
        }
        inner(path.into())
    }

    pub fn short_name(&self) -> &str {
        self.path.short_name()
    }

    /// Total node count across every graph.
    pub fn node_count(&self) -> usize {
        self.graphs.iter().map(|g| g.nodes.len()).sum()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_count_sums_all_graphs() {
        let mut asset = AssetRecord::new("/Game/B_Thing");
        asset.graphs.push(Graph {
            name: "EventGraph".into(),
            kind: GraphKind::Event,
            nodes: vec![
                Node { title: "BeginPlay".into(), target_class: None, struct_type: None, binding_owner: None, pins: vec![], stale: false },
                Node { title: "PrintString".into(), target_class: None, struct_type: None, binding_owner: None, pins: vec![], stale: false },
            ],
        });
        asset.graphs.push(Graph { name: "DoThing".into(), kind: GraphKind::Function, nodes: vec![] });
        assert_eq!(asset.node_count(), 2);
    }
}
