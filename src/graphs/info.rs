//! Walkable metadata view of a declared graph.
//!
//! [`NodeInfo`] is the read-only snapshot consumed by diagnostics and by
//! external visualizers (see [`crate::dot`]): a display name, a kind tag,
//! the ordered argument infos, and the happens-after predecessors. Equality
//! and hashing follow declaration identity, so two infos describing the same
//! declaration compare equal even across separate snapshots.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::name::NameRef;
use crate::types::{ConstId, DeclId, NameId};

use super::decl::{BindingKind, DeclCell};

/// What a [`NodeInfo`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeInfoKind {
    /// A declared node.
    Node,
    /// A named input supplied at run time.
    Input,
    /// A constant bound directly into an argument slot.
    Parameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum InfoKey {
    Decl(DeclId),
    Input(NameId),
    Const(ConstId),
}

impl InfoKey {
    pub(crate) fn raw(self) -> u64 {
        match self {
            InfoKey::Decl(id) => id.raw(),
            InfoKey::Input(id) => id.raw(),
            InfoKey::Const(id) => id.raw(),
        }
    }
}

/// Metadata snapshot of a node declaration or of one of its bindings.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    key: InfoKey,
    name: String,
    kind: NodeInfoKind,
    arguments: Vec<NodeInfo>,
    after: Vec<NodeInfo>,
}

impl NodeInfo {
    /// Display name (`"unnamed"` when never named).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind tag of this entry.
    pub fn kind(&self) -> NodeInfoKind {
        self.kind
    }

    /// Ordered infos of the declared argument bindings.
    pub fn arguments(&self) -> &[NodeInfo] {
        &self.arguments
    }

    /// Happens-after predecessors (ordering edges with no data flow).
    pub fn happens_after(&self) -> &[NodeInfo] {
        &self.after
    }

    /// All predecessors: arguments followed by happens-after edges.
    pub fn predecessors(&self) -> impl Iterator<Item = &NodeInfo> {
        self.arguments.iter().chain(self.after.iter())
    }

    pub(crate) fn key(&self) -> InfoKey {
        self.key
    }

    pub(crate) fn node(
        id: DeclId,
        name: String,
        arguments: Vec<NodeInfo>,
        after: Vec<NodeInfo>,
    ) -> Self {
        Self {
            key: InfoKey::Decl(id),
            name,
            kind: NodeInfoKind::Node,
            arguments,
            after,
        }
    }

    pub(crate) fn input(name: &NameRef) -> Self {
        Self {
            key: InfoKey::Input(name.id()),
            name: name.label().to_string(),
            kind: NodeInfoKind::Input,
            arguments: Vec::new(),
            after: Vec::new(),
        }
    }

    pub(crate) fn parameter(id: ConstId, repr: String) -> Self {
        Self {
            key: InfoKey::Const(id),
            name: repr,
            kind: NodeInfoKind::Parameter,
            arguments: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Snapshot an unbuilt declaration cell. Declaration cycles (which
    /// validation would reject) are truncated rather than recursed into.
    pub(crate) fn from_cell(cell: &Arc<DeclCell>) -> Self {
        let mut visiting = FxHashSet::default();
        Self::from_cell_guarded(cell, &mut visiting)
    }

    fn from_cell_guarded(cell: &Arc<DeclCell>, visiting: &mut FxHashSet<DeclId>) -> Self {
        if !visiting.insert(cell.id) {
            return Self::node(cell.id, cell.display_name(), Vec::new(), Vec::new());
        }
        let config = cell.config.read().clone();
        let arguments = config
            .bindings
            .iter()
            .map(|binding| match &binding.kind {
                BindingKind::Graph(dep) => Self::from_cell_guarded(dep, visiting),
                BindingKind::Input(name) => Self::input(name),
                BindingKind::Value(constant) => {
                    Self::parameter(constant.id, format!("{:?}", constant.value))
                }
            })
            .collect();
        let after = config
            .after
            .iter()
            .map(|dep| Self::from_cell_guarded(dep, visiting))
            .collect();
        visiting.remove(&cell.id);
        Self::node(cell.id, cell.display_name(), arguments, after)
    }
}

impl PartialEq for NodeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for NodeInfo {}

impl Hash for NodeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
