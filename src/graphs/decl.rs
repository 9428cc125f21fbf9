//! Node declarations: the mutable cells the builders configure and the
//! immutable form the validator freezes them into.
//!
//! A [`DeclCell`] is shared (`Arc`) between the builder that declared it and
//! every `Graph` view or binding that references it, so fluent configuration
//! through any handle is visible to all of them; reference identity is the
//! declaration's identity. [`Graph::build`](crate::graphs::Graph) snapshots
//! the cells into [`Decl`]s, after which nothing can change.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::name::{Name, NameRef};
use crate::node::DynNode;
use crate::types::{AnyValue, ConstId, DeclId, Value};

use super::info::NodeInfo;

/// What occupies one argument slot of a node: another declaration's output,
/// a named input supplied at run time, or a constant.
///
/// Obtained by converting a `&Graph<T>` or `&Name<T>`, or via
/// [`Binding::value`] for constants.
#[derive(Clone)]
pub struct Binding {
    pub(crate) kind: BindingKind,
}

#[derive(Clone)]
pub(crate) enum BindingKind {
    Graph(Arc<DeclCell>),
    Input(NameRef),
    Value(ConstBinding),
}

#[derive(Clone)]
pub(crate) struct ConstBinding {
    pub(crate) id: ConstId,
    pub(crate) value: AnyValue,
}

impl Binding {
    /// Bind an argument slot to a precomputed constant.
    pub fn value<T: Value>(value: T) -> Self {
        Self {
            kind: BindingKind::Value(ConstBinding {
                id: ConstId::fresh(),
                value: AnyValue::new(value),
            }),
        }
    }

    pub(crate) fn graph(cell: Arc<DeclCell>) -> Self {
        Self {
            kind: BindingKind::Graph(cell),
        }
    }
}

impl<T: Value> From<&Name<T>> for Binding {
    fn from(name: &Name<T>) -> Self {
        Self {
            kind: BindingKind::Input(NameRef::from(name)),
        }
    }
}

impl<T: Value> From<Name<T>> for Binding {
    fn from(name: Name<T>) -> Self {
        Self {
            kind: BindingKind::Input(NameRef::from(name)),
        }
    }
}

/// Configuration of one declaration, adjusted by the fluent calls until the
/// graph is built.
#[derive(Clone, Default)]
pub(crate) struct DeclConfig {
    pub(crate) bindings: Vec<Binding>,
    pub(crate) after: Vec<Arc<DeclCell>>,
    pub(crate) fallback: Option<AnyValue>,
    pub(crate) name: Option<String>,
}

/// A node declaration while the graph is still being assembled.
pub(crate) struct DeclCell {
    pub(crate) id: DeclId,
    pub(crate) node: Arc<dyn DynNode>,
    pub(crate) config: RwLock<DeclConfig>,
}

impl DeclCell {
    pub(crate) fn new(node: Arc<dyn DynNode>) -> Arc<Self> {
        Arc::new(Self {
            id: DeclId::fresh(),
            node,
            config: RwLock::new(DeclConfig::default()),
        })
    }

    /// Display name used in every diagnostic; `"unnamed"` until `.named()`.
    pub(crate) fn display_name(&self) -> String {
        self.config
            .read()
            .name
            .clone()
            .unwrap_or_else(|| "unnamed".to_string())
    }
}

/// An argument slot of a frozen declaration.
pub(crate) enum FrozenBinding {
    Graph(Arc<Decl>),
    Input(NameRef),
    Value(AnyValue),
}

/// An immutable node declaration inside a built graph: the node, its ordered
/// bindings, its happens-after predecessors, and its diagnostics view.
pub(crate) struct Decl {
    pub(crate) id: DeclId,
    pub(crate) node: Arc<dyn DynNode>,
    pub(crate) bindings: Vec<FrozenBinding>,
    pub(crate) after: Vec<Arc<Decl>>,
    pub(crate) fallback: Option<AnyValue>,
    pub(crate) name: Option<String>,
    pub(crate) info: NodeInfo,
}

impl Decl {
    pub(crate) fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}
