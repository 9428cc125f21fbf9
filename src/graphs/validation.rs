//! Structural validation and freezing of declared graphs.
//!
//! Runs at [`GraphBuilder::build`](super::GraphBuilder::build) (and lazily
//! for standalone graphs at run time). The checks are ordered and
//! deterministic; the first violation is reported, naming the offending
//! declarations by display name.

use std::any::TypeId;
use std::collections::VecDeque;
use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::name::NameRef;
use crate::types::{DeclId, NameId};

use super::decl::{BindingKind, Decl, DeclCell, FrozenBinding};
use super::info::NodeInfo;

/// A structural problem detected while building a graph.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum BuildError {
    /// No nodes were declared.
    #[error("Empty graph")]
    #[diagnostic(code(rill::build::empty_graph))]
    EmptyGraph,

    /// A declaration's binding list does not match its node's arity.
    #[error("Incorrect argument count for node '{node}': expected {expected}, got {actual}")]
    #[diagnostic(
        code(rill::build::arity),
        help("bind exactly as many arguments with `.with(...)` as the node declares")
    )]
    ArityMismatch {
        node: String,
        expected: usize,
        actual: usize,
    },

    /// A named-input binding references a name that was never declared via
    /// `inputs(...)`.
    #[error("node '{node}' is bound to input '{input}', which was not declared via inputs(...)")]
    #[diagnostic(code(rill::build::missing_input))]
    MissingInput { node: String, input: String },

    /// A binding produces a different type than the node's argument slot
    /// declares.
    #[error("node '{node}' argument {index} expects {expected} but is bound to a {found}")]
    #[diagnostic(code(rill::build::type_mismatch))]
    TypeMismatch {
        node: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// More than one declaration has no dependents.
    #[error("Multiple sinks: {}", .names.join(", "))]
    #[diagnostic(
        code(rill::build::multiple_sinks),
        help("a graph has exactly one output; connect the loose ends or split the graph")
    )]
    MultipleSinks { names: Vec<String> },

    /// The predecessor relation contains a cycle.
    #[error("cycle detected: {}", .path.join(" -> "))]
    #[diagnostic(code(rill::build::cycle))]
    CycleDetected { path: Vec<String> },

    /// The sink's output type does not match the type the graph was declared
    /// to produce.
    #[error("sink '{node}' produces {found}, but the graph was declared to produce {expected}")]
    #[diagnostic(code(rill::build::sink_type))]
    SinkType {
        node: String,
        expected: &'static str,
        found: &'static str,
    },
}

pub(crate) struct Validated {
    pub(crate) sink_cell: Arc<DeclCell>,
    pub(crate) sink: Arc<Decl>,
}

/// Validate the declarations reachable from `roots` and freeze them into an
/// immutable declaration tree rooted at the unique sink.
///
/// `declared_inputs` is `Some` for builder-form graphs, where named-input
/// bindings must have been declared; standalone graphs skip that check and
/// fail at run time if a name is unbound.
pub(crate) fn validate_and_freeze(
    roots: &[Arc<DeclCell>],
    declared_inputs: Option<&[NameRef]>,
    sink_type: TypeId,
    sink_type_name: &'static str,
) -> Result<Validated, BuildError> {
    let cells = collect_closure(roots);

    if cells.is_empty() {
        return Err(BuildError::EmptyGraph);
    }

    for cell in &cells {
        let actual = cell.config.read().bindings.len();
        let expected = cell.node.arity();
        if actual != expected {
            return Err(BuildError::ArityMismatch {
                node: cell.display_name(),
                expected,
                actual,
            });
        }
    }

    if let Some(inputs) = declared_inputs {
        let declared: FxHashSet<NameId> = inputs.iter().map(NameRef::id).collect();
        for cell in &cells {
            for binding in &cell.config.read().bindings {
                if let BindingKind::Input(name) = &binding.kind {
                    if !declared.contains(&name.id()) {
                        return Err(BuildError::MissingInput {
                            node: cell.display_name(),
                            input: name.label().to_string(),
                        });
                    }
                }
            }
        }
    }

    for cell in &cells {
        let expected_types = cell.node.arg_types();
        let expected_names = cell.node.arg_type_names();
        for (index, binding) in cell.config.read().bindings.iter().enumerate() {
            let (found_type, found_name) = match &binding.kind {
                BindingKind::Graph(dep) => (dep.node.out_type(), dep.node.out_type_name()),
                BindingKind::Input(name) => (name.value_type_id(), name.type_name()),
                BindingKind::Value(constant) => (
                    constant.value.value_type_id(),
                    constant.value.type_name(),
                ),
            };
            if found_type != expected_types[index] {
                return Err(BuildError::TypeMismatch {
                    node: cell.display_name(),
                    index,
                    expected: expected_names[index],
                    found: found_name,
                });
            }
        }
    }

    let mut has_dependent: FxHashSet<DeclId> = FxHashSet::default();
    for cell in &cells {
        let config = cell.config.read();
        for binding in &config.bindings {
            if let BindingKind::Graph(dep) = &binding.kind {
                has_dependent.insert(dep.id);
            }
        }
        for dep in &config.after {
            has_dependent.insert(dep.id);
        }
    }
    let sinks: Vec<Arc<DeclCell>> = cells
        .iter()
        .filter(|cell| !has_dependent.contains(&cell.id))
        .cloned()
        .collect();
    if sinks.len() > 1 {
        return Err(BuildError::MultipleSinks {
            names: sinks.iter().map(|cell| cell.display_name()).collect(),
        });
    }

    if let Some(path) = find_cycle(&cells) {
        return Err(BuildError::CycleDetected { path });
    }

    // An acyclic non-empty graph has a sink, and uniqueness was checked.
    let sink_cell = match sinks.into_iter().next() {
        Some(cell) => cell,
        None => return Err(BuildError::EmptyGraph),
    };

    if sink_cell.node.out_type() != sink_type {
        return Err(BuildError::SinkType {
            node: sink_cell.display_name(),
            expected: sink_type_name,
            found: sink_cell.node.out_type_name(),
        });
    }

    let mut memo: FxHashMap<DeclId, Arc<Decl>> = FxHashMap::default();
    let sink = freeze(&sink_cell, &mut memo);
    Ok(Validated { sink_cell, sink })
}

/// Breadth-first closure over bindings and happens-after edges, preserving
/// first-seen order so error messages are deterministic.
fn collect_closure(roots: &[Arc<DeclCell>]) -> Vec<Arc<DeclCell>> {
    let mut order: Vec<Arc<DeclCell>> = Vec::new();
    let mut seen: FxHashSet<DeclId> = FxHashSet::default();
    let mut queue: VecDeque<Arc<DeclCell>> = roots.iter().cloned().collect();

    while let Some(cell) = queue.pop_front() {
        if !seen.insert(cell.id) {
            continue;
        }
        let config = cell.config.read();
        for binding in &config.bindings {
            if let BindingKind::Graph(dep) = &binding.kind {
                queue.push_back(Arc::clone(dep));
            }
        }
        for dep in &config.after {
            queue.push_back(Arc::clone(dep));
        }
        drop(config);
        order.push(cell);
    }
    order
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    Gray,
    Black,
}

/// Depth-first search over the predecessor relation (bindings plus
/// happens-after). Returns one representative cycle as display names,
/// `a -> b -> ... -> a`.
fn find_cycle(cells: &[Arc<DeclCell>]) -> Option<Vec<String>> {
    let mut colors: FxHashMap<DeclId, Color> = FxHashMap::default();
    let mut stack: Vec<(DeclId, String)> = Vec::new();
    for cell in cells {
        if colors.contains_key(&cell.id) {
            continue;
        }
        if let Some(path) = visit(cell, &mut colors, &mut stack) {
            return Some(path);
        }
    }
    None
}

fn visit(
    cell: &Arc<DeclCell>,
    colors: &mut FxHashMap<DeclId, Color>,
    stack: &mut Vec<(DeclId, String)>,
) -> Option<Vec<String>> {
    colors.insert(cell.id, Color::Gray);
    stack.push((cell.id, cell.display_name()));

    let preds: Vec<Arc<DeclCell>> = {
        let config = cell.config.read();
        config
            .bindings
            .iter()
            .filter_map(|binding| match &binding.kind {
                BindingKind::Graph(dep) => Some(Arc::clone(dep)),
                _ => None,
            })
            .chain(config.after.iter().cloned())
            .collect()
    };

    for pred in preds {
        match colors.get(&pred.id) {
            Some(Color::Gray) => {
                let start = stack
                    .iter()
                    .position(|(id, _)| *id == pred.id)
                    .unwrap_or(0);
                let mut path: Vec<String> =
                    stack[start..].iter().map(|(_, name)| name.clone()).collect();
                path.push(pred.display_name());
                return Some(path);
            }
            Some(Color::Black) => {}
            None => {
                if let Some(path) = visit(&pred, colors, stack) {
                    return Some(path);
                }
            }
        }
    }

    stack.pop();
    colors.insert(cell.id, Color::Black);
    None
}

/// Snapshot a cell (and, recursively, its predecessors) into the immutable
/// form, building the diagnostics view bottom-up. Callers must have run
/// cycle detection first.
fn freeze(cell: &Arc<DeclCell>, memo: &mut FxHashMap<DeclId, Arc<Decl>>) -> Arc<Decl> {
    if let Some(done) = memo.get(&cell.id) {
        return Arc::clone(done);
    }

    let config = cell.config.read().clone();
    let mut bindings = Vec::with_capacity(config.bindings.len());
    let mut arg_infos = Vec::with_capacity(config.bindings.len());
    for binding in &config.bindings {
        match &binding.kind {
            BindingKind::Graph(dep) => {
                let frozen = freeze(dep, memo);
                arg_infos.push(frozen.info.clone());
                bindings.push(FrozenBinding::Graph(frozen));
            }
            BindingKind::Input(name) => {
                arg_infos.push(NodeInfo::input(name));
                bindings.push(FrozenBinding::Input(name.clone()));
            }
            BindingKind::Value(constant) => {
                arg_infos.push(NodeInfo::parameter(
                    constant.id,
                    format!("{:?}", constant.value),
                ));
                bindings.push(FrozenBinding::Value(constant.value.clone()));
            }
        }
    }
    let after: Vec<Arc<Decl>> = config.after.iter().map(|dep| freeze(dep, memo)).collect();
    let after_infos = after.iter().map(|dep| dep.info.clone()).collect();

    let info = NodeInfo::node(
        cell.id,
        config.name.clone().unwrap_or_else(|| "unnamed".to_string()),
        arg_infos,
        after_infos,
    );
    let decl = Arc::new(Decl {
        id: cell.id,
        node: Arc::clone(&cell.node),
        bindings,
        after,
        fallback: config.fallback,
        name: config.name,
        info,
    });
    memo.insert(cell.id, Arc::clone(&decl));
    decl
}
