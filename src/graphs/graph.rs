//! The graph value: a configurable declaration view that freezes into an
//! immutable, shareable execution unit.

use std::any::TypeId;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use rustc_hash::FxHashMap;

use crate::name::{Name, NameRef};
use crate::traverse::{resolve, GraphError, TaskExecutor, TraverseState};
use crate::types::{AnyValue, NameId, Value};

use super::builder::{Bindings, Predecessors};
use super::decl::{Binding, Decl, DeclCell};
use super::info::NodeInfo;
use super::validation::validate_and_freeze;

/// Per-run knobs for [`Graph::run_with`].
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// When `true` (the default), a node failure is wrapped into a
    /// [`ExecutionError`](crate::traverse::ExecutionError) carrying the
    /// failing node, its argument values, and the completed-call log. When
    /// `false`, the raw cause is surfaced instead, which is useful in tests
    /// assert on original causes.
    pub wrap_failures: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            wrap_failures: true,
        }
    }
}

/// A graph of asynchronous nodes producing an `R`.
///
/// A `Graph` is both a reusable building block (bind it into another graph's
/// argument slot) and an executable unit. Before `build()` it is a *view*
/// over shared declaration cells: the fluent configuration methods mutate
/// the underlying declaration, so every handle to it observes the change.
/// After `build()` the declaration tree is frozen; [`bind`](Self::bind)
/// layers run-time input values over the shared immutable structure and
/// [`run`](Self::run) starts an independent traversal.
pub struct Graph<R> {
    sink: Arc<DeclCell>,
    inputs: Vec<NameRef>,
    bound: FxHashMap<NameId, AnyValue>,
    frozen: Option<Arc<Decl>>,
    _out: PhantomData<fn() -> R>,
}

impl<R> std::fmt::Debug for Graph<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph").finish_non_exhaustive()
    }
}

impl<R> Clone for Graph<R> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            inputs: self.inputs.clone(),
            bound: self.bound.clone(),
            frozen: self.frozen.clone(),
            _out: PhantomData,
        }
    }
}

impl<R: Value> Graph<R> {
    pub(crate) fn from_cell(cell: Arc<DeclCell>) -> Self {
        Self {
            sink: cell,
            inputs: Vec::new(),
            bound: FxHashMap::default(),
            frozen: None,
            _out: PhantomData,
        }
    }

    pub(crate) fn built(sink: Arc<DeclCell>, inputs: Vec<NameRef>, frozen: Arc<Decl>) -> Self {
        Self {
            sink,
            inputs,
            bound: FxHashMap::default(),
            frozen: Some(frozen),
            _out: PhantomData,
        }
    }

    pub(crate) fn sink_cell(&self) -> &Arc<DeclCell> {
        &self.sink
    }

    /// Set this node's ordered argument bindings. The count must match the
    /// node's arity; that is checked when the graph is built or run.
    #[must_use]
    pub fn with(self, bindings: impl Bindings) -> Self {
        self.sink.config.write().bindings = bindings.into_bindings();
        self
    }

    /// Add happens-after predecessors: ordering edges with no data flow.
    #[must_use]
    pub fn after(self, predecessors: impl Predecessors) -> Self {
        self.sink
            .config
            .write()
            .after
            .extend(predecessors.into_after().cells);
        self
    }

    /// Substitute `value` when this node's own invocation fails, instead of
    /// failing the graph. Failures of this node's *dependencies* are not
    /// covered and still propagate.
    #[must_use]
    pub fn fallback(self, value: R) -> Self {
        self.sink.config.write().fallback = Some(AnyValue::new(value));
        self
    }

    /// Set the display name used in diagnostics. Defaults to `"unnamed"`.
    #[must_use]
    pub fn named(self, label: impl Into<String>) -> Self {
        self.sink.config.write().name = Some(label.into());
        self
    }

    /// Supply a value for a named input, returning a new graph with the
    /// binding stored. The receiver is unchanged, so one built graph can be
    /// bound differently for concurrent runs.
    #[must_use]
    pub fn bind<T: Value>(&self, name: &Name<T>, value: T) -> Self {
        let mut bound = self.bound.clone();
        bound.insert(name.id(), AnyValue::new(value));
        Self {
            sink: Arc::clone(&self.sink),
            inputs: self.inputs.clone(),
            bound,
            frozen: self.frozen.clone(),
            _out: PhantomData,
        }
    }

    /// Execute the graph with failure wrapping on, dispatching node
    /// invocations through `executor`.
    ///
    /// Returns immediately with a future of the sink's value. A graph that
    /// was never `build()`-validated (standalone form) is validated here;
    /// structural problems fail the returned future with the
    /// [`BuildError`](crate::graphs::BuildError).
    pub fn run<E: TaskExecutor>(&self, executor: E) -> GraphFuture<R> {
        self.run_with(executor, RunOptions::default())
    }

    /// [`run`](Self::run) with explicit [`RunOptions`].
    pub fn run_with<E: TaskExecutor>(&self, executor: E, options: RunOptions) -> GraphFuture<R> {
        let sink = match &self.frozen {
            Some(frozen) => Arc::clone(frozen),
            None => {
                let validated = validate_and_freeze(
                    std::slice::from_ref(&self.sink),
                    None,
                    TypeId::of::<R>(),
                    std::any::type_name::<R>(),
                );
                match validated {
                    Ok(validated) => validated.sink,
                    Err(err) => return GraphFuture::failed(GraphError::Build(err)),
                }
            }
        };

        let state = TraverseState::new(self.bound.clone(), Arc::new(executor), options.wrap_failures);
        let root = resolve(&sink, &state);
        let inner = async move {
            let value = root.await?;
            value.downcast::<R>().ok_or_else(|| {
                GraphError::Internal(format!(
                    "sink resolved to a {}, but the graph was declared to produce {}",
                    value.type_name(),
                    std::any::type_name::<R>()
                ))
            })
        }
        .boxed();
        GraphFuture { inner }
    }

    /// The external inputs this graph requires, as declared via
    /// [`inputs`](crate::graphs::GraphBuilder::inputs).
    pub fn required_inputs(&self) -> &[NameRef] {
        &self.inputs
    }

    /// Walkable metadata view of the graph, rooted at the sink. Every
    /// declared node is reachable through
    /// [`predecessors`](NodeInfo::predecessors); external visualizers
    /// consume this.
    pub fn info(&self) -> NodeInfo {
        match &self.frozen {
            Some(frozen) => frozen.info.clone(),
            None => NodeInfo::from_cell(&self.sink),
        }
    }
}

impl<'g, T: Value> From<&'g Graph<T>> for Binding {
    fn from(graph: &'g Graph<T>) -> Self {
        Binding::graph(Arc::clone(graph.sink_cell()))
    }
}

impl<T: Value> From<Graph<T>> for Binding {
    fn from(graph: Graph<T>) -> Self {
        Binding::graph(Arc::clone(graph.sink_cell()))
    }
}

/// Future of a graph run's sink value.
///
/// Resolves with the sink's value, or with the [`GraphError`] describing the
/// first failure. `GraphFuture` is `Unpin`, so it composes directly with
/// `tokio::select!`, `tokio::time::timeout`, and friends.
pub struct GraphFuture<R> {
    inner: BoxFuture<'static, Result<R, GraphError>>,
}

impl<R: Send + 'static> GraphFuture<R> {
    pub(crate) fn failed(err: GraphError) -> Self {
        Self {
            inner: futures_util::future::ready(Err(err)).boxed(),
        }
    }
}

impl<R> Future for GraphFuture<R> {
    type Output = Result<R, GraphError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.as_mut().poll(cx)
    }
}
