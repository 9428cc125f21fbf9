//! Fluent entry points for declaring graphs.
//!
//! Two equivalent ways in:
//!
//! - [`graph::<R>()`](graph) opens a [`GraphBuilder`] that accumulates
//!   declarations, declares required inputs, and validates everything at
//!   [`build`](GraphBuilder::build);
//! - [`call(node)`](call) declares a standalone single-node graph that can be
//!   configured, composed into other graphs, and run directly.
//!
//! Both return [`Graph`] views over shared declaration cells, so a
//! declaration referenced from several places is one declaration: naming it
//! through any handle renames it everywhere, and the scheduler runs it once.
//!
//! # Examples
//!
//! ```
//! use async_trait::async_trait;
//! use rill::graphs::{call, graph};
//! use rill::node::{Node, NodeResult};
//!
//! struct Hi;
//!
//! #[async_trait]
//! impl Node<()> for Hi {
//!     type Out = String;
//!     async fn run(&self, _args: ()) -> NodeResult<String> {
//!         Ok("hi there!".to_string())
//!     }
//! }
//!
//! struct Len;
//!
//! #[async_trait]
//! impl Node<(String,)> for Len {
//!     type Out = usize;
//!     async fn run(&self, args: (String,)) -> NodeResult<usize> {
//!         Ok(args.0.len())
//!     }
//! }
//!
//! // Builder form: declarations validated by build().
//! let mut builder = graph::<usize>();
//! let first = builder.call(Hi).named("first");
//! let _second = builder.call(Len).with((&first,)).named("second");
//! let built = builder.build().expect("valid graph");
//!
//! // Standalone form: `call` produces a directly composable Graph.
//! let standalone = call(Len).with((&call(Hi),));
//! # let _ = (built, standalone);
//! ```

use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::name::NameRef;
use crate::node::{ArgList, Node, NodeAdapter};
use crate::types::Value;

use super::decl::{Binding, DeclCell};
use super::graph::Graph;
use super::validation::{validate_and_freeze, BuildError};

/// Begin a graph whose sink produces an `R`.
pub fn graph<R: Value>() -> GraphBuilder<R> {
    GraphBuilder {
        inputs: Vec::new(),
        decls: Vec::new(),
        _out: PhantomData,
    }
}

/// Declare a standalone single-node graph.
///
/// The result is a self-contained [`Graph`] that can be configured with
/// [`with`](Graph::with) / [`after`](Graph::after) / [`named`](Graph::named)
/// / [`fallback`](Graph::fallback), used as a binding inside other graphs,
/// or run directly (validation then happens lazily at run time).
pub fn call<Args, N>(node: N) -> Graph<N::Out>
where
    Args: ArgList,
    N: Node<Args>,
{
    Graph::from_cell(DeclCell::new(Arc::new(NodeAdapter::<N, Args>::new(node))))
}

/// Accumulates node declarations and required inputs, then validates and
/// freezes them into an immutable [`Graph`].
pub struct GraphBuilder<R> {
    inputs: Vec<NameRef>,
    decls: Vec<Arc<DeclCell>>,
    _out: PhantomData<fn() -> R>,
}

impl<R: Value> GraphBuilder<R> {
    /// Declare the external inputs the graph requires at run time.
    ///
    /// Heterogeneously-typed names can be mixed by converting them first:
    /// `.inputs([NameRef::from(&a), NameRef::from(&b)])`.
    #[must_use]
    pub fn inputs<I>(mut self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NameRef>,
    {
        self.inputs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declare a node. The returned [`Graph`] view shares the declaration,
    /// so configuring it (bindings, ordering edges, name, fallback)
    /// configures this builder's declaration.
    pub fn call<Args, N>(&mut self, node: N) -> Graph<N::Out>
    where
        Args: ArgList,
        N: Node<Args>,
    {
        let cell = DeclCell::new(Arc::new(NodeAdapter::<N, Args>::new(node)));
        self.decls.push(Arc::clone(&cell));
        Graph::from_cell(cell)
    }

    /// Validate the declarations and freeze them into an immutable graph.
    ///
    /// Checks, in order: non-emptiness, argument counts, declared inputs,
    /// binding types, sink uniqueness, acyclicity. The first violation is
    /// reported.
    pub fn build(self) -> Result<Graph<R>, BuildError> {
        let validated = validate_and_freeze(
            &self.decls,
            Some(&self.inputs),
            TypeId::of::<R>(),
            std::any::type_name::<R>(),
        )?;
        Ok(Graph::built(validated.sink_cell, self.inputs, validated.sink))
    }
}

/// An ordered argument binding list, as accepted by [`Graph::with`].
///
/// Implemented for tuples (up to arity four) of anything convertible into a
/// [`Binding`] (`&Graph<T>`, `&Name<T>`, or [`Binding::value`] constants),
/// and for `Vec<Binding>` when the shape is only known at run time.
pub trait Bindings {
    /// Flatten into the ordered binding list.
    fn into_bindings(self) -> Vec<Binding>;
}

impl Bindings for () {
    fn into_bindings(self) -> Vec<Binding> {
        Vec::new()
    }
}

impl Bindings for Vec<Binding> {
    fn into_bindings(self) -> Vec<Binding> {
        self
    }
}

macro_rules! bindings_tuple {
    ($($b:ident : $idx:tt),+) => {
        impl<$($b: Into<Binding>),+> Bindings for ($($b,)+) {
            fn into_bindings(self) -> Vec<Binding> {
                vec![$(self.$idx.into()),+]
            }
        }
    };
}

bindings_tuple!(B0: 0);
bindings_tuple!(B0: 0, B1: 1);
bindings_tuple!(B0: 0, B1: 1, B2: 2);
bindings_tuple!(B0: 0, B1: 1, B2: 2, B3: 3);

/// An erased set of happens-after predecessors, produced by
/// [`Predecessors`] conversions.
pub struct AfterSet {
    pub(crate) cells: Vec<Arc<DeclCell>>,
}

/// Happens-after predecessor lists, as accepted by [`Graph::after`]: a
/// single `&Graph<T>` or a tuple of up to four of them.
pub trait Predecessors {
    /// Flatten into the predecessor set.
    fn into_after(self) -> AfterSet;
}

impl<T: Value> Predecessors for &Graph<T> {
    fn into_after(self) -> AfterSet {
        AfterSet {
            cells: vec![Arc::clone(self.sink_cell())],
        }
    }
}

macro_rules! predecessors_tuple {
    ($($t:ident : $idx:tt),+) => {
        impl<'g, $($t: Value),+> Predecessors for ($(&'g Graph<$t>,)+) {
            fn into_after(self) -> AfterSet {
                AfterSet {
                    cells: vec![$(Arc::clone(self.$idx.sink_cell())),+],
                }
            }
        }
    };
}

predecessors_tuple!(T0: 0);
predecessors_tuple!(T0: 0, T1: 1);
predecessors_tuple!(T0: 0, T1: 1, T2: 2);
predecessors_tuple!(T0: 0, T1: 1, T2: 2, T3: 3);
