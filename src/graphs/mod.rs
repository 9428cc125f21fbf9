//! Graph declaration and validation.
//!
//! This module is the declarative half of the engine: [`graph`] and [`call`]
//! open declarations, the fluent [`Graph`] methods wire bindings, ordering
//! edges, fallbacks, and names, and [`GraphBuilder::build`] validates the
//! whole structure (single sink, matching arities, declared inputs, binding
//! types, no cycles) before freezing it into an immutable, shareable
//! [`Graph`].
//!
//! # Core Concepts
//!
//! - **Node declaration**: a node plus its bindings, happens-after edges,
//!   optional fallback, and display name
//! - **Binding**: what fills an argument slot: another graph's output, a
//!   [`Name`](crate::name::Name), or a constant
//! - **Sink**: the single declaration nothing else depends on; its value is
//!   the graph's output
//! - **Standalone graphs**: `call(node)` yields a `Graph` directly, so
//!   sub-graphs nest by value
//!
//! # Quick Start
//!
//! ```
//! use async_trait::async_trait;
//! use rill::graphs::graph;
//! use rill::name::Name;
//! use rill::node::{Node, NodeResult};
//!
//! struct Greet;
//!
//! #[async_trait]
//! impl Node<(String,)> for Greet {
//!     type Out = String;
//!     async fn run(&self, args: (String,)) -> NodeResult<String> {
//!         let (name,) = args;
//!         Ok(format!("hello {name}!"))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let who: Name<String> = Name::named("who");
//! let mut builder = graph::<String>().inputs([&who]);
//! let _greet = builder.call(Greet).with((&who,)).named("greet");
//! let built = builder.build().expect("valid graph");
//!
//! let out = built
//!     .bind(&who, "petter".to_string())
//!     .run(rill::traverse::InlineExecutor)
//!     .await
//!     .unwrap();
//! assert_eq!(out, "hello petter!");
//! # }
//! ```

pub(crate) mod decl;

mod builder;
mod graph;
mod info;
mod validation;

pub use builder::{call, graph, AfterSet, Bindings, GraphBuilder, Predecessors};
pub use decl::Binding;
pub use graph::{Graph, GraphFuture, RunOptions};
pub use info::{NodeInfo, NodeInfoKind};
pub use validation::BuildError;
