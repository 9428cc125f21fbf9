//! ```text
//! graph()/call() ─► GraphBuilder ─► build() validates ─► Graph (immutable)
//!                                                        │
//!                               bind(name, value) ───────┤
//!                                                        ▼
//!                                            run(executor) ─► TraverseState
//!                                                              │
//!                                      resolve(): shared future per decl
//!                                                              │
//!                            TaskExecutor ─► Nodes ─► values flow to sink
//!                                                              │
//!                             failure ─► fallback | ExecutionError(+calls)
//! ```
//!
//! Rill is an asynchronous dataflow graph executor: compose a DAG of async
//! nodes with a declarative builder, then run it with correct dependency
//! ordering, argument forwarding, per-node fallbacks, and failure
//! diagnostics that capture the execution context. See `DESIGN.md` in the
//! repository for the architecture notes.

pub mod dot;
pub mod graphs;
pub mod name;
pub mod node;
pub mod traverse;
pub mod types;
