//! Graph traversal: per-run state, scheduling, execution contexts, and
//! run-time failure types.
//!
//! The scheduler is callback-driven: every declaration becomes one shared
//! future, successors chain onto their predecessors' futures, and node
//! invocations are posted to the caller-supplied [`TaskExecutor`]. A
//! single-threaded context yields strictly sequential execution; a
//! multi-threaded one runs independent branches in parallel. Memoization
//! guarantees each declaration is invoked at most once per run.

mod errors;
mod executor;
mod state;

pub use errors::{CallInfo, ExecutionError, GraphError};
pub use executor::{InlineExecutor, SpawnExecutor, TaskExecutor};

pub(crate) use state::{resolve, TraverseState};
