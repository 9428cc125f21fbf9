//! Execution contexts for node invocations.
//!
//! The engine never creates threads of its own; it hands every node
//! invocation to a [`TaskExecutor`]. [`InlineExecutor`] runs the invocation
//! on whatever task is driving the graph future (strictly sequential);
//! [`SpawnExecutor`] posts it onto a tokio runtime, so independent branches
//! run in parallel on multi-threaded runtimes.

use tokio::runtime::Handle;

use crate::node::{NodeError, TaskFuture};

/// Dispatches node invocations.
///
/// `dispatch` receives the invocation as a future and returns the future the
/// scheduler will await in its place. Implementations decide where the work
/// actually runs.
pub trait TaskExecutor: Send + Sync + 'static {
    /// Dispatch one node invocation.
    fn dispatch(&self, task: TaskFuture) -> TaskFuture;
}

/// Runs each invocation inline on the task awaiting the graph future.
///
/// With this executor a graph run is strictly sequential: exactly one node
/// executes at a time, in dependency order.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl TaskExecutor for InlineExecutor {
    fn dispatch(&self, task: TaskFuture) -> TaskFuture {
        task
    }
}

/// Spawns each invocation onto a tokio runtime.
///
/// On a multi-threaded runtime, nodes with no mutual dependency run in
/// parallel. A panicking node is contained by the runtime and surfaces as a
/// failed invocation (so a declared fallback still applies to it).
#[derive(Debug, Clone)]
pub struct SpawnExecutor {
    handle: Handle,
}

impl SpawnExecutor {
    /// Use the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use
    /// [`with_handle`](Self::with_handle) in that case.
    pub fn current() -> Self {
        Self {
            handle: Handle::current(),
        }
    }

    /// Use an explicit runtime handle.
    pub fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl TaskExecutor for SpawnExecutor {
    fn dispatch(&self, task: TaskFuture) -> TaskFuture {
        let joined = self.handle.spawn(task);
        Box::pin(async move {
            match joined.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(NodeError::msg(format!("node task aborted: {join_err}"))),
            }
        })
    }
}
