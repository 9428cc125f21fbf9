//! Run-time failure types and the failure-wrapping machinery.
//!
//! When a node fails and no fallback is declared, the traversal wraps the
//! cause into an [`ExecutionError`] that captures the failure site (the
//! failing node's name, its declared arguments, and the argument values that
//! were available) plus a snapshot of every call the run had completed by
//! then. The wrapped error travels through the future chain to the sink.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use thiserror::Error;

use crate::graphs::{BuildError, NodeInfo};
use crate::node::NodeError;
use crate::types::AnyValue;

use super::state::{FutureCallInformation, TraverseState};

/// Snapshot of one completed node call: the node's metadata and the argument
/// values it was invoked with.
#[derive(Debug, Clone)]
pub struct CallInfo {
    node: NodeInfo,
    values: Vec<AnyValue>,
}

impl CallInfo {
    pub(crate) fn new(node: NodeInfo, values: Vec<AnyValue>) -> Self {
        Self { node, values }
    }

    /// Metadata of the called node.
    pub fn node_info(&self) -> &NodeInfo {
        &self.node
    }

    /// The resolved argument values, in binding order.
    pub fn values(&self) -> &[AnyValue] {
        &self.values
    }
}

/// A node failure wrapped with its execution context.
///
/// The `Display` message names the failing node, its declared arguments,
/// and the string form of every argument value that had resolved;
/// [`calls`](Self::calls) exposes the structured completed-call log.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(
    code(rill::traverse::execution),
    help("inspect calls() for the values every completed call produced before the failure")
)]
pub struct ExecutionError {
    message: String,
    #[source]
    cause: NodeError,
    node: NodeInfo,
    calls: Vec<CallInfo>,
    when: DateTime<Utc>,
}

impl ExecutionError {
    /// The original node failure.
    pub fn cause(&self) -> &NodeError {
        &self.cause
    }

    /// Metadata of the failing node.
    pub fn node(&self) -> &NodeInfo {
        &self.node
    }

    /// Every call that had completed (all argument futures resolved
    /// successfully) when the failure was wrapped, in record order. Calls
    /// with unresolved arguments are excluded.
    pub fn calls(&self) -> &[CallInfo] {
        &self.calls
    }

    /// When the failure was wrapped.
    pub fn when(&self) -> DateTime<Utc> {
        self.when
    }
}

/// Failure of a graph run.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum GraphError {
    /// The graph failed structural validation (surfaced through the run
    /// future for standalone graphs that were never `build()`-validated).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),

    /// A node failed; the wrapped error carries the execution context.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Execution(#[from] ExecutionError),

    /// A named input had no bound value at run time.
    #[error("no value bound for input '{name}'")]
    #[diagnostic(
        code(rill::traverse::unbound_input),
        help("call bind(name, value) before run()")
    )]
    UnboundInput { name: String },

    /// A node failed with wrapping disabled; the raw cause.
    #[error("node '{node}' failed: {cause}")]
    #[diagnostic(code(rill::traverse::node_failure))]
    Node {
        node: String,
        #[source]
        cause: NodeError,
    },

    /// Invariant breach inside the engine. Build-time validation should make
    /// this unreachable.
    #[error("internal error: {0}")]
    #[diagnostic(code(rill::traverse::internal))]
    Internal(String),
}

/// Wrap a node failure with the failure site and a completed-call snapshot.
pub(crate) fn wrap_failure(
    cause: NodeError,
    call: &FutureCallInformation,
    state: &TraverseState,
) -> ExecutionError {
    let mut rendered_args = Vec::with_capacity(call.node.arguments().len());
    for (index, argument) in call.node.arguments().iter().enumerate() {
        let value = match call.args.get(index).and_then(|future| future.peek()) {
            Some(Ok(value)) => format!("{value:?}"),
            Some(Err(_)) => "failed".to_string(),
            None => "not completed".to_string(),
        };
        rendered_args.push(format!("{}={}", argument.name(), value));
    }

    let message = if rendered_args.is_empty() {
        format!("node '{}' failed: {cause}", call.node.name())
    } else {
        format!(
            "node '{}' failed: {cause} (arguments: {})",
            call.node.name(),
            rendered_args.join(", ")
        )
    };

    ExecutionError {
        message,
        cause,
        node: call.node.clone(),
        calls: state.completed_calls(),
        when: Utc::now(),
    }
}
