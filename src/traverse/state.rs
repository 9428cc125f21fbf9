//! Per-run traversal state and the scheduler.
//!
//! A [`TraverseState`] lives for exactly one run: it holds the bound input
//! values, the execution context, the memo table mapping each declaration to
//! its in-flight future, and the call log diagnostics read from. [`resolve`]
//! composes the memoized future lattice: each declaration gets one shared
//! future that waits for every predecessor, then dispatches the node
//! invocation through the executor.
//!
//! The memo table and the call log are the only mutable state; both sit
//! behind mutexes, and each memo entry is written exactly once per run.

use std::sync::Arc;

use futures_util::future::{try_join_all, BoxFuture};
use futures_util::future::{ready, Shared};
use futures_util::FutureExt;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::graphs::decl::{Decl, FrozenBinding};
use crate::graphs::NodeInfo;
use crate::name::NameRef;
use crate::types::{AnyValue, DeclId, NameId};

use super::errors::{wrap_failure, CallInfo, GraphError};
use super::executor::TaskExecutor;

/// The shared, memoized future of one declaration's value.
pub(crate) type ErasedFuture = Shared<BoxFuture<'static, Result<AnyValue, GraphError>>>;

/// An already-resolved value as an [`ErasedFuture`].
pub(crate) fn immediate(value: AnyValue) -> ErasedFuture {
    ready(Ok(value)).boxed().shared()
}

/// An already-failed [`ErasedFuture`].
pub(crate) fn immediate_failure(error: GraphError) -> ErasedFuture {
    ready(Err(error)).boxed().shared()
}

/// One recorded node call: the node's metadata and its argument futures, in
/// binding order. Recorded when the call's composed future first runs: all
/// argument futures exist at that point, none has been awaited.
pub(crate) struct FutureCallInformation {
    pub(crate) node: NodeInfo,
    pub(crate) args: Vec<ErasedFuture>,
}

impl FutureCallInformation {
    pub(crate) fn new(node: NodeInfo, args: Vec<ErasedFuture>) -> Self {
        Self { node, args }
    }

    /// `true` when every argument future has resolved successfully.
    fn completed(&self) -> bool {
        self.args
            .iter()
            .all(|future| matches!(future.peek(), Some(Ok(_))))
    }

    fn values(&self) -> Vec<AnyValue> {
        self.args
            .iter()
            .filter_map(|future| match future.peek() {
                Some(Ok(value)) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Mutable state of one graph run.
pub(crate) struct TraverseState {
    bindings: FxHashMap<NameId, AnyValue>,
    executor: Arc<dyn TaskExecutor>,
    wrap_failures: bool,
    memo: Mutex<FxHashMap<DeclId, ErasedFuture>>,
    calls: Mutex<Vec<FutureCallInformation>>,
}

impl TraverseState {
    pub(crate) fn new(
        bindings: FxHashMap<NameId, AnyValue>,
        executor: Arc<dyn TaskExecutor>,
        wrap_failures: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            bindings,
            executor,
            wrap_failures,
            memo: Mutex::new(FxHashMap::default()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn lookup_input(&self, name: &NameRef) -> Option<AnyValue> {
        self.bindings.get(&name.id()).cloned()
    }

    pub(crate) fn executor(&self) -> &Arc<dyn TaskExecutor> {
        &self.executor
    }

    pub(crate) fn wrap_failures(&self) -> bool {
        self.wrap_failures
    }

    /// Append a call to the log. The log is append-only and each declaration
    /// is recorded at most once per run (its composed future runs once).
    pub(crate) fn record(&self, node: NodeInfo, args: Vec<ErasedFuture>) {
        self.calls.lock().push(FutureCallInformation::new(node, args));
    }

    /// Snapshot of every completed call, in record order.
    pub(crate) fn completed_calls(&self) -> Vec<CallInfo> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.completed())
            .map(|call| CallInfo::new(call.node.clone(), call.values()))
            .collect()
    }
}

/// Resolve one declaration to its memoized future, recursively resolving its
/// predecessors first.
///
/// The composed future records the call, awaits every happens-after and
/// argument future (first failure wins; upstream failures pass through
/// unchanged), then dispatches the node invocation through the executor. A
/// failure of the invocation itself is replaced by the declared fallback, or
/// wrapped with execution context, or surfaced raw when wrapping is off.
pub(crate) fn resolve(decl: &Arc<Decl>, state: &Arc<TraverseState>) -> ErasedFuture {
    let cached = state.memo.lock().get(&decl.id).cloned();
    if let Some(existing) = cached {
        return existing;
    }

    let arg_futures: Vec<ErasedFuture> = decl
        .bindings
        .iter()
        .map(|binding| match binding {
            FrozenBinding::Graph(dep) => resolve(dep, state),
            FrozenBinding::Input(name) => match state.lookup_input(name) {
                Some(value) => immediate(value),
                None => immediate_failure(GraphError::UnboundInput {
                    name: name.label().to_string(),
                }),
            },
            FrozenBinding::Value(value) => immediate(value.clone()),
        })
        .collect();
    let after_futures: Vec<ErasedFuture> =
        decl.after.iter().map(|dep| resolve(dep, state)).collect();

    let future = {
        let decl = Arc::clone(decl);
        let state = Arc::clone(state);
        let arg_futures = arg_futures.clone();
        async move {
            state.record(decl.info.clone(), arg_futures.clone());

            let after_count = after_futures.len();
            let mut dependencies: Vec<ErasedFuture> =
                Vec::with_capacity(after_count + arg_futures.len());
            dependencies.extend(after_futures);
            dependencies.extend(arg_futures.iter().cloned());
            let mut resolved = try_join_all(dependencies).await?;
            let values = resolved.split_off(after_count);

            tracing::debug!(node = decl.display_name(), "dispatching node invocation");
            let outcome = state.executor().dispatch(decl.node.invoke(values)).await;
            match outcome {
                Ok(value) => Ok(value),
                Err(cause) => {
                    if let Some(fallback) = &decl.fallback {
                        tracing::warn!(
                            node = decl.display_name(),
                            error = %cause,
                            "node failed, substituting fallback value"
                        );
                        return Ok(fallback.clone());
                    }
                    if state.wrap_failures() {
                        let call = FutureCallInformation::new(decl.info.clone(), arg_futures);
                        Err(GraphError::Execution(wrap_failure(cause, &call, &state)))
                    } else {
                        Err(GraphError::Node {
                            node: decl.display_name().to_string(),
                            cause,
                        })
                    }
                }
            }
        }
    };

    let shared = future.boxed().shared();
    state.memo.lock().insert(decl.id, shared.clone());
    shared
}
