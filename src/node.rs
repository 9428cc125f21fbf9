//! Node trait and the arity machinery behind it.
//!
//! A node is a user-supplied asynchronous function of fixed arity. The
//! [`Node`] trait is generic over its argument tuple (`Node<()>` is a
//! zero-argument node, `Node<(A,)>` takes one argument, up to four), so each
//! arity is a distinct typed shape while the engine stays uniform.
//!
//! Nodes are opaque to the engine: it invokes them with exactly the declared
//! number of argument values and otherwise makes no assumptions beyond what
//! the execution context provides.
//!
//! # Examples
//!
//! ```
//! use async_trait::async_trait;
//! use rill::node::{Node, NodeResult};
//!
//! struct Greet;
//!
//! #[async_trait]
//! impl Node<(String,)> for Greet {
//!     type Out = String;
//!
//!     async fn run(&self, args: (String,)) -> NodeResult<String> {
//!         let (name,) = args;
//!         Ok(format!("hello {name}!"))
//!     }
//! }
//! ```

use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use miette::Diagnostic;
use thiserror::Error;

use crate::types::{AnyValue, Value};

/// Result type returned by node implementations.
pub type NodeResult<T> = Result<T, NodeError>;

/// A single erased node invocation in flight.
pub type TaskFuture = BoxFuture<'static, Result<AnyValue, NodeError>>;

/// Failure of a single node invocation.
///
/// This is what a node returns to report its own failure; the traversal
/// layer decides whether to substitute a fallback, wrap it with execution
/// context, or surface it raw.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum NodeError {
    /// The node reported a failure.
    #[error("{0}")]
    #[diagnostic(code(rill::node::failed))]
    Failed(String),

    /// An argument value did not have the type the node declares. Graph
    /// validation rejects such wiring before a run can start, so this
    /// surfaces only for graphs reconfigured after being built.
    #[error("argument {index} has type {found}, the node expects {expected}")]
    #[diagnostic(code(rill::node::argument_type))]
    ArgumentType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

impl NodeError {
    /// Convenience constructor for a plain-message failure.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// An asynchronous function unit inside a graph.
///
/// `Args` is the argument tuple: `()`, `(A,)`, `(A, B)`, `(A, B, C)` or
/// `(A, B, C, D)`. The engine invokes `run` with exactly those values once
/// every declared predecessor has completed.
///
/// Implementations should be stateless with respect to the engine; any
/// internal state they carry (counters, clients, caches) is their own
/// concern and must be safe to share across threads.
#[async_trait]
pub trait Node<Args: ArgList>: Send + Sync + 'static {
    /// The value this node produces.
    type Out: Value;

    /// Execute the node with its resolved argument values.
    async fn run(&self, args: Args) -> NodeResult<Self::Out>;
}

/// Argument tuple shapes the engine can thread values through.
///
/// Implemented for tuples of [`Value`] types up to arity four. The trait
/// carries the per-position type information validation needs and the
/// conversion from erased values back into the typed tuple.
pub trait ArgList: Send + Sized + 'static {
    /// Number of arguments in the tuple.
    fn arity() -> usize;

    /// `TypeId` of each argument position, in order.
    fn arg_types() -> Vec<TypeId>;

    /// Human-readable type name of each argument position, in order.
    fn arg_type_names() -> Vec<&'static str>;

    /// Downcast a row of erased values into the typed tuple.
    fn from_values(values: Vec<AnyValue>) -> Result<Self, NodeError>;
}

impl ArgList for () {
    fn arity() -> usize {
        0
    }

    fn arg_types() -> Vec<TypeId> {
        Vec::new()
    }

    fn arg_type_names() -> Vec<&'static str> {
        Vec::new()
    }

    fn from_values(_values: Vec<AnyValue>) -> Result<Self, NodeError> {
        Ok(())
    }
}

macro_rules! arg_list_tuple {
    ($arity:literal => $($ty:ident),+) => {
        impl<$($ty: Value),+> ArgList for ($($ty,)+) {
            fn arity() -> usize {
                $arity
            }

            fn arg_types() -> Vec<TypeId> {
                vec![$(TypeId::of::<$ty>()),+]
            }

            fn arg_type_names() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$ty>()),+]
            }

            fn from_values(values: Vec<AnyValue>) -> Result<Self, NodeError> {
                let mut values = values.into_iter().enumerate();
                Ok(($(
                    {
                        let (index, value) = values.next().ok_or(NodeError::ArgumentType {
                            index: $arity,
                            expected: std::any::type_name::<$ty>(),
                            found: "nothing",
                        })?;
                        value.downcast::<$ty>().ok_or_else(|| NodeError::ArgumentType {
                            index,
                            expected: std::any::type_name::<$ty>(),
                            found: value.type_name(),
                        })?
                    },
                )+))
            }
        }
    };
}

arg_list_tuple!(1 => A);
arg_list_tuple!(2 => A, B);
arg_list_tuple!(3 => A, B, C);
arg_list_tuple!(4 => A, B, C, D);

/// Object-safe view of a node: arity, argument/output types, and an erased
/// invocation entry point. This is the only shape the builder and scheduler
/// ever see.
pub(crate) trait DynNode: Send + Sync {
    fn arity(&self) -> usize;
    fn arg_types(&self) -> Vec<TypeId>;
    fn arg_type_names(&self) -> Vec<&'static str>;
    fn out_type(&self) -> TypeId;
    fn out_type_name(&self) -> &'static str;
    fn invoke(&self, values: Vec<AnyValue>) -> TaskFuture;
}

/// Bridges a typed [`Node`] implementation into the erased [`DynNode`] view.
pub(crate) struct NodeAdapter<N, Args> {
    node: Arc<N>,
    _args: PhantomData<fn(Args)>,
}

impl<N, Args> NodeAdapter<N, Args> {
    pub(crate) fn new(node: N) -> Self {
        Self {
            node: Arc::new(node),
            _args: PhantomData,
        }
    }
}

impl<Args, N> DynNode for NodeAdapter<N, Args>
where
    Args: ArgList,
    N: Node<Args>,
{
    fn arity(&self) -> usize {
        Args::arity()
    }

    fn arg_types(&self) -> Vec<TypeId> {
        Args::arg_types()
    }

    fn arg_type_names(&self) -> Vec<&'static str> {
        Args::arg_type_names()
    }

    fn out_type(&self) -> TypeId {
        TypeId::of::<N::Out>()
    }

    fn out_type_name(&self) -> &'static str {
        std::any::type_name::<N::Out>()
    }

    fn invoke(&self, values: Vec<AnyValue>) -> TaskFuture {
        let node = Arc::clone(&self.node);
        Box::pin(async move {
            let args = Args::from_values(values)?;
            let out = node.run(args).await?;
            Ok(AnyValue::new(out))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    #[async_trait]
    impl Node<(String,)> for Upper {
        type Out = String;

        async fn run(&self, args: (String,)) -> NodeResult<String> {
            Ok(args.0.to_uppercase())
        }
    }

    struct Sum;

    #[async_trait]
    impl Node<(u32, u32)> for Sum {
        type Out = u32;

        async fn run(&self, args: (u32, u32)) -> NodeResult<u32> {
            Ok(args.0 + args.1)
        }
    }

    #[test]
    fn test_arg_list_arity_and_types() {
        assert_eq!(<() as ArgList>::arity(), 0);
        assert_eq!(<(String,) as ArgList>::arity(), 1);
        assert_eq!(<(u32, bool) as ArgList>::arity(), 2);
        assert_eq!(
            <(u32, bool) as ArgList>::arg_types(),
            vec![TypeId::of::<u32>(), TypeId::of::<bool>()]
        );
    }

    #[test]
    fn test_arg_list_downcast() {
        let values = vec![AnyValue::new(2u32), AnyValue::new(3u32)];
        let (a, b) = <(u32, u32)>::from_values(values).unwrap();
        assert_eq!((a, b), (2, 3));
    }

    #[test]
    fn test_arg_list_type_error_names_position() {
        let values = vec![AnyValue::new(2u32), AnyValue::new("oops".to_string())];
        let err = <(u32, u32)>::from_values(values).unwrap_err();
        match err {
            NodeError::ArgumentType { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_erased_invoke() {
        let adapter = NodeAdapter::<_, (String,)>::new(Upper);
        let out = adapter
            .invoke(vec![AnyValue::new("abc".to_string())])
            .await
            .unwrap();
        assert_eq!(out.downcast::<String>().as_deref(), Some("ABC"));
        assert_eq!(adapter.arity(), 1);
        assert_eq!(adapter.out_type(), TypeId::of::<String>());
    }

    #[tokio::test]
    async fn test_erased_invoke_two_args() {
        let adapter = NodeAdapter::<_, (u32, u32)>::new(Sum);
        let out = adapter
            .invoke(vec![AnyValue::new(20u32), AnyValue::new(22u32)])
            .await
            .unwrap();
        assert_eq!(out.downcast::<u32>(), Some(42));
    }

    #[test]
    fn test_node_error_msg() {
        let err = NodeError::msg("boom");
        assert_eq!(err.to_string(), "boom");
    }
}
