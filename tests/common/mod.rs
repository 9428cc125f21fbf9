#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rill::node::{Node, NodeError, NodeResult};
use rill::types::Value;
use tokio::sync::Notify;

/// Arity-zero node returning a fixed value.
pub struct ConstNode<T>(pub T);

#[async_trait]
impl<T: Value> Node<()> for ConstNode<T> {
    type Out = T;

    async fn run(&self, _args: ()) -> NodeResult<T> {
        Ok(self.0.clone())
    }
}

/// Passes its single string argument through unchanged.
pub struct EchoNode;

#[async_trait]
impl Node<(String,)> for EchoNode {
    type Out = String;

    async fn run(&self, args: (String,)) -> NodeResult<String> {
        Ok(args.0)
    }
}

/// Appends "2" to its argument.
pub struct AppendNode;

#[async_trait]
impl Node<(String,)> for AppendNode {
    type Out = String;

    async fn run(&self, args: (String,)) -> NodeResult<String> {
        Ok(format!("{}2", args.0))
    }
}

pub struct GreetNode;

#[async_trait]
impl Node<(String,)> for GreetNode {
    type Out = String;

    async fn run(&self, args: (String,)) -> NodeResult<String> {
        Ok(format!("hello {}!", args.0))
    }
}

pub struct LenNode;

#[async_trait]
impl Node<(String,)> for LenNode {
    type Out = usize;

    async fn run(&self, args: (String,)) -> NodeResult<usize> {
        Ok(args.0.len())
    }
}

pub struct ConcatNode;

#[async_trait]
impl Node<(String, String)> for ConcatNode {
    type Out = String;

    async fn run(&self, args: (String, String)) -> NodeResult<String> {
        Ok(format!("{}{}", args.0, args.1))
    }
}

/// Arity-zero node that always fails with the given message.
pub struct FailNode(pub &'static str);

#[async_trait]
impl Node<()> for FailNode {
    type Out = String;

    async fn run(&self, _args: ()) -> NodeResult<String> {
        Err(NodeError::msg(self.0))
    }
}

/// Two-argument node that always fails with the given message.
pub struct FailConcatNode(pub &'static str);

#[async_trait]
impl Node<(String, String)> for FailConcatNode {
    type Out = String;

    async fn run(&self, _args: (String, String)) -> NodeResult<String> {
        Err(NodeError::msg(self.0))
    }
}

/// Declared with two arguments; used for arity-mismatch scenarios and never
/// actually run.
pub struct TwoArgNode;

#[async_trait]
impl Node<(String, bool)> for TwoArgNode {
    type Out = u32;

    async fn run(&self, _args: (String, bool)) -> NodeResult<u32> {
        Ok(199)
    }
}

/// Increments the shared counter and resolves.
pub struct IncrNode {
    pub counter: Arc<AtomicUsize>,
}

#[async_trait]
impl Node<()> for IncrNode {
    type Out = ();

    async fn run(&self, _args: ()) -> NodeResult<()> {
        self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Waits for the latch, then increments the shared counter.
pub struct LatchedIncrNode {
    pub counter: Arc<AtomicUsize>,
    pub latch: Arc<Notify>,
}

#[async_trait]
impl Node<()> for LatchedIncrNode {
    type Out = ();

    async fn run(&self, _args: ()) -> NodeResult<()> {
        self.latch.notified().await;
        self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Resolves with the counter's current value.
pub struct ReadCounterNode {
    pub counter: Arc<AtomicUsize>,
}

#[async_trait]
impl Node<()> for ReadCounterNode {
    type Out = usize;

    async fn run(&self, _args: ()) -> NodeResult<usize> {
        Ok(self.counter.load(Ordering::SeqCst))
    }
}

/// Waits for the latch, then resolves with a fixed value.
pub struct LatchedConstNode {
    pub latch: Arc<Notify>,
    pub value: &'static str,
}

#[async_trait]
impl Node<()> for LatchedConstNode {
    type Out = String;

    async fn run(&self, _args: ()) -> NodeResult<String> {
        self.latch.notified().await;
        Ok(self.value.to_string())
    }
}

/// Counts its invocations and resolves with a fixed value.
pub struct CountingConstNode {
    pub counter: Arc<AtomicUsize>,
    pub value: &'static str,
}

#[async_trait]
impl Node<()> for CountingConstNode {
    type Out = String;

    async fn run(&self, _args: ()) -> NodeResult<String> {
        self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(self.value.to_string())
    }
}
