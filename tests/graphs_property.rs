mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::*;
use proptest::prelude::*;
use rill::graphs::graph;
use rill::traverse::InlineExecutor;

fn block_on<F: std::future::Future<Output = ()>>(fut: F) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(fut);
}

proptest! {
    /// Property: in any layered DAG, memoization runs every node exactly
    /// once per run, regardless of how many dependents it has.
    #[test]
    fn prop_every_node_runs_exactly_once(
        edge_seed in prop::collection::vec(prop::collection::vec(any::<bool>(), 0..8), 1..8),
    ) {
        block_on(async move {
            let mut builder = graph::<usize>();
            let mut counters = Vec::new();
            let mut declared = Vec::new();

            for (i, edges) in edge_seed.iter().enumerate() {
                let counter = Arc::new(AtomicUsize::new(0));
                let mut node = builder
                    .call(IncrNode { counter: Arc::clone(&counter) })
                    .named(format!("n{i}"));
                for (j, has_edge) in edges.iter().enumerate() {
                    if *has_edge && j < i {
                        node = node.after((&declared[j],));
                    }
                }
                counters.push(counter);
                declared.push(node);
            }

            // A collector ordered after every node keeps the sink unique.
            let observed = Arc::new(AtomicUsize::new(0));
            let mut collector = builder
                .call(ReadCounterNode { counter: Arc::clone(&observed) })
                .named("collector");
            for node in &declared {
                collector = collector.after((node,));
            }

            let built = builder.build().unwrap();
            built.run(InlineExecutor).await.unwrap();

            for counter in &counters {
                assert_eq!(counter.load(Ordering::SeqCst), 1);
            }
        });
    }
}

proptest! {
    /// Property: a ring of happens-after edges never builds, and the error
    /// names a representative cycle.
    #[test]
    fn prop_cycles_never_build(len in 2usize..6) {
        let mut builder = graph::<String>();
        let mut declared = Vec::new();
        for i in 0..len {
            declared.push(
                builder
                    .call(ConstNode(format!("v{i}")))
                    .named(format!("c{i}")),
            );
        }
        for i in 0..len {
            let next = (i + 1) % len;
            let _ = declared[i].clone().after((&declared[next],));
        }

        let err = builder.build().unwrap_err();
        let message = err.to_string();
        prop_assert!(message.contains("cycle detected"));
        prop_assert!(message.contains(" -> "));
    }
}

proptest! {
    /// Property: a linear chain always forwards the seed value unchanged
    /// through every hop.
    #[test]
    fn prop_chain_forwards_values(hops in 1usize..12, seed in "[a-z]{1,8}") {
        block_on(async move {
            let mut builder = graph::<String>();
            let mut prev = builder.call(ConstNode(seed.clone()));
            for _ in 0..hops {
                prev = builder.call(EchoNode).with((&prev,));
            }
            let built = builder.build().unwrap();
            let out = built.run(InlineExecutor).await.unwrap();
            assert_eq!(out, seed);
        });
    }
}
