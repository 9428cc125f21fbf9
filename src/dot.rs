//! DOT rendering of a graph's [`NodeInfo`] view.
//!
//! Walks the metadata tree and emits a Graphviz description: declared nodes
//! as boxes, named inputs as ellipses, constants as diamonds; argument edges
//! labelled by position, happens-after edges dashed.

use std::io::{self, Write};

use rustc_hash::FxHashSet;

use crate::graphs::{Graph, NodeInfo, NodeInfoKind};
use crate::types::Value;

/// Write `graph` as a DOT digraph.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use rill::dot::write_dot;
/// use rill::graphs::call;
/// use rill::node::{Node, NodeResult};
///
/// struct One;
///
/// #[async_trait]
/// impl Node<()> for One {
///     type Out = u32;
///     async fn run(&self, _args: ()) -> NodeResult<u32> {
///         Ok(1)
///     }
/// }
///
/// let graph = call(One).named("one");
/// let mut out = Vec::new();
/// write_dot(&graph, &mut out).unwrap();
/// let rendered = String::from_utf8(out).unwrap();
/// assert!(rendered.contains("digraph"));
/// assert!(rendered.contains("one"));
/// ```
pub fn write_dot<R: Value, W: Write>(graph: &Graph<R>, out: &mut W) -> io::Result<()> {
    writeln!(out, "digraph {{")?;
    let info = graph.info();
    let mut emitted = FxHashSet::default();
    write_info(&info, out, &mut emitted)?;
    writeln!(out, "}}")
}

fn write_info<W: Write>(
    info: &NodeInfo,
    out: &mut W,
    emitted: &mut FxHashSet<u64>,
) -> io::Result<()> {
    let id = info.key().raw();
    if !emitted.insert(id) {
        return Ok(());
    }

    let shape = match info.kind() {
        NodeInfoKind::Node => "box",
        NodeInfoKind::Input => "ellipse",
        NodeInfoKind::Parameter => "diamond",
    };
    writeln!(
        out,
        "  n{id} [label=\"{}\" shape={shape}];",
        escape(info.name())
    )?;

    for (position, argument) in info.arguments().iter().enumerate() {
        write_info(argument, out, emitted)?;
        writeln!(
            out,
            "  n{} -> n{id} [label=\"arg {position}\"];",
            argument.key().raw()
        )?;
    }
    for predecessor in info.happens_after() {
        write_info(predecessor, out, emitted)?;
        writeln!(
            out,
            "  n{} -> n{id} [style=dashed];",
            predecessor.key().raw()
        )?;
    }
    Ok(())
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
