mod common;

use common::*;
use rill::graphs::{call, graph, Binding, BuildError};
use rill::name::Name;

#[test]
fn empty_graph_fails() {
    let err = graph::<String>().build().unwrap_err();
    assert!(matches!(err, BuildError::EmptyGraph));
    assert!(err.to_string().contains("Empty graph"));
}

#[test]
fn arity_mismatch_names_the_node() {
    let mut builder = graph::<u32>();
    let _node = builder.call(TwoArgNode).named("the second node");
    let err = builder.build().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Incorrect argument count"));
    assert!(message.contains("the second node"));
}

#[test]
fn multiple_sinks_lists_display_names() {
    let mut builder = graph::<String>();
    let _one = builder
        .call(ConstNode("one".to_string()))
        .named("the first sink");
    let _two = builder.call(ConstNode("two".to_string()));
    let err = builder.build().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Multiple sinks"));
    assert!(message.contains("the first sink"));
    assert!(message.contains("unnamed"));
}

#[test]
fn cycle_is_detected_with_a_path() {
    let mut builder = graph::<String>();
    let n1 = builder.call(ConstNode("1".to_string())).named("n1");
    let n2 = builder.call(AppendNode).named("n2");
    let n1 = n1.after((&n2,));
    let _n2 = n2.with((&n1,));
    let err = builder.build().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("cycle detected"));
    assert!(
        message.contains("n1 -> n2 -> n1") || message.contains("n2 -> n1 -> n2"),
        "no representative cycle in: {message}"
    );
}

#[test]
fn undeclared_input_fails() {
    let who: Name<String> = Name::named("who");
    let mut builder = graph::<String>();
    let _greet = builder.call(GreetNode).with((&who,)).named("greeter");
    let err = builder.build().unwrap_err();
    assert!(matches!(err, BuildError::MissingInput { .. }));
    let message = err.to_string();
    assert!(message.contains("who"));
    assert!(message.contains("greeter"));
}

#[test]
fn binding_type_mismatch_fails() {
    let mut builder = graph::<usize>();
    let number = builder.call(ConstNode(5usize)).named("number");
    let _len = builder.call(LenNode).with((&number,)).named("len");
    let err = builder.build().unwrap_err();
    assert!(matches!(err, BuildError::TypeMismatch { .. }));
    assert!(err.to_string().contains("len"));
}

#[test]
fn sink_type_mismatch_fails() {
    let mut builder = graph::<u32>();
    let _text = builder.call(ConstNode("text".to_string()));
    let err = builder.build().unwrap_err();
    assert!(matches!(err, BuildError::SinkType { .. }));
}

#[test]
fn constant_bindings_validate() {
    let mut builder = graph::<usize>();
    let _len = builder
        .call(LenNode)
        .with((Binding::value("abc".to_string()),));
    assert!(builder.build().is_ok());
}

#[test]
fn constant_binding_type_is_checked() {
    let mut builder = graph::<usize>();
    let _len = builder.call(LenNode).with((Binding::value(12u64),)).named("len");
    let err = builder.build().unwrap_err();
    assert!(matches!(err, BuildError::TypeMismatch { .. }));
}

#[test]
fn standalone_subgraph_is_absorbed() {
    let hi = call(ConstNode("hi there!".to_string())).named("hi");
    let mut builder = graph::<usize>();
    let _len = builder.call(LenNode).with((&hi,)).named("len");
    let built = builder.build().unwrap();

    let info = built.info();
    assert_eq!(info.name(), "len");
    assert_eq!(info.arguments().len(), 1);
    assert_eq!(info.arguments()[0].name(), "hi");
}

#[test]
fn names_with_equal_labels_are_distinct_slots() {
    let a: Name<String> = Name::named("label");
    let b: Name<String> = Name::named("label");
    // Only `a` is declared; binding to `b` must be rejected.
    let mut builder = graph::<String>().inputs([&a]);
    let _echo = builder.call(EchoNode).with((&b,));
    let err = builder.build().unwrap_err();
    assert!(matches!(err, BuildError::MissingInput { .. }));
}

#[test]
fn info_view_exposes_structure() {
    let first: Name<String> = Name::named("first input");
    let mut builder = graph::<String>().inputs([&first]);
    let base = builder.call(ConstNode("base".to_string())).named("base");
    let _sink = builder
        .call(ConcatNode)
        .with((&base, &first))
        .after((&base,))
        .named("sink");
    let built = builder.build().unwrap();

    let info = built.info();
    assert_eq!(info.name(), "sink");
    let argument_names: Vec<&str> = info.arguments().iter().map(|a| a.name()).collect();
    assert_eq!(argument_names, vec!["base", "first input"]);
    assert_eq!(info.happens_after().len(), 1);
    assert_eq!(info.predecessors().count(), 3);
    assert_eq!(built.required_inputs().len(), 1);
    assert_eq!(built.required_inputs()[0].label(), "first input");
}
