//! Integration Tests for the Reactive Graph
//!
//! These tests drive whole programs through the runtime facade: definitions,
//! staged writes, rounds and the optimizer working together.

use ripple_core::engine::{RecordingSink, TraceEvent};
use ripple_core::graph::{NodeId, Role};
use ripple_core::{EvalError, GraphError, Runtime, RuntimeConfig};

/// Define a named input.
fn input<T: ripple_core::value::Scalar>(runtime: &mut Runtime, name: &str, value: T) -> NodeId {
    let id = runtime.graph_mut().input(value).unwrap();
    runtime.define(name, id).unwrap()
}

/// Define a named input trigger.
fn input_trigger(runtime: &mut Runtime, name: &str) -> NodeId {
    let id = runtime.graph_mut().input_trigger().unwrap();
    runtime.define(name, id).unwrap()
}

/// Call a function and define the result.
fn define_call(runtime: &mut Runtime, name: &str, function: &str, args: &[NodeId]) -> NodeId {
    let id = runtime.call(function, args).unwrap();
    runtime.define(name, id).unwrap()
}

/// Test that only the changed path of a sum is recomputed.
#[test]
fn sum_recomputes_only_changed_inputs() {
    let mut runtime = Runtime::new();
    let a = input(&mut runtime, "a", 2_i64);
    let b = input(&mut runtime, "b", 3_i64);
    let c = define_call(&mut runtime, "c", "Sum", &[a, b]);
    assert_eq!(*runtime.get::<i64>("c").unwrap(), 5);

    runtime.set("a", 7_i64).unwrap();
    let report = runtime.run_round().unwrap();
    assert_eq!(report.evaluated, vec![a, c]);
    assert_eq!(*runtime.get::<i64>("c").unwrap(), 10);

    runtime.set("b", 1_i64).unwrap();
    let report = runtime.run_round().unwrap();
    assert_eq!(report.evaluated, vec![b, c]);
    assert_eq!(*runtime.get::<i64>("c").unwrap(), 8);
}

/// Test gate semantics over two rounds of pulses.
#[test]
fn trigger_gates_follow_pulses() {
    let mut runtime = Runtime::new();
    let a = input_trigger(&mut runtime, "a");
    let b = input_trigger(&mut runtime, "b");
    let c = define_call(&mut runtime, "c", "Any", &[a, b]);
    let d = define_call(&mut runtime, "d", "All", &[a, b]);
    let e = define_call(&mut runtime, "e", "Xor", &[c, d]);
    let sink = RecordingSink::new();
    runtime.set_trace_sink(Some(Box::new(sink.clone())));

    runtime.provoke("a").unwrap();
    runtime.provoke("b").unwrap();
    let report = runtime.run_round().unwrap();
    assert_eq!(report.evaluated, vec![a, b, c, d, e]);
    assert_eq!(report.provoked, 4);
    let e_changed = sink.take().into_iter().find_map(|event| match event {
        TraceEvent::Evaluated { node, changed, .. } if node == e => Some(changed),
        _ => None,
    });
    assert_eq!(e_changed, Some(false));

    for name in ["a", "b", "c", "d", "e"] {
        assert!(!runtime.is_provoked(name).unwrap());
    }

    runtime.provoke("a").unwrap();
    let report = runtime.run_round().unwrap();
    assert_eq!(report.evaluated, vec![a, c, d, e]);
    // a, c and e fired; d evaluated without firing
    assert_eq!(report.provoked, 3);
    assert_eq!(report.changed, 3);
}

/// Test that a literal-only expression collapses to one literal.
#[test]
fn literal_expression_folds_completely() {
    let mut runtime = Runtime::new();
    let graph = runtime.graph_mut();
    let lit = |graph: &mut ripple_core::Graph, value: f64| graph.literal(value).unwrap();
    let (l21, l1, l3a, l2, l3b) = (
        lit(graph, 21.0),
        lit(graph, 1.0),
        lit(graph, 3.0),
        lit(graph, 2.0),
        lit(graph, 3.0),
    );
    let six = runtime.call("Product", &[l3a, l2]).unwrap();
    let seven = runtime.call("Sum", &[l1, six]).unwrap();
    let twenty_one = runtime.call("Product", &[seven, l3b]).unwrap();
    let total = runtime.call("Sum", &[l21, twenty_one]).unwrap();

    let root = runtime.define("a", total).unwrap();
    assert_eq!(runtime.describe("a").unwrap(), "Literal(42.0)");
    assert_eq!(runtime.graph().len(), 1);
    assert_eq!(runtime.graph().ids().collect::<Vec<_>>(), vec![root]);
}

/// Test that a cycle-introducing edge leaves the graph untouched.
#[test]
fn cycle_edges_are_rejected() {
    let mut runtime = Runtime::with_config(RuntimeConfig {
        optimize: false,
        ..RuntimeConfig::default()
    });
    let a = input(&mut runtime, "a", 1_i64);
    let sum = define_call(&mut runtime, "sum", "Max", &[a]);
    let graph = runtime.graph_mut();
    let max = graph.nary(ripple_core::ops::maximum::<i64>(), vec![a]).unwrap();
    let neg = graph.unary("Neg", ripple_core::ops::negate::<i64>, max).unwrap();
    let depth_before = graph.node(max).unwrap().depth();

    let err = graph.add_parents(max, 0, &[neg]).unwrap_err();
    assert_eq!(err, GraphError::Cycle { parent: neg, child: max });
    assert_eq!(graph.node(max).unwrap().parents().list_at(0), &[a]);
    assert!(!graph.node(neg).unwrap().readers().contains_key(&max));
    assert_eq!(graph.node(max).unwrap().depth(), depth_before);

    let err = graph.set_parent(sum, 0, Some(sum)).unwrap_err();
    assert_eq!(err, GraphError::Cycle { parent: sum, child: sum });
    assert!(graph.depth_violations().is_empty());
}

/// Test that a one-argument sum is a passthrough with its own identity.
#[test]
fn single_argument_sum_is_a_shell() {
    let mut runtime = Runtime::new();
    let a = input(&mut runtime, "a", 9_i64);
    let s = define_call(&mut runtime, "s", "Sum", &[a]);

    assert_ne!(s, a);
    assert_eq!(runtime.graph().node(s).unwrap().kind(), "Shell");
    assert_eq!(*runtime.get::<i64>("s").unwrap(), 9);

    runtime.set("a", 4_i64).unwrap();
    runtime.run_round().unwrap();
    assert_eq!(*runtime.get::<i64>("s").unwrap(), 4);
}

/// Test that a diamond evaluates every node once, parents first.
#[test]
fn diamond_evaluates_each_node_once() {
    let mut runtime = Runtime::new();
    let a = input(&mut runtime, "a", 1_i64);
    let left = define_call(&mut runtime, "left", "Neg", &[a]);
    let ten = runtime.graph_mut().literal(10_i64).unwrap();
    let right = define_call(&mut runtime, "right", "Sub", &[ten, a]);
    let joined = define_call(&mut runtime, "joined", "Product", &[left, right, a]);
    let sink = RecordingSink::new();
    runtime.set_trace_sink(Some(Box::new(sink.clone())));

    runtime.set("a", 3_i64).unwrap();
    let report = runtime.run_round().unwrap();

    let mut seen = std::collections::HashSet::new();
    assert!(report.evaluated.iter().all(|id| seen.insert(*id)));
    assert_eq!(report.evaluated.len(), 4);
    assert_eq!(report.evaluated.last(), Some(&joined));
    assert_eq!(*runtime.get::<i64>("joined").unwrap(), -3 * 7 * 3);

    let depths: Vec<u32> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            TraceEvent::Evaluated { depth, .. } => Some(depth),
            _ => None,
        })
        .collect();
    assert!(depths.windows(2).all(|pair| pair[0] <= pair[1]));
}

/// Test that an unchanged result stops propagation.
#[test]
fn unchanged_values_do_not_propagate() {
    let mut runtime = Runtime::new();
    let a = input(&mut runtime, "a", 1_i64);
    let floor = runtime.graph_mut().literal(10_i64).unwrap();
    let max = define_call(&mut runtime, "max", "Max", &[a, floor]);
    define_call(&mut runtime, "neg", "Neg", &[max]);

    runtime.set("a", 2_i64).unwrap();
    let report = runtime.run_round().unwrap();
    assert_eq!(report.evaluated, vec![a, max]);
    assert_eq!(report.changed, 1);

    runtime.set("a", 12_i64).unwrap();
    let report = runtime.run_round().unwrap();
    assert_eq!(report.evaluated.len(), 3);
    assert_eq!(*runtime.get::<i64>("neg").unwrap(), -12);
}

/// Test that every trigger is unprovoked once a round completes.
#[test]
fn triggers_reset_after_every_round() {
    let mut runtime = Runtime::new();
    let fire = input_trigger(&mut runtime, "fire");
    let level = input(&mut runtime, "level", false);
    let rising = define_call(&mut runtime, "rising", "Rising", &[level]);
    let either = define_call(&mut runtime, "either", "Any", &[fire, rising]);
    define_call(&mut runtime, "count", "Count", &[either]);
    define_call(&mut runtime, "toggle", "Toggle", &[either]);

    runtime.provoke("fire").unwrap();
    runtime.set("level", true).unwrap();
    let report = runtime.run_round().unwrap();
    assert_eq!(report.provoked, 3);
    assert_eq!(*runtime.get::<i64>("count").unwrap(), 1);
    assert!(*runtime.get::<bool>("toggle").unwrap());

    let graph = runtime.graph();
    for id in graph.ids() {
        let node = graph.node(id).unwrap();
        if node.role() == Role::Trigger {
            assert!(!graph.is_provoked(id), "{id} still provoked");
        }
    }

    runtime.set("level", false).unwrap();
    runtime.run_round().unwrap();
    runtime.set("level", true).unwrap();
    runtime.run_round().unwrap();
    assert_eq!(*runtime.get::<i64>("count").unwrap(), 2);
    assert!(!*runtime.get::<bool>("toggle").unwrap());
}

/// Build `Sum(a, Product(b, 1), Neg(Sub(4, 6)), 0)` in a runtime.
fn folded_program(optimize: bool) -> Runtime {
    let mut runtime = Runtime::with_config(RuntimeConfig {
        optimize,
        ..RuntimeConfig::default()
    });
    let a = input(&mut runtime, "a", 0_i64);
    let b = input(&mut runtime, "b", 0_i64);
    let graph = runtime.graph_mut();
    let one = graph.literal(1_i64).unwrap();
    let four = graph.literal(4_i64).unwrap();
    let six = graph.literal(6_i64).unwrap();
    let zero = graph.literal(0_i64).unwrap();
    let product = runtime.call("Product", &[b, one]).unwrap();
    let diff = runtime.call("Sub", &[four, six]).unwrap();
    let neg = runtime.call("Neg", &[diff]).unwrap();
    let total = runtime.call("Sum", &[a, product, neg, zero]).unwrap();
    runtime.define("total", total).unwrap();
    runtime
}

/// Test that optimizing never changes downstream results.
#[test]
fn optimized_program_matches_unoptimized() {
    let mut plain = folded_program(false);
    let mut optimized = folded_program(true);
    assert!(optimized.graph().len() < plain.graph().len());

    let writes: [(i64, i64); 5] = [(3, 4), (-8, 2), (i64::MAX, 5), (0, 0), (17, -40)];
    for (a, b) in writes {
        for runtime in [&mut plain, &mut optimized] {
            runtime.set("a", a).unwrap();
            runtime.set("b", b).unwrap();
            runtime.run_round().unwrap();
        }
        assert_eq!(
            plain.get::<i64>("total").unwrap(),
            optimized.get::<i64>("total").unwrap()
        );
    }
    assert!(optimized.graph().depth_violations().is_empty());
    assert!(plain.graph().depth_violations().is_empty());
}

fn signed_zero_program(optimize: bool) -> Runtime {
    let mut runtime = Runtime::with_config(RuntimeConfig {
        optimize,
        ..RuntimeConfig::default()
    });
    let a = input(&mut runtime, "a", -0.0_f64);
    let graph = runtime.graph_mut();
    let one = graph.literal(1.0_f64).unwrap();
    let positive = graph.literal(0.0_f64).unwrap();
    let negative = graph.literal(-0.0_f64).unwrap();
    let with_positive = runtime.call("Sum", &[a, positive]).unwrap();
    define_call(&mut runtime, "plus_zero", "Div", &[one, with_positive]);
    let one = runtime.graph_mut().literal(1.0_f64).unwrap();
    let with_negative = runtime.call("Sum", &[a, negative]).unwrap();
    define_call(&mut runtime, "plus_negative_zero", "Div", &[one, with_negative]);
    runtime
}

/// Test that float identity elimination respects the sign of zero.
#[test]
fn float_sum_keeps_signed_zero() {
    let mut plain = signed_zero_program(false);
    let mut optimized = signed_zero_program(true);

    for value in [5.0_f64, -0.0, 0.0, -0.0] {
        for runtime in [&mut plain, &mut optimized] {
            runtime.set("a", value).unwrap();
            runtime.run_round().unwrap();
        }
        for name in ["plus_zero", "plus_negative_zero"] {
            assert_eq!(
                plain.get::<f64>(name).unwrap(),
                optimized.get::<f64>(name).unwrap(),
                "{name} after a = {value:?}"
            );
        }
    }
    assert_eq!(*optimized.get::<f64>("plus_zero").unwrap(), f64::INFINITY);
    assert_eq!(*optimized.get::<f64>("plus_negative_zero").unwrap(), f64::NEG_INFINITY);
}

/// Test identity elimination and flattening of a nested sum.
#[test]
fn nested_sum_is_flattened() {
    let mut runtime = Runtime::new();
    let a = input(&mut runtime, "a", 5_i64);
    let b = input(&mut runtime, "b", 6_i64);
    let graph = runtime.graph_mut();
    let zero = graph.literal(0_i64).unwrap();
    let one = graph.literal(1_i64).unwrap();
    let two = graph.literal(2_i64).unwrap();
    let inner = runtime.call("Sum", &[b, one]).unwrap();
    let outer = runtime.call("Sum", &[a, zero, inner, two]).unwrap();
    runtime.define("total", outer).unwrap();

    assert_eq!(
        runtime.describe("total").unwrap(),
        "Sum(14)[Input(5), Input(6), Literal(3)]"
    );
    // two inputs, one literal, the sum
    assert_eq!(runtime.graph().len(), 4);

    runtime.set("b", 10_i64).unwrap();
    runtime.run_round().unwrap();
    assert_eq!(*runtime.get::<i64>("total").unwrap(), 18);
}

/// Test that a failing node aborts the round and the graph recovers.
#[test]
fn division_by_zero_aborts_round() {
    let mut runtime = Runtime::new();
    let a = input(&mut runtime, "a", 12_i64);
    let b = input(&mut runtime, "b", 4_i64);
    let q = define_call(&mut runtime, "q", "Div", &[a, b]);

    runtime.set("b", 0_i64).unwrap();
    let err = runtime.run_round().unwrap_err();
    assert_eq!(
        err,
        GraphError::Eval {
            node: q,
            source: EvalError::DivideByZero { op: "Div" },
        }
    );
    assert_eq!(*runtime.get::<i64>("q").unwrap(), 3);
    assert!(!runtime.has_pending());

    runtime.set("b", 6_i64).unwrap();
    runtime.run_round().unwrap();
    assert_eq!(*runtime.get::<i64>("q").unwrap(), 2);
}

/// Test that float division follows IEEE semantics.
#[test]
fn float_division_by_zero_is_infinite() {
    let mut runtime = Runtime::new();
    let a = input(&mut runtime, "a", 1.0_f64);
    let b = input(&mut runtime, "b", 2.0_f64);
    define_call(&mut runtime, "q", "Div", &[a, b]);

    runtime.set("b", 0.0_f64).unwrap();
    runtime.run_round().unwrap();
    assert_eq!(*runtime.get::<f64>("q").unwrap(), f64::INFINITY);
}

/// Test the structured errors of function resolution.
#[test]
fn function_errors_are_structured() {
    let mut runtime = Runtime::new();
    let a = input(&mut runtime, "a", 1_i64);
    let x = input(&mut runtime, "x", f64::NAN);

    assert!(matches!(
        runtime.call("Sum", &[]),
        Err(GraphError::Arity { found: 0, .. })
    ));
    assert!(matches!(
        runtime.call("Sum", &[a, x]),
        Err(GraphError::NoOverload { .. })
    ));
    assert!(matches!(
        runtime.call("ToInt", &[x]),
        Err(GraphError::Eval {
            source: EvalError::Cast { .. },
            ..
        })
    ));
}

/// Test that flipping the condition of a trigger mux alone does not fire it.
#[test]
fn select_trigger_ignores_condition_flips() {
    let mut runtime = Runtime::new();
    let cond = input(&mut runtime, "cond", true);
    let then = input_trigger(&mut runtime, "then");
    let other = input_trigger(&mut runtime, "other");
    let select = define_call(&mut runtime, "select", "If", &[cond, then, other]);
    let count = define_call(&mut runtime, "count", "Count", &[select]);
    let sink = RecordingSink::new();
    runtime.set_trace_sink(Some(Box::new(sink.clone())));

    runtime.set("cond", false).unwrap();
    let report = runtime.run_round().unwrap();
    assert_eq!(report.evaluated, vec![cond, select]);
    assert_eq!(report.provoked, 0);
    assert!(sink.take().iter().any(|event| matches!(
        event,
        TraceEvent::Evaluated { node, changed: false, .. } if *node == select
    )));
    assert_eq!(*runtime.get::<i64>("count").unwrap(), 0);

    // the branch selected before the flip no longer passes
    runtime.provoke("then").unwrap();
    let report = runtime.run_round().unwrap();
    assert_eq!(report.evaluated, vec![then, select]);

    runtime.provoke("other").unwrap();
    let report = runtime.run_round().unwrap();
    assert_eq!(report.evaluated, vec![other, select, count]);
    assert_eq!(*runtime.get::<i64>("count").unwrap(), 1);
}

/// Test the event stream of a traced round.
#[test]
fn trace_sink_records_rounds() {
    let mut runtime = Runtime::new();
    let a = input(&mut runtime, "a", 1_i64);
    let neg = define_call(&mut runtime, "neg", "Neg", &[a]);
    let sink = RecordingSink::new();
    runtime.set_trace_sink(Some(Box::new(sink.clone())));

    runtime.set("a", 2_i64).unwrap();
    runtime.run_round().unwrap();

    let events = sink.take();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], TraceEvent::RoundStarted { pending: 1, .. }));
    assert!(matches!(events[1], TraceEvent::Evaluated { node, depth: 0, .. } if node == a));
    assert!(matches!(
        events[2],
        TraceEvent::Evaluated { node, depth: 1, changed: true, .. } if node == neg
    ));
    assert!(matches!(
        events[3],
        TraceEvent::RoundFinished { evaluated: 2, provoked: 0, .. }
    ));
    assert!(events[3].to_json().unwrap().starts_with(r#"{"event":"round_finished""#));
}

/// Test sample-and-hold and change detection through the facade.
#[test]
fn snapshot_samples_on_change_pulses() {
    let mut runtime = Runtime::new();
    let level = input(&mut runtime, "level", 3_i64);
    let other = input(&mut runtime, "other", 0_i64);
    let changed = define_call(&mut runtime, "changed", "OnChange", &[other]);
    define_call(&mut runtime, "held", "Snapshot", &[level, changed]);

    runtime.set("level", 8_i64).unwrap();
    runtime.run_round().unwrap();
    assert_eq!(*runtime.get::<i64>("held").unwrap(), 3);

    runtime.set("other", 1_i64).unwrap();
    runtime.run_round().unwrap();
    assert_eq!(*runtime.get::<i64>("held").unwrap(), 8);
    assert!(!runtime.is_provoked("changed").unwrap());
}
