//! Function groups
//!
//! A function group maps a name to a set of typed overloads. Calling a group
//! resolves the overload from the number and ports of the argument nodes and
//! builds the node through the graph factories:
//!
//! 1. no group with that name: [`GraphError::UnknownFunction`]
//! 2. no overload takes that many arguments: [`GraphError::Arity`]
//! 3. no overload accepts the argument types: [`GraphError::NoOverload`]
//!
//! Associative groups called with a single argument build a passthrough
//! instead of a one-operand node.

use indexmap::IndexMap;

use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeId, Port};
use crate::ops;
use crate::trigger::GateRule;
use crate::value::{cast, Arithmetic, Bitwise, CastFrom, Comparison, FloatingPoint, Scalar};

/// Node factory of one overload. Receives arguments already checked
/// against the overload's parameters.
pub type Build = fn(&mut Graph, &[NodeId]) -> Result<NodeId>;

/// One typed signature of a function group.
#[derive(Clone)]
pub struct Overload {
    params: Vec<Port>,
    variadic: bool,
    build: Build,
}

impl Overload {
    /// Exactly one argument per parameter.
    pub fn fixed(params: Vec<Port>, build: Build) -> Self {
        Self {
            params,
            variadic: false,
            build,
        }
    }

    /// One or more arguments, all accepted by `port`.
    pub fn variadic(port: Port, build: Build) -> Self {
        Self {
            params: vec![port],
            variadic: true,
            build,
        }
    }

    fn takes(&self, count: usize) -> bool {
        if self.variadic {
            count >= 1
        } else {
            count == self.params.len()
        }
    }

    fn accepts(&self, offered: &[Port]) -> bool {
        if self.variadic {
            offered.iter().all(|port| self.params[0].accepts(port))
        } else {
            self.params
                .iter()
                .zip(offered)
                .all(|(param, port)| param.accepts(port))
        }
    }

    fn arity(&self) -> String {
        if self.variadic {
            "1 or more".into()
        } else {
            self.params.len().to_string()
        }
    }
}

impl std::fmt::Debug for Overload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overload")
            .field("params", &self.params)
            .field("variadic", &self.variadic)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct FunctionGroup {
    associative: bool,
    overloads: Vec<Overload>,
}

/// Registry of function groups by name.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    groups: IndexMap<&'static str, FunctionGroup>,
}

impl FunctionRegistry {
    /// A registry without any function.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an overload to a group, creating the group on first use.
    ///
    /// A group stays associative only if every registration says so.
    pub fn register(&mut self, name: &'static str, associative: bool, overload: Overload) {
        let group = self.groups.entry(name).or_insert(FunctionGroup {
            associative,
            overloads: Vec::new(),
        });
        group.associative &= associative;
        group.overloads.push(overload);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Registered group names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.groups.keys().copied()
    }

    /// Resolve `name` against the arguments and build the node.
    pub fn call(&self, graph: &mut Graph, name: &str, args: &[NodeId]) -> Result<NodeId> {
        let group = self
            .groups
            .get(name)
            .ok_or_else(|| GraphError::UnknownFunction(name.to_string()))?;

        let candidates: Vec<&Overload> = group
            .overloads
            .iter()
            .filter(|overload| overload.takes(args.len()))
            .collect();
        if candidates.is_empty() {
            let mut arities: Vec<String> = group.overloads.iter().map(Overload::arity).collect();
            arities.dedup();
            return Err(GraphError::Arity {
                kind: name.to_string(),
                expected: arities.join(" or "),
                found: args.len(),
            });
        }

        let offered = args
            .iter()
            .map(|arg| graph.node(*arg).map(|node| node.behavior().output()))
            .collect::<Result<Vec<_>>>()?;
        let overload = candidates
            .into_iter()
            .find(|overload| overload.accepts(&offered))
            .ok_or_else(|| GraphError::NoOverload {
                function: name.to_string(),
                found: offered
                    .iter()
                    .map(Port::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;

        match args {
            [single] if group.associative => graph.passthrough(*single),
            _ => (overload.build)(graph, args),
        }
    }

    /// The built-in catalogue.
    pub fn builtins() -> Self {
        let mut registry = Self::new();
        register_values(&mut registry);
        register_triggers(&mut registry);
        registry
    }
}

/// Destructure arguments the overload has already counted.
fn fixed<const N: usize>(kind: &str, args: &[NodeId]) -> Result<[NodeId; N]> {
    <[NodeId; N]>::try_from(args).map_err(|_| GraphError::Arity {
        kind: kind.to_string(),
        expected: N.to_string(),
        found: args.len(),
    })
}

macro_rules! nary_builders {
    ($($builder:ident => $op:ident: $bound:ident),* $(,)?) => {
        $(fn $builder<T: $bound>(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
            graph.nary(ops::$op::<T>(), args.to_vec())
        })*
    };
}

macro_rules! unary_builders {
    ($($builder:ident => $kind:literal, $op:ident: $bound:ident),* $(,)?) => {
        $(fn $builder<T: $bound>(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
            let [a] = fixed($kind, args)?;
            graph.unary($kind, ops::$op::<T>, a)
        })*
    };
}

macro_rules! binary_builders {
    ($($builder:ident => $kind:literal, $op:ident: $bound:ident),* $(,)?) => {
        $(fn $builder<T: $bound>(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
            let [a, b] = fixed($kind, args)?;
            graph.binary($kind, ops::$op::<T>, a, b)
        })*
    };
}

macro_rules! cast_builders {
    ($($builder:ident => $kind:literal, $target:ty),* $(,)?) => {
        $(fn $builder<S: Scalar>(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId>
        where
            $target: CastFrom<S>,
        {
            let [a] = fixed($kind, args)?;
            graph.unary($kind, cast::<S, $target>, a)
        })*
    };
}

macro_rules! gate_builders {
    ($($builder:ident => $rule:expr),* $(,)?) => {
        $(fn $builder(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
            graph.gate($rule, args.to_vec())
        })*
    };
}

nary_builders! {
    sum_of => sum: Arithmetic,
    product_of => product: Arithmetic,
    min_of => minimum: Comparison,
    max_of => maximum: Comparison,
    and_of => bits_and: Bitwise,
    or_of => bits_or: Bitwise,
    xor_of => bits_xor: Bitwise,
}

unary_builders! {
    neg_of => "Neg", negate: Arithmetic,
    not_of => "Not", bit_not: Bitwise,
    sqrt_of => "Sqrt", square_root: FloatingPoint,
    floor_of => "Floor", floor: FloatingPoint,
    ceil_of => "Ceil", ceil: FloatingPoint,
    abs_of => "Abs", abs: FloatingPoint,
}

binary_builders! {
    sub_of => "Sub", subtract: Arithmetic,
    div_of => "Div", divide: Arithmetic,
    rem_of => "Rem", remainder: Arithmetic,
    lt_of => "Lt", less: Comparison,
    gt_of => "Gt", greater: Comparison,
    eq_of => "Eq", equal: Scalar,
    ne_of => "Ne", not_equal: Scalar,
}

cast_builders! {
    to_float => "ToFloat", f64,
    to_int => "ToInt", i64,
    to_text => "ToText", String,
}

gate_builders! {
    any_gate => GateRule::Any,
    all_gate => GateRule::All,
    only_one_gate => GateRule::OnlyOne,
    xor_gate => GateRule::Xor,
}

fn concat_of(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    graph.nary(ops::concat(), args.to_vec())
}

fn len_of(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    let [text] = fixed("Len", args)?;
    graph.unary("Len", ops::length, text)
}

fn clamp_of<T: Comparison>(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    let [value, low, high] = fixed("Clamp", args)?;
    graph.ternary("Clamp", ops::clamp::<T>, value, low, high)
}

fn select_of<T: Scalar>(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    let [condition, then, otherwise] = fixed("If", args)?;
    graph.select::<T>(condition, then, otherwise)
}

fn select_trigger_of(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    let [condition, then, otherwise] = fixed("If", args)?;
    graph.select_trigger(condition, then, otherwise)
}

fn snapshot_of<T: Scalar>(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    let [value, trigger] = fixed("Snapshot", args)?;
    graph.snapshot::<T>(value, trigger)
}

fn on_change_of(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    graph.on_change(args.to_vec())
}

fn rising_of(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    let [level] = fixed("Rising", args)?;
    graph.rising(level)
}

fn falling_of(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    let [level] = fixed("Falling", args)?;
    graph.falling(level)
}

fn when_true_of(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    let [level] = fixed("WhenTrue", args)?;
    graph.when_true(level)
}

fn toggle_of(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    let [trigger] = fixed("Toggle", args)?;
    graph.toggle(trigger, false)
}

fn count_of(graph: &mut Graph, args: &[NodeId]) -> Result<NodeId> {
    let [trigger] = fixed("Count", args)?;
    graph.counter(trigger)
}

/// Register one overload per listed type.
macro_rules! overloads {
    ($registry:ident, $name:literal, $assoc:expr, variadic $builder:ident, [$($ty:ty),*]) => {
        $($registry.register(
            $name,
            $assoc,
            Overload::variadic(Port::value::<$ty>(), $builder::<$ty>),
        );)*
    };
    ($registry:ident, $name:literal, $builder:ident, [$($ty:ty),*], $arity:literal) => {
        $($registry.register(
            $name,
            false,
            Overload::fixed(vec![Port::value::<$ty>(); $arity], $builder::<$ty>),
        );)*
    };
}

fn register_values(registry: &mut FunctionRegistry) {
    overloads!(registry, "Sum", true, variadic sum_of, [i64, i32, f64, f32]);
    overloads!(registry, "Product", true, variadic product_of, [i64, i32, f64, f32]);
    overloads!(registry, "Min", true, variadic min_of, [i64, i32, f64, f32, String]);
    overloads!(registry, "Max", true, variadic max_of, [i64, i32, f64, f32, String]);
    overloads!(registry, "And", true, variadic and_of, [bool, i64, i32]);
    overloads!(registry, "Or", true, variadic or_of, [bool, i64, i32]);
    overloads!(registry, "Xor", true, variadic xor_of, [bool, i64, i32]);
    registry.register(
        "Concat",
        true,
        Overload::variadic(Port::value::<String>(), concat_of),
    );

    overloads!(registry, "Neg", neg_of, [i64, i32, f64, f32], 1);
    overloads!(registry, "Not", not_of, [bool, i64, i32], 1);
    overloads!(registry, "Sqrt", sqrt_of, [f64, f32], 1);
    overloads!(registry, "Floor", floor_of, [f64, f32], 1);
    overloads!(registry, "Ceil", ceil_of, [f64, f32], 1);
    overloads!(registry, "Abs", abs_of, [f64, f32], 1);
    registry.register(
        "Len",
        false,
        Overload::fixed(vec![Port::value::<String>()], len_of),
    );

    overloads!(registry, "Sub", sub_of, [i64, i32, f64, f32], 2);
    overloads!(registry, "Div", div_of, [i64, i32, f64, f32], 2);
    overloads!(registry, "Rem", rem_of, [i64, i32, f64, f32], 2);
    overloads!(registry, "Lt", lt_of, [i64, i32, f64, f32, String], 2);
    overloads!(registry, "Gt", gt_of, [i64, i32, f64, f32, String], 2);
    overloads!(registry, "Eq", eq_of, [bool, i64, i32, f64, f32, String], 2);
    overloads!(registry, "Ne", ne_of, [bool, i64, i32, f64, f32, String], 2);
    overloads!(registry, "Clamp", clamp_of, [i64, i32, f64, f32], 3);

    overloads!(registry, "ToFloat", to_float, [i64, i32, f32, String], 1);
    overloads!(registry, "ToInt", to_int, [i32, f64, bool, String], 1);
    overloads!(registry, "ToText", to_text, [bool, i32, i64, f64], 1);

    macro_rules! select {
        ($($ty:ty),*) => {
            $(registry.register(
                "If",
                false,
                Overload::fixed(
                    vec![Port::value::<bool>(), Port::value::<$ty>(), Port::value::<$ty>()],
                    select_of::<$ty>,
                ),
            );)*
        };
    }
    select!(bool, i64, i32, f64, f32, String);
}

fn register_triggers(registry: &mut FunctionRegistry) {
    registry.register("Any", true, Overload::variadic(Port::Trigger, any_gate));
    registry.register("All", true, Overload::variadic(Port::Trigger, all_gate));
    registry.register("OnlyOne", false, Overload::variadic(Port::Trigger, only_one_gate));
    registry.register("Xor", true, Overload::variadic(Port::Trigger, xor_gate));
    registry.register(
        "If",
        false,
        Overload::fixed(
            vec![Port::value::<bool>(), Port::Trigger, Port::Trigger],
            select_trigger_of,
        ),
    );

    registry.register("OnChange", false, Overload::variadic(Port::Any, on_change_of));
    for (name, build) in [
        ("Rising", rising_of as Build),
        ("Falling", falling_of),
        ("WhenTrue", when_true_of),
    ] {
        registry.register(name, false, Overload::fixed(vec![Port::value::<bool>()], build));
    }
    registry.register("Toggle", false, Overload::fixed(vec![Port::Trigger], toggle_of));
    registry.register("Count", false, Overload::fixed(vec![Port::Trigger], count_of));

    macro_rules! snapshot {
        ($($ty:ty),*) => {
            $(registry.register(
                "Snapshot",
                false,
                Overload::fixed(vec![Port::value::<$ty>(), Port::Trigger], snapshot_of::<$ty>),
            );)*
        };
    }
    snapshot!(bool, i64, i32, f64, f32, String);
}
