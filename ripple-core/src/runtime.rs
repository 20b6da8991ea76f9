//! Runtime facade
//!
//! The [`Runtime`] owns the graph, the engine and the function registry, and
//! exposes the host view of a reactive program: named definitions that can
//! be read, written, provoked and driven round by round.
//!
//! # Definitions
//!
//! A definition binds a qualified name (`plant.boiler.temp`) to a node:
//!
//! 1. If the node is already live or already named, it is wrapped in a
//!    passthrough so that the new name gets a node identity of its own.
//! 2. The fresh subgraph is optimized (unless disabled).
//! 3. Every fresh node is committed, so that it starts receiving changes.
//!
//! Optimizing may replace fresh nodes. Handles to them are dead afterwards;
//! the handle returned by [`Runtime::define`] stands for the definition.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::config::RuntimeConfig;
use crate::engine::{Engine, LogSink, RoundReport, TraceSink};
use crate::error::{GraphError, Result};
use crate::functions::FunctionRegistry;
use crate::graph::{Graph, NodeId, Role};
use crate::optimizer::Optimizer;
use crate::value::Scalar;

/// A runtime shared between threads. Rounds stay serialized by the lock.
pub type SharedRuntime = Arc<Mutex<Runtime>>;

#[derive(Debug)]
pub struct Runtime {
    config: RuntimeConfig,
    graph: Graph,
    engine: Engine,
    functions: FunctionRegistry,
    optimizer: Optimizer,
    names: IndexMap<String, NodeId>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Create a runtime with the default configuration and the built-in
    /// functions.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let mut engine = Engine::new();
        if config.log_trace {
            engine.set_sink(Some(Box::new(LogSink)));
        }
        Self {
            optimizer: Optimizer::new(config.max_optimizer_passes),
            config,
            graph: Graph::new(),
            engine,
            functions: FunctionRegistry::builtins(),
            names: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access for building nodes with the typed factories.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    /// Build a node by calling a function group.
    pub fn call(&mut self, function: &str, args: &[NodeId]) -> Result<NodeId> {
        self.functions.call(&mut self.graph, function, args)
    }

    /// Bind `name` to `root`, optimize and commit its fresh subgraph.
    pub fn define(&mut self, name: &str, root: NodeId) -> Result<NodeId> {
        validate_name(name)?;
        if self.names.contains_key(name) {
            return Err(GraphError::DuplicateName(name.to_string()));
        }

        let node = self.graph.node(root)?;
        let mut root = if node.is_live() || self.names.values().any(|named| *named == root) {
            self.graph.passthrough(root)?
        } else {
            root
        };
        if self.config.optimize {
            root = self.optimizer.optimize(&mut self.graph, root)?.root;
        }

        let fresh = self.graph.fresh_subgraph(root);
        for id in &fresh {
            self.graph.commit(*id)?;
        }
        debug!(name, %root, committed = fresh.len(), "defined");
        self.names.insert(name.to_string(), root);
        Ok(root)
    }

    /// The node bound to `name`.
    pub fn lookup(&self, name: &str) -> Result<NodeId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownName(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Defined names, in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.keys().map(String::as_str)
    }

    /// The current value of a named value.
    pub fn get<T: Scalar>(&self, name: &str) -> Result<&T> {
        self.graph.value(self.lookup(name)?)
    }

    /// Stage a new value for a named input. Takes effect in the next round.
    pub fn set<T: Scalar>(&mut self, name: &str, value: T) -> Result<()> {
        let id = self.lookup(name)?;
        self.graph.stage_input(id, value)?;
        self.engine.mark_dirty(id);
        Ok(())
    }

    /// Request a pulse from a named input trigger in the next round.
    pub fn provoke(&mut self, name: &str) -> Result<()> {
        let id = self.lookup(name)?;
        self.graph.stage_provoke(id)?;
        self.engine.mark_dirty(id);
        Ok(())
    }

    /// Whether a named trigger is provoked. Always false outside of a round.
    pub fn is_provoked(&self, name: &str) -> Result<bool> {
        let id = self.lookup(name)?;
        if self.graph.node(id)?.role() != Role::Trigger {
            return Err(GraphError::NotATrigger(id));
        }
        Ok(self.graph.is_provoked(id))
    }

    pub fn has_pending(&self) -> bool {
        self.engine.has_pending()
    }

    /// Propagate every staged change.
    pub fn run_round(&mut self) -> Result<RoundReport> {
        self.engine.run_round(&mut self.graph)
    }

    /// Debug text of a named node, down to the configured depth.
    pub fn describe(&self, name: &str) -> Result<String> {
        self.graph
            .describe(self.lookup(name)?, self.config.describe_depth)
    }

    /// Install a trace sink, returning the previous one.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        self.engine.set_sink(sink)
    }

    pub fn into_shared(self) -> SharedRuntime {
        Arc::new(Mutex::new(self))
    }
}

/// Accept dotted sequences of ASCII identifiers.
fn validate_name(name: &str) -> Result<()> {
    let valid = name.split('.').all(|segment| {
        let mut chars = segment.chars();
        chars
            .next()
            .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if valid {
        Ok(())
    } else {
        Err(GraphError::InvalidName(name.to_string()))
    }
}
