//! Ripple Core
//!
//! This crate provides the core runtime for the Ripple reactive computation
//! graph. Users declare named values and momentary triggers related by
//! formulas; when inputs change, the runtime recomputes exactly the affected
//! downstream nodes, in dependency order, exactly once each.
//!
//! It implements:
//!
//! - A node arena with parent/child wiring and a cycle guard
//! - A depth-ordered, round-based evaluation engine
//! - Trigger pulse semantics (provoke for one round, then reset)
//! - An optimizer for constant folding and n-ary rewriting
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: node arena, wiring, depth and cycle invariants
//! - `value`: value node shapes and scalar capabilities
//! - `trigger`: trigger node kinds and trigger-driven values
//! - `engine`: round scheduling and tracing
//! - `optimizer`: rewriting of fresh definitions
//! - `ops` / `functions`: operator catalogue and typed function groups
//! - `runtime`: the host facade
//!
//! # Example
//!
//! ```rust
//! use ripple_core::Runtime;
//!
//! let mut runtime = Runtime::new();
//! let a = runtime.graph_mut().input(2_i64)?;
//! let a = runtime.define("a", a)?;
//! let b = runtime.graph_mut().input(3_i64)?;
//! let b = runtime.define("b", b)?;
//! let c = runtime.call("Sum", &[a, b])?;
//! runtime.define("c", c)?;
//! assert_eq!(*runtime.get::<i64>("c")?, 5);
//!
//! runtime.set("a", 7_i64)?;
//! runtime.run_round()?;
//! assert_eq!(*runtime.get::<i64>("c")?, 10);
//! # Ok::<(), ripple_core::GraphError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod functions;
pub mod graph;
pub mod ops;
pub mod optimizer;
pub mod runtime;
pub mod trigger;
pub mod value;

pub use config::RuntimeConfig;
pub use engine::{Engine, LogSink, RecordingSink, RoundReport, TraceEvent, TraceSink};
pub use error::{EvalError, GraphError, Result};
pub use functions::FunctionRegistry;
pub use graph::{Graph, NodeId, Role};
pub use optimizer::{OptimizeReport, Optimized, Optimizer};
pub use runtime::{Runtime, SharedRuntime};
