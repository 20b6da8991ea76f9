//! Graph Optimizer
//!
//! The optimizer rewrites the fresh (not yet committed) part of a definition
//! before it goes live. It works bottom-up over the fresh subgraph of a
//! root and repeats until a pass applies nothing:
//!
//! - **Constant folding**: a node whose inputs can never change is replaced
//!   by a literal holding its current value, or by a trigger that never
//!   fires.
//! - **Identity elimination**: n-ary operands equal to the operation's
//!   identity are dropped while at least one operand remains.
//! - **Flattening**: an associative n-ary node absorbs the operands of a
//!   fresh operand of the same operation.
//! - **Parent reduction**: idempotent operations drop duplicate operands,
//!   commutative operations merge their literal operands into one.
//! - **Passthrough**: an n-ary node left with a single operand becomes a
//!   shell over it.
//!
//! Every rewrite builds a replacement node, re-points the readers of the old
//! node to it, detaches the old node and prunes fresh ancestors nothing
//! reads anymore. Results are preserved for every future input sequence.

use std::collections::HashMap;

use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::{Behavior, Graph, Node, NodeId, ParentCollection};

/// Counters of the rewrites applied by one [`Optimizer::optimize`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeReport {
    pub passes: usize,
    pub folded: usize,
    pub identities: usize,
    pub flattened: usize,
    pub reduced: usize,
    pub passthroughs: usize,
    pub pruned: usize,
}

impl OptimizeReport {
    /// Total number of rewrites, not counting pruned ancestors.
    pub fn rewrites(&self) -> usize {
        self.folded + self.identities + self.flattened + self.reduced + self.passthroughs
    }

    fn absorb(&mut self, pass: &OptimizeReport) {
        self.folded += pass.folded;
        self.identities += pass.identities;
        self.flattened += pass.flattened;
        self.reduced += pass.reduced;
        self.passthroughs += pass.passthroughs;
        self.pruned += pass.pruned;
    }
}

/// Result of optimizing a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Optimized {
    /// The node now standing for the definition. Differs from the input
    /// root when the root itself was rewritten.
    pub root: NodeId,
    pub report: OptimizeReport,
}

#[derive(Debug, Clone, Copy)]
pub struct Optimizer {
    max_passes: usize,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(16)
    }
}

impl Optimizer {
    pub fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// Rewrite the fresh subgraph of `root` until it is stable.
    pub fn optimize(&self, graph: &mut Graph, root: NodeId) -> Result<Optimized> {
        graph.node(root)?;
        let mut report = OptimizeReport::default();
        let mut root = root;

        while report.passes < self.max_passes {
            report.passes += 1;
            let mut pass = Pass {
                graph: &mut *graph,
                root,
                constants: HashMap::new(),
                report: OptimizeReport::default(),
            };
            for id in pass.graph.fresh_subgraph(root) {
                pass.visit(id)?;
            }
            root = pass.root;
            let applied = pass.report;
            report.absorb(&applied);

            debug!(
                pass = report.passes,
                rewrites = applied.rewrites(),
                pruned = applied.pruned,
                "optimizer pass"
            );
            if applied.rewrites() == 0 {
                break;
            }
        }

        debug!(
            %root,
            passes = report.passes,
            folded = report.folded,
            identities = report.identities,
            flattened = report.flattened,
            reduced = report.reduced,
            passthroughs = report.passthroughs,
            pruned = report.pruned,
            "optimized"
        );
        Ok(Optimized { root, report })
    }
}

/// One bottom-up sweep over the fresh subgraph.
struct Pass<'a> {
    graph: &'a mut Graph,
    root: NodeId,
    constants: HashMap<NodeId, bool>,
    report: OptimizeReport,
}

impl Pass<'_> {
    fn visit(&mut self, id: NodeId) -> Result<()> {
        let Some(node) = self.graph.get(id) else {
            return Ok(());
        };
        let behavior = node.behavior();
        if node.is_live() || behavior.is_literal() || behavior.is_source() {
            return Ok(());
        }
        let nary = behavior.as_nary().is_some();

        if self.is_constant(id) {
            return self.fold(id);
        }
        if nary {
            self.reduce(id)?;
        }
        Ok(())
    }

    /// Whether a node can never change: a literal, or a non-source whose
    /// parents are all constant.
    fn is_constant(&mut self, id: NodeId) -> bool {
        let mut stack = vec![(id, false)];
        while let Some((current, expanded)) = stack.pop() {
            if self.constants.contains_key(&current) {
                continue;
            }
            let Some(node) = self.graph.get(current) else {
                self.constants.insert(current, false);
                continue;
            };
            let behavior = node.behavior();
            if behavior.is_literal() || behavior.is_source() {
                self.constants.insert(current, behavior.is_literal());
            } else if expanded {
                let constant = node
                    .parents()
                    .iter()
                    .all(|parent| self.constants.get(&parent).copied().unwrap_or(false));
                self.constants.insert(current, constant);
            } else {
                stack.push((current, true));
                stack.extend(
                    node.parents()
                        .iter()
                        .filter(|parent| !self.constants.contains_key(parent))
                        .map(|parent| (parent, false)),
                );
            }
        }
        self.constants.get(&id).copied().unwrap_or(false)
    }

    fn fold(&mut self, id: NodeId) -> Result<()> {
        let Some(frozen) = self.graph.node(id)?.behavior().freeze() else {
            return Ok(());
        };
        let literal = self.graph.add_node(frozen, ParentCollection::new())?;
        self.constants.insert(literal, true);
        self.substitute(id, literal)?;
        self.report.folded += 1;
        Ok(())
    }

    /// Identity elimination, flattening, parent reduction and passthrough
    /// of one n-ary node.
    fn reduce(&mut self, id: NodeId) -> Result<()> {
        let graph = &*self.graph;
        let node = graph.node(id)?;
        let Some(shape) = node.behavior().as_nary() else {
            return Ok(());
        };
        let flags = shape.flags();
        let key = shape.op_key();
        let original = node.parents().list_at(0).to_vec();
        let is_literal = |id: &NodeId| graph.get(*id).is_some_and(|n| n.behavior().is_literal());

        let mut parents: Vec<NodeId> = original
            .iter()
            .copied()
            .filter(|parent| {
                !graph
                    .get(*parent)
                    .is_some_and(|parent| shape.is_identity(parent.behavior()))
            })
            .collect();
        if parents.is_empty() {
            parents.extend(original.first().copied());
        }
        let identities = original.len() - parents.len();

        let mut flattened = 0;
        if flags.associative {
            let mut flat = Vec::with_capacity(parents.len());
            for parent in parents {
                match graph.get(parent) {
                    Some(inner)
                        if !inner.is_live()
                            && inner
                                .behavior()
                                .as_nary()
                                .is_some_and(|inner| inner.op_key() == key) =>
                    {
                        flat.extend_from_slice(inner.parents().list_at(0));
                        flattened += 1;
                    }
                    _ => flat.push(parent),
                }
            }
            parents = flat;
        }

        let mut reduced = 0;
        if flags.idempotent {
            let unique: IndexSet<NodeId> = parents.iter().copied().collect();
            reduced += parents.len() - unique.len();
            parents = unique.into_iter().collect();
        }

        let mut merged = None;
        if flags.commutative {
            let (literals, rest): (Vec<NodeId>, Vec<NodeId>) =
                parents.iter().copied().partition(|parent| is_literal(parent));
            if literals.len() >= 2 {
                let behaviors: Vec<&dyn Behavior> = literals
                    .iter()
                    .filter_map(|literal| graph.get(*literal))
                    .map(Node::behavior)
                    .collect();
                let folded = shape
                    .fold_literals(&behaviors)
                    .map_err(|source| GraphError::eval(id, source))?;
                reduced += literals.len() - 1;
                merged = Some(folded);
                parents = rest;
            }
        }

        if let Some(literal) = merged {
            let literal = self.graph.add_node(literal, ParentCollection::new())?;
            self.constants.insert(literal, true);
            parents.push(literal);
        }

        if parents.len() == 1 {
            let shell = self.graph.passthrough(parents[0])?;
            self.substitute(id, shell)?;
            self.report.passthroughs += 1;
        } else if parents != original {
            let rebuilt = self
                .graph
                .rebuild_with_parents(id, ParentCollection::new().with_list(parents))?;
            self.substitute(id, rebuilt)?;
        } else {
            return Ok(());
        }

        self.report.identities += identities;
        self.report.flattened += flattened;
        self.report.reduced += reduced;
        Ok(())
    }

    /// Put `new` in place of `old`, detach `old` and prune what it left
    /// behind.
    fn substitute(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        self.graph.replace(old, new)?;
        if self.root == old {
            self.root = new;
        }
        let parents: Vec<NodeId> = self.graph.node(old)?.parents().iter().collect();
        self.graph.detach(old)?;
        self.constants.remove(&old);
        self.report.pruned += self.graph.prune_orphans(parents);
        Ok(())
    }
}
