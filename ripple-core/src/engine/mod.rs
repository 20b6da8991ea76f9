//! Evaluation Engine
//!
//! The engine drives rounds over a [`Graph`]. The host stages input writes
//! and trigger pulses, marking the touched nodes dirty; a round then drains
//! them in depth order:
//!
//! 1. Seed the pending queue with every dirty node.
//! 2. Pop the shallowest node and evaluate it.
//! 3. If it changed, queue every subscribed child.
//! 4. When the queue is empty, reset every trigger provoked this round.
//!
//! A failing evaluation aborts the round: the queue is cleared, triggers
//! provoked so far are reset and the error is returned. Values computed
//! before the failure are kept.

mod trace;

pub use trace::{LogSink, RecordingSink, TraceEvent, TraceSink};

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::graph::{Graph, NodeId, PendingQueue, Role};

/// Outcome of one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    /// Sequence number of the round, starting at 1.
    pub round: u64,

    /// Every evaluated node, in evaluation order.
    pub evaluated: Vec<NodeId>,

    /// Number of evaluations that reported a change.
    pub changed: usize,

    /// Number of triggers provoked (and reset) during the round.
    pub provoked: usize,
}

/// Round scheduler over a graph.
#[derive(Default)]
pub struct Engine {
    queue: PendingQueue,
    staged: IndexSet<NodeId>,
    sink: Option<Box<dyn TraceSink>>,
    rounds: u64,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("staged", &self.staged)
            .field("rounds", &self.rounds)
            .field("traced", &self.sink.is_some())
            .finish()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a trace sink, returning the previous one.
    pub fn set_sink(&mut self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        std::mem::replace(&mut self.sink, sink)
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Mark a node for evaluation in the next round.
    pub fn mark_dirty(&mut self, id: NodeId) {
        self.staged.insert(id);
    }

    /// Whether any node is waiting for the next round.
    pub fn has_pending(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Number of rounds started so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Drain every dirty node and its affected descendants.
    pub fn run_round(&mut self, graph: &mut Graph) -> Result<RoundReport> {
        self.rounds += 1;
        let mut report = RoundReport {
            round: self.rounds,
            ..RoundReport::default()
        };

        for id in self.staged.drain(..) {
            if let Some(node) = graph.get(id) {
                self.queue.push(id, node.depth());
            }
        }
        debug!(round = report.round, pending = self.queue.len(), "round started");
        self.emit(TraceEvent::RoundStarted {
            round: report.round,
            pending: self.queue.len(),
        });

        let mut changed = HashSet::new();
        let mut provoked = Vec::new();
        while let Some((id, depth)) = self.queue.pop() {
            let Some(kind) = graph.get(id).map(|node| node.kind()) else {
                continue;
            };
            let did_change = match graph.evaluate(id, &changed) {
                Ok(did_change) => did_change,
                Err(err) => {
                    warn!(round = report.round, node = %id, error = %err, "round aborted");
                    self.queue.clear();
                    for trigger in provoked {
                        graph.reset(trigger);
                    }
                    return Err(err);
                }
            };
            report.evaluated.push(id);

            if did_change {
                report.changed += 1;
                changed.insert(id);
                if let Some(node) = graph.get(id) {
                    if node.role() == Role::Trigger {
                        provoked.push(id);
                    }
                    for child in node.children() {
                        if let Some(child_node) = graph.get(*child) {
                            self.queue.push(*child, child_node.depth());
                        }
                    }
                }
            }

            trace!(node = %id, kind, depth, changed = did_change, "evaluated");
            self.emit(TraceEvent::Evaluated {
                node: id,
                kind,
                depth,
                changed: did_change,
                remaining: self.queue.len(),
            });
        }

        report.provoked = provoked.len();
        self.emit(TraceEvent::RoundFinished {
            round: report.round,
            evaluated: report.evaluated.len(),
            provoked: report.provoked,
        });
        for trigger in provoked {
            graph.reset(trigger);
        }
        debug!(
            round = report.round,
            evaluated = report.evaluated.len(),
            changed = report.changed,
            provoked = report.provoked,
            "round finished"
        );
        Ok(report)
    }

    fn emit(&mut self, event: TraceEvent) {
        if let Some(sink) = self.sink.as_mut() {
            sink.record(&event);
        }
    }
}
