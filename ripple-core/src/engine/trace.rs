//! Round tracing.
//!
//! A [`TraceSink`] observes the engine while a round drains. Events are plain
//! serializable records so they can be asserted on in tests or shipped as
//! JSON lines.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::graph::NodeId;

/// One engine observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// The queue has been seeded from the staged nodes.
    RoundStarted { round: u64, pending: usize },

    /// A node has been evaluated.
    Evaluated {
        node: NodeId,
        kind: &'static str,
        depth: u32,
        changed: bool,
        /// Nodes still pending after this one.
        remaining: usize,
    },

    /// The queue is empty and provoked triggers are about to reset.
    RoundFinished {
        round: u64,
        evaluated: usize,
        provoked: usize,
    },
}

impl TraceEvent {
    /// Serialize as a single JSON object.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Receiver of engine observations.
pub trait TraceSink: Send {
    fn record(&mut self, event: &TraceEvent);
}

/// Sink that stores every event in a shared vector.
///
/// Clones share the same storage, so a test can keep one clone and hand the
/// other to the engine.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Remove and return every event recorded so far.
    pub fn take(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl TraceSink for RecordingSink {
    fn record(&mut self, event: &TraceEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Sink that forwards events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn record(&mut self, event: &TraceEvent) {
        match event {
            TraceEvent::RoundStarted { round, pending } => {
                debug!(target: "ripple::trace", round, pending, "round started");
            }
            TraceEvent::Evaluated {
                node,
                kind,
                depth,
                changed,
                remaining,
            } => {
                debug!(target: "ripple::trace", %node, kind, depth, changed, remaining, "evaluated");
            }
            TraceEvent::RoundFinished {
                round,
                evaluated,
                provoked,
            } => {
                debug!(target: "ripple::trace", round, evaluated, provoked, "round finished");
            }
        }
    }
}
