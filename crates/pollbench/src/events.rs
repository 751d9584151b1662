//! Bench event bus — typed events for live consumers.
//!
//! The EventBus is a `tokio::sync::broadcast` channel carrying
//! [`BenchEvent`] values. The dashboard's SSE endpoint subscribes to it.
//! When no subscribers exist, events are silently dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::ledger::{LogEntry, Totals};

/// Every event the bench emits. Serialized to JSON for SSE.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BenchEvent {
    SimulationStarted {
        poll_id: u32,
        candidate_id: u32,
        workers_per_tick: usize,
        tick_ms: u64,
        duration_secs: u64,
    },
    Logged {
        entry: LogEntry,
    },
    SimulationFinished {
        totals: Totals,
        elapsed_ms: u64,
    },
}

/// Broadcast bus for [`BenchEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BenchEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers. Silently ignores if no subscribers.
    pub fn emit(&self, event: BenchEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<BenchEvent> {
        self.sender.subscribe()
    }
}
