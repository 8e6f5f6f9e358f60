//! Domain event system — decoupled observation of agent runs.
//!
//! Events are published when something interesting happens during a run.
//! Observers (logging sinks, dashboards, tests) subscribe without coupling
//! to the driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The model answered one iteration
    ModelCalled {
        ticket_id: String,
        model: String,
        iteration: u32,
        tokens_used: Option<u32>,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed (or failed to resolve)
    ToolExecuted {
        ticket_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A guard rail overrode the model
    GuardRailTriggered {
        ticket_id: String,
        rule: String,
        timestamp: DateTime<Utc>,
    },

    /// A driver run reached a terminal state
    RunFinished {
        ticket_id: String,
        success: bool,
        iterations: u32,
        tool_calls: usize,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        if self.sender.send(Arc::new(event)).is_err() {
            tracing::trace!("Event dropped: no subscribers");
        }
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
