use ndnfw_dsa::{FaceId, Name, Status};
use tokio::sync::broadcast;

use crate::pit::TerminalOutcome;

/// Notifications published by the forwarding core.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwarderEvent {
    StatusChanged {
        prefix: Name,
        face: FaceId,
        from: Status,
        to: Status,
    },
    InterestSent {
        name: Name,
        face: FaceId,
    },
    NotForwarded {
        name: Name,
    },
    BudgetReleased {
        name: Name,
        face: FaceId,
        outcome: TerminalOutcome,
    },
}

/// Fan-out of [`ForwarderEvent`]s to independent subscribers.
/// Slow subscribers lag; they never block the core.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ForwarderEvent>,
}

impl EventBus {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ForwarderEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn publish(&self, event: ForwarderEvent) {
        // No subscribers is the common case and not an error.
        let _ = self.tx.send(event);
    }
}
