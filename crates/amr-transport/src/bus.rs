//! The `amr.events` topic-exchange contract, realized as an in-process trait so the
//! simulation/dispatcher core can be exercised without a running broker. A
//! broker-backed implementation of the same trait is an external deployment concern.

use crate::envelope::RoutingKey;
use serde_json::Value;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct EventMessage {
    pub routing_key: RoutingKey,
    /// Canonical (sorted-key, compact) JSON body, matching the wire contract a
    /// broker-backed bus would carry even though no bytes actually cross a process
    /// boundary here.
    pub payload: Value,
}

pub trait EventBus: Send + Sync {
    fn publish(&self, routing_key: RoutingKey, payload: Value);
    fn subscribe(&self) -> broadcast::Receiver<EventMessage>;
}

/// Durable, at-least-once delivery is not needed in-process; every subscriber just
/// gets a lagged-tolerant broadcast receiver and filters by routing key, mirroring how
/// the original binds specific queues to specific routing keys on one topic exchange.
pub struct InProcessEventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl InProcessEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl EventBus for InProcessEventBus {
    fn publish(&self, routing_key: RoutingKey, payload: Value) {
        // No subscribers yet (e.g. in a unit test) is not an error; the broker
        // equivalent would simply have no bound queues.
        let _ = self.sender.send(EventMessage { routing_key, payload });
    }

    fn subscribe(&self) -> broadcast::Receiver<EventMessage> {
        self.sender.subscribe()
    }
}
