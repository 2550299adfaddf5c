//! The event envelope, routing-key contract, and in-process `amr.events` bus shared
//! by the simulation engine and dispatcher.

pub mod bus;
pub mod envelope;
pub mod events;

pub use bus::{EventBus, EventMessage, InProcessEventBus};
pub use envelope::{Envelope, RoutingKey};
pub use events::{
    to_canonical_json, DispatchReason, JobAssignedEvent, JobCompletedEvent, JobCreatedEvent,
    JobFailedEvent, RobotUpdatedEvent, RunCompletedEvent, RunStartedEvent, SnapshotTickEvent,
    TelemetryReceivedEvent,
};
