//! Dispatch worker: baseline EDF heuristic and GA replanning over the in-process
//! event bus.

pub mod baseline;
pub mod state;
pub mod worker;

pub use baseline::{compute_baseline_assignments, BaselineAssignment};
pub use state::{DispatcherConfig, RunData, RunState};
pub use worker::Dispatcher;
