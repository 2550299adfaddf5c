//! The fixed-tick deterministic simulation engine and its per-run orchestrator.

pub mod engine;
pub mod runner;

pub use engine::{Assignment, SimConfig, SimulationEngine, World, BATTERY_DRAIN_PER_DISTANCE};
pub use runner::{RunnerParams, SimulationRunner};
