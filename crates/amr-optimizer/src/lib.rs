//! The GA optimizer RPC boundary: server (`/optimize`, `/health`) and client.

pub mod client;
pub mod schemas;
pub mod server;

pub use client::{request_ga_plan, OptimizerClientError};
pub use server::{run_server, OptimizerState};
