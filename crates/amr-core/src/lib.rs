//! Core types shared by every component of the AMR fleet simulation: typed ids,
//! a simulation-time newtype, the pinned deterministic RNG, and the error taxonomy.

pub mod error;
pub mod id;
pub mod rng;
pub mod time;

pub use error::{CoreError, CoreResult};
pub use id::{JobId, RobotId, RunId};
pub use rng::SimRng;
pub use time::SimTime;
