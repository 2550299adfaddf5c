//! Robot/Job domain entities and the fleet scale map.

pub mod job;
pub mod robot;
pub mod scale;

pub use job::{sort_key, Job, JobState};
pub use robot::{Robot, RobotState};
pub use scale::{ScaleCounts, ScaleMap};

/// Dispatch mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Baseline,
    Ga,
}

impl RunMode {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            RunMode::Baseline => "baseline",
            RunMode::Ga => "ga",
        }
    }

    pub fn from_wire_str(s: &str) -> Option<Self> {
        match s {
            "baseline" => Some(RunMode::Baseline),
            "ga" => Some(RunMode::Ga),
            _ => None,
        }
    }
}

pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
