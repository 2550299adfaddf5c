//! Per-run dispatcher state, grounded in the original `RunState`
//! dataclass and its three `asyncio.Lock`s.

use std::collections::{HashMap, HashSet, VecDeque};

use amr_core::{JobId, RobotId, RunId};
use amr_entities::{Job, Robot, RunMode};
use amr_ga::GaParams;
use tokio::sync::Mutex;

/// Static per-run dispatcher knobs, normally loaded by `amr-config`.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub battery_threshold: f64,
    pub ga_replan_interval_s: i64,
    pub optimizer_url: String,
    pub ga_params: GaParams,
    pub default_mode: RunMode,
    pub default_seed: u64,
    pub default_scale: String,
}

#[derive(Debug, Default)]
pub struct RunData {
    pub robots: HashMap<RobotId, Robot>,
    pub jobs: HashMap<JobId, Job>,
    pub assigned_jobs: HashSet<JobId>,
    pub pending_assignments: HashMap<RobotId, JobId>,
    pub planned_queues: HashMap<RobotId, VecDeque<JobId>>,
}

/// `data` is the aliasing guard the plain maps need to be shared across concurrently
/// running event handlers; it has no equivalent in the original, whose handlers never
/// truly run in parallel. `replan_lock`, `baseline_lock`, and `assign_lock` carry the
/// same split the original keeps: the GA in-flight flag, the once-per-tick baseline
/// debounce, and the assignment idempotency check are three separate critical
/// sections, not one.
pub struct RunState {
    pub run_id: RunId,
    pub mode: RunMode,
    pub seed: u64,
    pub scale: String,
    pub data: Mutex<RunData>,
    pub replan_lock: Mutex<bool>,
    pub baseline_lock: Mutex<Option<i64>>,
    pub assign_lock: Mutex<()>,
    pub next_periodic_replan_sim_s: Mutex<Option<i64>>,
}

impl RunState {
    pub fn new(run_id: RunId, mode: RunMode, seed: u64, scale: String, ga_replan_interval_s: i64) -> Self {
        let next = if ga_replan_interval_s > 0 {
            Some(ga_replan_interval_s)
        } else {
            None
        };
        Self {
            run_id,
            mode,
            seed,
            scale,
            data: Mutex::new(RunData::default()),
            replan_lock: Mutex::new(false),
            baseline_lock: Mutex::new(None),
            assign_lock: Mutex::new(()),
            next_periodic_replan_sim_s: Mutex::new(next),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_run_state_sets_next_periodic_replan_when_interval_positive() {
        let state = RunState::new(RunId::from("run-1"), RunMode::Ga, 7, "mini".to_string(), 30);
        assert_eq!(*state.next_periodic_replan_sim_s.lock().await, Some(30));
    }

    #[tokio::test]
    async fn test_new_run_state_has_no_periodic_replan_when_interval_zero() {
        let state = RunState::new(RunId::from("run-1"), RunMode::Baseline, 7, "mini".to_string(), 0);
        assert_eq!(*state.next_periodic_replan_sim_s.lock().await, None);
    }
}
