//! Job entity and its lifecycle state machine.

use amr_core::{JobId, RobotId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Unassigned,
    Assigned,
    InProgress,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Unassigned => "unassigned",
            JobState::Assigned => "assigned",
            JobState::InProgress => "in_progress",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    /// Jobs eligible for assignment: `{pending, unassigned}`.5.
    pub fn is_awaiting_assignment(&self) -> bool {
        matches!(self, JobState::Pending | JobState::Unassigned)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub pickup: (f64, f64),
    pub dropoff: (f64, f64),
    pub deadline_ts: i64,
    pub priority: u8,
    pub state: JobState,
    pub assigned_robot_id: Option<RobotId>,
    pub created_sim_ts: i64,
    pub started_sim_ts: Option<i64>,
    pub completed_sim_ts: Option<i64>,
    pub lateness_s: f64,
}

impl Job {
    pub fn new(
        id: JobId,
        pickup: (f64, f64),
        dropoff: (f64, f64),
        deadline_ts: i64,
        priority: u8,
    ) -> Self {
        Self {
            id,
            pickup,
            dropoff,
            deadline_ts,
            priority,
            state: JobState::Pending,
            assigned_robot_id: None,
            created_sim_ts: 0,
            started_sim_ts: None,
            completed_sim_ts: None,
            lateness_s: 0.0,
        }
    }

    pub fn assign(&mut self, robot_id: RobotId, sim_time_s: i64) {
        self.state = JobState::Assigned;
        self.assigned_robot_id = Some(robot_id);
        self.started_sim_ts = Some(sim_time_s);
    }

    pub fn begin_service(&mut self) {
        self.state = JobState::InProgress;
    }

    pub fn complete(&mut self, sim_time_s: i64) {
        self.state = JobState::Completed;
        self.completed_sim_ts = Some(sim_time_s);
        self.lateness_s = (sim_time_s - self.deadline_ts).max(0) as f64;
    }

    pub fn fail(&mut self, sim_time_s: i64) {
        self.state = JobState::Failed;
        self.lateness_s = (sim_time_s - self.deadline_ts).max(0) as f64;
    }
}

/// Sort order shared by the fitness evaluator, GA optimizer, and baseline heuristic:
/// `(deadline_ts asc, priority desc, id asc)`.
pub fn sort_key(job: &Job) -> (i64, std::cmp::Reverse<u8>, String) {
    (job.deadline_ts, std::cmp::Reverse(job.priority), job.id.0.clone())
}
