//! Wire contract for the `/optimize` RPC, grounded in the
//! original `schemas.py` request/response models.

use amr_core::{JobId, RobotId};
use amr_entities::{Job, Robot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobotDto {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub battery: f64,
    pub state: String,
    #[serde(default)]
    pub current_job_id: Option<String>,
}

impl RobotDto {
    pub fn into_robot(self) -> Robot {
        let mut robot = Robot::new(RobotId(self.id), self.x, self.y, self.speed);
        robot.battery = self.battery;
        robot
    }
}

fn default_priority() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobDto {
    pub id: String,
    pub pickup_x: f64,
    pub pickup_y: f64,
    pub dropoff_x: f64,
    pub dropoff_y: f64,
    pub deadline_ts: i64,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub state: Option<String>,
}

impl JobDto {
    pub fn into_job(self) -> Job {
        Job::new(
            JobId::from(self.id),
            (self.pickup_x, self.pickup_y),
            (self.dropoff_x, self.dropoff_y),
            self.deadline_ts,
            self.priority,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub run_id: String,
    pub seed: u64,
    pub scale: String,
    pub mode: String,
    #[serde(default)]
    pub sim_time_s: i64,
    pub robots: Vec<RobotDto>,
    pub pending_jobs: Vec<JobDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentDto {
    pub job_id: String,
    pub robot_id: u32,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub assignments: Vec<AssignmentDto>,
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
