//! HTTP client for calling a running optimizer service, grounded in the original
//! `planner_client.py`.

use std::time::Duration;

use amr_entities::{Job, Robot};
use serde::Serialize;
use thiserror::Error;

use crate::schemas::{AssignmentDto, JobDto, OptimizeResponse, RobotDto};

#[derive(Debug, Error)]
pub enum OptimizerClientError {
    #[error("optimizer request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("optimizer returned an error status: {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Serialize)]
struct OptimizeRequestBody {
    run_id: String,
    seed: u64,
    scale: String,
    mode: &'static str,
    sim_time_s: i64,
    robots: Vec<RobotDto>,
    pending_jobs: Vec<JobDto>,
}

/// Call `{optimizer_url}/optimize` with a 10s timeout and return normalized,
/// `(job_id, robot_id)`-sorted assignments.
pub async fn request_ga_plan(
    optimizer_url: &str,
    run_id: &str,
    seed: u64,
    scale: &str,
    sim_time_s: i64,
    robots: &[Robot],
    pending_jobs: &[Job],
) -> Result<Vec<AssignmentDto>, OptimizerClientError> {
    let body = OptimizeRequestBody {
        run_id: run_id.to_string(),
        seed,
        scale: scale.to_string(),
        mode: "ga",
        sim_time_s,
        robots: robots
            .iter()
            .map(|r| RobotDto {
                id: r.id.0,
                x: r.x,
                y: r.y,
                speed: r.speed,
                battery: r.battery,
                state: r.state.as_wire_str().to_string(),
                current_job_id: r.current_job_id.as_ref().map(|j| j.to_string()),
            })
            .collect(),
        pending_jobs: pending_jobs
            .iter()
            .map(|j| JobDto {
                id: j.id.to_string(),
                pickup_x: j.pickup.0,
                pickup_y: j.pickup.1,
                dropoff_x: j.dropoff.0,
                dropoff_y: j.dropoff.1,
                deadline_ts: j.deadline_ts,
                priority: j.priority,
                state: Some(j.state.as_wire_str().to_string()),
            })
            .collect(),
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let response = client
        .post(format!("{optimizer_url}/optimize"))
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(OptimizerClientError::Status(response.status()));
    }

    let parsed: OptimizeResponse = response.json().await?;
    let mut assignments = parsed.assignments;
    assignments.sort_by(|a, b| (a.job_id.as_str(), a.robot_id).cmp(&(b.job_id.as_str(), b.robot_id)));
    Ok(assignments)
}
