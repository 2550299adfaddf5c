//! Run-level metrics computed from the final job/robot state, grounded in the original `sim/metrics.py`.

use amr_entities::{Job, JobState, Robot};
use serde::Serialize;

fn round6(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    pub on_time_rate: f64,
    pub total_distance: f64,
    pub avg_completion_time: f64,
    pub max_lateness: f64,
    pub completed_jobs: u32,
    pub failed_jobs: u32,
    pub total_jobs: u32,
}

/// Compute the metrics used by the UI and API once a run has reached a terminal tick.
pub fn compute_metrics(jobs: &[Job], robots: &[Robot]) -> RunMetrics {
    let total_jobs = jobs.len() as u32;
    let completed_jobs = jobs.iter().filter(|j| j.state == JobState::Completed).count() as u32;
    let failed_jobs = jobs.iter().filter(|j| j.state == JobState::Failed).count() as u32;

    let on_time = jobs
        .iter()
        .filter(|j| {
            j.state == JobState::Completed && j.completed_sim_ts.unwrap_or(0) <= j.deadline_ts
        })
        .count();
    let on_time_rate = if total_jobs > 0 {
        on_time as f64 / total_jobs as f64 * 100.0
    } else {
        0.0
    };

    let completion_times: Vec<f64> = jobs
        .iter()
        .filter(|j| j.state == JobState::Completed)
        .map(|j| j.completed_sim_ts.unwrap_or(0) as f64)
        .collect();
    let avg_completion_time = if completion_times.is_empty() {
        0.0
    } else {
        completion_times.iter().sum::<f64>() / completion_times.len() as f64
    };

    let max_lateness = jobs
        .iter()
        .filter(|j| j.state == JobState::Completed)
        .map(|j| j.lateness_s)
        .fold(0.0_f64, f64::max);

    let total_distance: f64 = robots.iter().map(|r| r.distance_traveled).sum();

    RunMetrics {
        on_time_rate: round6(on_time_rate),
        total_distance: round6(total_distance),
        avg_completion_time: round6(avg_completion_time),
        max_lateness: round6(max_lateness),
        completed_jobs,
        failed_jobs,
        total_jobs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_core::{JobId, RobotId};

    fn completed_job(id: &str, deadline: i64, completed_at: i64) -> Job {
        let mut j = Job::new(JobId::from(id), (0.0, 0.0), (1.0, 1.0), deadline, 3);
        j.complete(completed_at);
        j
    }

    #[test]
    fn test_empty_run_yields_zeroed_metrics() {
        let metrics = compute_metrics(&[], &[]);
        assert_eq!(metrics.total_jobs, 0);
        assert_eq!(metrics.on_time_rate, 0.0);
    }

    #[test]
    fn test_on_time_rate_and_lateness() {
        let jobs = vec![completed_job("job_1", 100, 80), completed_job("job_2", 100, 150)];
        let metrics = compute_metrics(&jobs, &[]);
        assert_eq!(metrics.completed_jobs, 2);
        assert_eq!(metrics.on_time_rate, 50.0);
        assert_eq!(metrics.max_lateness, 50.0);
        assert_eq!(metrics.avg_completion_time, 115.0);
    }

    #[test]
    fn test_total_distance_sums_all_robots() {
        let mut r1 = Robot::new(RobotId(1), 0.0, 0.0, 1.0);
        r1.distance_traveled = 10.0;
        let mut r2 = Robot::new(RobotId(2), 0.0, 0.0, 1.0);
        r2.distance_traveled = 5.5;
        let metrics = compute_metrics(&[], &[r1, r2]);
        assert_eq!(metrics.total_distance, 15.5);
    }

    #[test]
    fn test_failed_jobs_excluded_from_lateness_and_completion_time() {
        let mut failed = Job::new(JobId::from("job_1"), (0.0, 0.0), (1.0, 1.0), 100, 3);
        failed.fail(500);
        let metrics = compute_metrics(&[failed], &[]);
        assert_eq!(metrics.failed_jobs, 1);
        assert_eq!(metrics.max_lateness, 0.0);
        assert_eq!(metrics.avg_completion_time, 0.0);
    }
}
