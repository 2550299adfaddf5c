//! Fitness evaluation for a job/robot assignment chromosome.
//!
//! A chromosome is an integer sequence of length `|jobs|`; entry `k` names a robot
//! index (mod `|robots|`) for the `k`-th job in sorted-jobs order. `evaluate` replays
//! every job against simulated robot state (time, position, battery, job count) to
//! produce a total score plus a per-job breakdown, without touching the real
//! simulation engine.

use amr_core::JobId;
use amr_entities::{distance, sort_key, Job, Robot};
use std::collections::HashMap;

pub struct FitnessResult {
    pub total_score: f64,
    pub per_job_scores: HashMap<JobId, f64>,
}

struct WorkingRobot {
    time: f64,
    pos: (f64, f64),
    battery: f64,
    prior_jobs: u32,
}

pub fn evaluate(
    chromosome: &[usize],
    robots: &[Robot],
    jobs: &[Job],
    service_time_s: f64,
) -> FitnessResult {
    if jobs.is_empty() {
        return FitnessResult {
            total_score: 0.0,
            per_job_scores: HashMap::new(),
        };
    }

    if robots.is_empty() {
        let per_job_scores = jobs.iter().map(|j| (j.id.clone(), 1.0e9)).collect();
        return FitnessResult {
            total_score: 1.0e9,
            per_job_scores,
        };
    }

    let mut sorted_robots: Vec<&Robot> = robots.iter().collect();
    sorted_robots.sort_by(|a, b| a.id.cmp(&b.id));
    let mut working: Vec<WorkingRobot> = sorted_robots
        .iter()
        .map(|r| WorkingRobot {
            time: 0.0,
            pos: (r.x, r.y),
            battery: r.battery,
            prior_jobs: 0,
        })
        .collect();
    let speeds: Vec<f64> = sorted_robots.iter().map(|r| r.speed).collect();

    let mut sorted_jobs: Vec<&Job> = jobs.iter().collect();
    sorted_jobs.sort_by_key(|j| sort_key(j));

    let mut total_score = 0.0;
    let mut per_job_scores = HashMap::with_capacity(jobs.len());

    for (k, job) in sorted_jobs.iter().enumerate() {
        let gene = chromosome.get(k).copied().unwrap_or(0);
        let idx = gene % sorted_robots.len();
        let w = &mut working[idx];

        let travel = distance(w.pos, job.pickup) + distance(job.pickup, job.dropoff);
        let travel_time = travel / speeds[idx].max(0.1);
        let completion_time = w.time + travel_time + 2.0 * service_time_s;
        let lateness = (completion_time - job.deadline_ts as f64).max(0.0);

        let battery_after = w.battery - 0.1 * travel;
        let battery_penalty = if battery_after < 0.0 {
            500.0 + 100.0 * battery_after.abs()
        } else if battery_after < 10.0 {
            200.0
        } else {
            0.0
        };

        let load_penalty = 30.0 * (w.prior_jobs as f64).powi(2);

        let job_penalty = 1000.0 * lateness
            + 2.0 * travel
            + 3.0 * (6.0 - job.priority as f64)
            + battery_penalty
            + load_penalty;

        per_job_scores.insert(job.id.clone(), job_penalty);
        total_score += job_penalty;

        w.time = completion_time;
        w.pos = job.dropoff;
        w.battery = battery_after.max(0.0);
        w.prior_jobs += 1;
    }

    FitnessResult {
        total_score,
        per_job_scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_core::RobotId;

    fn make_robot(id: u32, x: f64, y: f64, speed: f64) -> Robot {
        Robot::new(RobotId(id), x, y, speed)
    }

    fn make_job(id: &str, pickup: (f64, f64), dropoff: (f64, f64), deadline: i64, priority: u8) -> Job {
        Job::new(JobId::from(id), pickup, dropoff, deadline, priority)
    }

    #[test]
    fn test_empty_jobs_yields_zero_score() {
        let robots = vec![make_robot(1, 0.0, 0.0, 1.0)];
        let result = evaluate(&[], &robots, &[], 5.0);
        assert_eq!(result.total_score, 0.0);
        assert!(result.per_job_scores.is_empty());
    }

    #[test]
    fn test_no_robots_with_jobs_yields_sentinel_score() {
        let jobs = vec![make_job("job_1", (0.0, 0.0), (1.0, 1.0), 100, 3)];
        let result = evaluate(&[0], &[], &jobs, 5.0);
        assert_eq!(result.total_score, 1.0e9);
        assert_eq!(result.per_job_scores[&JobId::from("job_1")], 1.0e9);
    }

    #[test]
    fn test_lateness_penalty_dominates() {
        let robots = vec![make_robot(1, 0.0, 0.0, 1.0)];
        let late = vec![make_job("job_1", (0.0, 0.0), (100.0, 0.0), 1, 3)];
        let on_time = vec![make_job("job_1", (0.0, 0.0), (1.0, 0.0), 100, 3)];

        let late_score = evaluate(&[0], &robots, &late, 5.0).total_score;
        let on_time_score = evaluate(&[0], &robots, &on_time, 5.0).total_score;

        assert!(late_score > on_time_score);
    }

    #[test]
    fn test_chromosome_gene_taken_modulo_robot_count() {
        let robots = vec![make_robot(1, 0.0, 0.0, 1.0)];
        let jobs = vec![make_job("job_1", (0.0, 0.0), (1.0, 1.0), 100, 3)];
        let a = evaluate(&[0], &robots, &jobs, 5.0).total_score;
        let b = evaluate(&[7], &robots, &jobs, 5.0).total_score;
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_penalty_grows_with_assignment_count() {
        let robots = vec![make_robot(1, 0.0, 0.0, 10.0)];
        let jobs = vec![
            make_job("job_1", (0.0, 0.0), (1.0, 0.0), 1000, 3),
            make_job("job_2", (1.0, 0.0), (2.0, 0.0), 1000, 3),
        ];
        let result = evaluate(&[0, 0], &robots, &jobs, 0.0);
        let s1 = result.per_job_scores[&JobId::from("job_1")];
        let s2 = result.per_job_scores[&JobId::from("job_2")];
        assert!(s2 > s1);
    }
}
