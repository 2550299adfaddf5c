//! EDF + nearest-idle-robot heuristic, grounded
//! in the original `compute_baseline_assignments`.

use std::collections::{HashMap, HashSet};

use amr_core::{JobId, RobotId};
use amr_entities::{distance, sort_key, Job, Robot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineAssignment {
    pub job_id: JobId,
    pub robot_id: RobotId,
}

/// Sort pending jobs by `(deadline_ts, -priority, id)`, then greedily hand each one
/// to its nearest still-idle robot. If every idle robot is below `battery_threshold`,
/// fall back to ignoring the threshold rather than stall the run entirely.
pub fn compute_baseline_assignments(
    robots: &HashMap<RobotId, Robot>,
    jobs: &HashMap<JobId, Job>,
    already_assigned: &HashSet<JobId>,
    blocked_robots: &HashSet<RobotId>,
    battery_threshold: f64,
) -> Vec<BaselineAssignment> {
    let mut pending_jobs: Vec<&Job> = jobs
        .values()
        .filter(|j| j.state.is_awaiting_assignment() && !already_assigned.contains(&j.id))
        .collect();
    pending_jobs.sort_by_key(|j| sort_key(j));

    let mut idle_robots: Vec<&Robot> = robots
        .values()
        .filter(|r| r.state.is_idle() && !blocked_robots.contains(&r.id) && r.battery >= battery_threshold)
        .collect();

    if idle_robots.is_empty() && !pending_jobs.is_empty() {
        idle_robots = robots
            .values()
            .filter(|r| r.state.is_idle() && !blocked_robots.contains(&r.id))
            .collect();
    }
    idle_robots.sort_by_key(|r| r.id);

    let mut assignments = Vec::new();
    let mut used_robots: HashSet<RobotId> = HashSet::new();

    for job in &pending_jobs {
        let mut best: Option<&Robot> = None;
        let mut best_distance = f64::INFINITY;
        for robot in &idle_robots {
            if used_robots.contains(&robot.id) {
                continue;
            }
            let d = distance((robot.x, robot.y), job.pickup);
            let better = d < best_distance || (d == best_distance && best.map_or(true, |b| robot.id < b.id));
            if better {
                best_distance = d;
                best = Some(robot);
            }
        }
        let Some(robot) = best else { continue };
        used_robots.insert(robot.id);
        assignments.push(BaselineAssignment {
            job_id: job.id.clone(),
            robot_id: robot.id,
        });
    }

    assignments.sort_by(|a, b| (a.job_id.as_str(), a.robot_id).cmp(&(b.job_id.as_str(), b.robot_id)));
    assignments
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_entities::JobState;

    fn robot(id: u32, x: f64, y: f64, battery: f64) -> Robot {
        let mut r = Robot::new(RobotId(id), x, y, 1.0);
        r.battery = battery;
        r
    }

    fn job(id: &str, pickup: (f64, f64), deadline: i64, priority: u8) -> Job {
        Job::new(JobId::from(id), pickup, (9.0, 9.0), deadline, priority)
    }

    #[test]
    fn test_assigns_nearest_idle_robot() {
        let mut robots = HashMap::new();
        robots.insert(RobotId(1), robot(1, 0.0, 0.0, 100.0));
        robots.insert(RobotId(2), robot(2, 10.0, 10.0, 100.0));
        let mut jobs = HashMap::new();
        jobs.insert(JobId::from("job_1"), job("job_1", (1.0, 0.0), 100, 1));

        let assignments = compute_baseline_assignments(&robots, &jobs, &HashSet::new(), &HashSet::new(), 20.0);
        assert_eq!(assignments, vec![BaselineAssignment { job_id: JobId::from("job_1"), robot_id: RobotId(1) }]);
    }

    #[test]
    fn test_earlier_deadline_dispatched_first_when_robots_scarce() {
        let mut robots = HashMap::new();
        robots.insert(RobotId(1), robot(1, 0.0, 0.0, 100.0));
        let mut jobs = HashMap::new();
        jobs.insert(JobId::from("late"), job("late", (5.0, 0.0), 200, 1));
        jobs.insert(JobId::from("early"), job("early", (5.0, 0.0), 50, 1));

        let assignments = compute_baseline_assignments(&robots, &jobs, &HashSet::new(), &HashSet::new(), 20.0);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].job_id, JobId::from("early"));
    }

    #[test]
    fn test_falls_back_below_battery_threshold_when_no_other_idle_robot() {
        let mut robots = HashMap::new();
        robots.insert(RobotId(1), robot(1, 0.0, 0.0, 5.0));
        let mut jobs = HashMap::new();
        jobs.insert(JobId::from("job_1"), job("job_1", (1.0, 0.0), 100, 1));

        let assignments = compute_baseline_assignments(&robots, &jobs, &HashSet::new(), &HashSet::new(), 20.0);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].robot_id, RobotId(1));
    }

    #[test]
    fn test_already_assigned_and_non_pending_jobs_are_skipped() {
        let mut robots = HashMap::new();
        robots.insert(RobotId(1), robot(1, 0.0, 0.0, 100.0));
        let mut jobs = HashMap::new();
        let mut assigned_job = job("job_1", (1.0, 0.0), 100, 1);
        assigned_job.state = JobState::InProgress;
        jobs.insert(JobId::from("job_1"), assigned_job);

        let assignments = compute_baseline_assignments(&robots, &jobs, &HashSet::new(), &HashSet::new(), 20.0);
        assert!(assignments.is_empty());
    }
}
