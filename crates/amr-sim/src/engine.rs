//! Deterministic fixed-tick simulation engine, grounded in the
//! original `sim/engine.py` tick loop.

use std::collections::HashMap;
use std::sync::Arc;

use amr_core::{JobId, RobotId, RunId};
use amr_entities::{Job, Robot, RobotState, RunMode};
use amr_transport::{
    events::{to_canonical_json, RobotUpdatedEvent, SnapshotTickEvent},
    Envelope, EventBus, RoutingKey,
};

/// Battery drained per unit of distance traveled.
pub const BATTERY_DRAIN_PER_DISTANCE: f64 = 0.1;

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub tick_hz: u32,
    pub service_time_s: f64,
    pub max_sim_seconds: i64,
    pub emit_position_updates: bool,
    pub charge_rate: f64,
    pub charge_resume_threshold: f64,
    /// Sleep for one tick's worth of wall-clock time between steps, matching the
    /// original's telemetry cadence. Off by default for a one-shot CLI run.
    pub pace_ticks: bool,
}

impl SimConfig {
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_hz as f64
    }
}

/// Owns the authoritative robot/job state for one run.
pub struct World {
    pub run_id: RunId,
    pub mode: RunMode,
    pub seed: u64,
    pub scale: String,
    pub tick: u64,
    pub robots: HashMap<RobotId, Robot>,
    pub jobs: HashMap<JobId, Job>,
}

impl World {
    pub fn new(
        run_id: RunId,
        mode: RunMode,
        seed: u64,
        scale: String,
        robots: Vec<Robot>,
        jobs: Vec<Job>,
    ) -> Self {
        Self {
            run_id,
            mode,
            seed,
            scale,
            tick: 0,
            robots: robots.into_iter().map(|r| (r.id, r)).collect(),
            jobs: jobs.into_iter().map(|j| (j.id.clone(), j)).collect(),
        }
    }

    pub fn sorted_robot_ids(&self) -> Vec<RobotId> {
        let mut ids: Vec<RobotId> = self.robots.keys().copied().collect();
        ids.sort();
        ids
    }
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub job_id: JobId,
    pub robot_id: RobotId,
}

/// Advances robot/job state one tick at a time and publishes `robot.updated` as state
/// changes.
pub struct SimulationEngine {
    pub world: World,
    config: SimConfig,
    bus: Arc<dyn EventBus>,
    last_position_emit_sim_s: HashMap<RobotId, i64>,
}

impl SimulationEngine {
    pub fn new(world: World, config: SimConfig, bus: Arc<dyn EventBus>) -> Self {
        Self {
            world,
            config,
            bus,
            last_position_emit_sim_s: HashMap::new(),
        }
    }

    pub fn current_sim_time_s(&self) -> i64 {
        (self.world.tick / self.config.tick_hz as u64) as i64
    }

    pub fn emit_initial_robot_updates(&mut self) {
        let sim_time_s = self.current_sim_time_s();
        for id in self.world.sorted_robot_ids() {
            self.emit_robot_updated(id, sim_time_s, true);
        }
    }

    /// Apply a planned assignment if the robot and job are both still eligible.
    /// Returns `false` (and leaves state untouched) on a stale or duplicate assignment.
    pub fn apply_assignment(&mut self, assignment: &Assignment) -> bool {
        let sim_time_s = self.current_sim_time_s();

        let robot_idle = self
            .world
            .robots
            .get(&assignment.robot_id)
            .map(|r| r.state.is_idle())
            .unwrap_or(false);
        let pickup = match self.world.jobs.get(&assignment.job_id) {
            Some(job) if job.state.is_awaiting_assignment() => job.pickup,
            _ => return false,
        };
        if !robot_idle {
            return false;
        }

        self.world
            .jobs
            .get_mut(&assignment.job_id)
            .expect("checked above")
            .assign(assignment.robot_id, sim_time_s);
        self.world
            .robots
            .get_mut(&assignment.robot_id)
            .expect("checked above")
            .assign(assignment.job_id.clone(), pickup);

        self.emit_robot_updated(assignment.robot_id, sim_time_s, true);
        true
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) {
        let sim_time_s = self.current_sim_time_s();
        for id in self.world.sorted_robot_ids() {
            let before = self.world.robots[&id].state.as_wire_str();
            self.advance_robot(id);
            let after = self.world.robots[&id].state.as_wire_str();
            if before != after {
                self.emit_robot_updated(id, sim_time_s, true);
            } else if self.config.emit_position_updates {
                self.emit_robot_updated(id, sim_time_s, false);
            }
        }
        self.emit_snapshot_tick(sim_time_s);
        self.world.tick += 1;
    }

    pub fn should_stop(&self) -> bool {
        if self.current_sim_time_s() >= self.config.max_sim_seconds {
            return true;
        }
        self.world.jobs.values().all(|j| j.state.is_terminal())
    }

    /// Mark any still-active job as failed at the end of the run.
    pub fn finalize(&mut self) {
        let sim_time_s = self.current_sim_time_s();
        for job in self.world.jobs.values_mut() {
            if !job.state.is_terminal() {
                job.fail(sim_time_s);
            }
        }
    }

    fn advance_robot(&mut self, id: RobotId) {
        let dt = self.config.dt();
        let charge_rate = self.config.charge_rate;
        let resume_threshold = self.config.charge_resume_threshold;
        let service_time_s = self.config.service_time_s;
        let sim_time_s = self.current_sim_time_s();

        let World { robots, jobs, .. } = &mut self.world;
        let robot = robots.get_mut(&id).expect("robot must exist");

        if robot.state.is_charging() {
            robot.battery = (robot.battery + charge_rate * dt).min(100.0);
            if robot.battery >= resume_threshold {
                robot.resume_from_charging();
            }
            return;
        }

        if robot.battery <= 0.0 && robot.state.is_moving() {
            robot.enter_charging();
            return;
        }

        if !robot.state.is_moving() {
            return;
        }

        let Some(current_job_id) = robot.current_job_id.clone() else {
            robot.complete_job();
            return;
        };
        let Some(target) = robot.target else {
            robot.complete_job();
            return;
        };

        let dx = target.0 - robot.x;
        let dy = target.1 - robot.y;
        let distance_to_target = (dx * dx + dy * dy).sqrt();
        let step_distance = robot.speed * dt;

        if distance_to_target > 0.0 {
            let travel = distance_to_target.min(step_distance);
            let ratio = travel / distance_to_target;
            robot.x += dx * ratio;
            robot.y += dy * ratio;
            robot.distance_traveled += travel;
            robot.battery = (robot.battery - travel * BATTERY_DRAIN_PER_DISTANCE).max(0.0);
            if robot.battery <= 0.0 {
                robot.enter_charging();
                return;
            }
        }

        if distance_to_target > step_distance + 1e-9 {
            return;
        }

        let state_tag = robot.state.clone();
        match state_tag {
            RobotState::MovingToPickup => {
                if robot.phase_remaining_s <= 0.0 {
                    robot.phase_remaining_s = service_time_s;
                }
                robot.phase_remaining_s = (robot.phase_remaining_s - dt).max(0.0);
                if robot.phase_remaining_s > 0.0 {
                    return;
                }
                let Some(job) = jobs.get_mut(&current_job_id) else {
                    robot.complete_job();
                    return;
                };
                job.begin_service();
                let dropoff = job.dropoff;
                robot.begin_dropoff(dropoff);
            }
            RobotState::MovingToDropoff => {
                if robot.dropoff_remaining_s <= 0.0 {
                    robot.dropoff_remaining_s = service_time_s;
                }
                robot.dropoff_remaining_s = (robot.dropoff_remaining_s - dt).max(0.0);
                if robot.dropoff_remaining_s > 0.0 {
                    return;
                }
                if let Some(job) = jobs.get_mut(&current_job_id) {
                    job.complete(sim_time_s);
                }
                robot.complete_job();
            }
            RobotState::Idle | RobotState::Charging { .. } => {}
        }
    }

    fn emit_robot_updated(&mut self, id: RobotId, sim_time_s: i64, force: bool) {
        if !force {
            if let Some(&last) = self.last_position_emit_sim_s.get(&id) {
                if sim_time_s <= last {
                    return;
                }
            }
        }

        let robot = &self.world.robots[&id];
        let envelope = Envelope::new(
            &self.world.run_id,
            "robot.updated",
            &id.to_string(),
            self.world.mode.as_wire_str(),
            self.world.seed,
            &self.world.scale,
            sim_time_s,
        );
        let event = RobotUpdatedEvent {
            envelope,
            robot_id: robot.id.0,
            state: robot.state.as_wire_str().to_string(),
            x: round3(robot.x),
            y: round3(robot.y),
            speed: robot.speed,
            battery: round3(robot.battery),
            current_job_id: robot.current_job_id.as_ref().map(|j| j.to_string()),
        };
        self.bus.publish(RoutingKey::RobotUpdated, to_canonical_json(&event));
        self.last_position_emit_sim_s.insert(id, sim_time_s);
    }

    /// Publish a sorted snapshot of every robot/job each tick, independent of the
    /// per-robot `robot.updated` change events above.
    fn emit_snapshot_tick(&self, sim_time_s: i64) {
        let mut robots: Vec<Robot> = self.world.robots.values().cloned().collect();
        robots.sort_by_key(|r| r.id);
        let mut jobs: Vec<Job> = self.world.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

        let envelope = Envelope::new(
            &self.world.run_id,
            "snapshot.tick",
            "snapshot",
            self.world.mode.as_wire_str(),
            self.world.seed,
            &self.world.scale,
            sim_time_s,
        );
        let event = SnapshotTickEvent {
            envelope,
            tick: self.world.tick,
            robots,
            jobs,
        };
        self.bus.publish(RoutingKey::SnapshotTick, to_canonical_json(&event));
    }
}
