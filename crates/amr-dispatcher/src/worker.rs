//! Event-driven dispatch worker, grounded in the original
//! `DispatcherWorker` consumer.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use amr_core::{JobId, RobotId, RunId};
use amr_entities::{Job, Robot, RobotState, RunMode};
use amr_transport::{
    to_canonical_json, DispatchReason, Envelope, EventBus, EventMessage, JobAssignedEvent, RoutingKey,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::baseline::compute_baseline_assignments;
use crate::state::{DispatcherConfig, RunState};

/// Holds dispatch state for every run currently in flight and drives it from the
/// `amr.events` bus, mirroring the original's RabbitMQ consumer loop.
pub struct Dispatcher {
    bus: Arc<dyn EventBus>,
    config: DispatcherConfig,
    states: Mutex<HashMap<RunId, Arc<RunState>>>,
}

impl Dispatcher {
    pub fn new(bus: Arc<dyn EventBus>, config: DispatcherConfig) -> Arc<Self> {
        Arc::new(Self {
            bus,
            config,
            states: Mutex::new(HashMap::new()),
        })
    }

    /// Subscribe to the bus and spawn one task per incoming event, the same way the
    /// original lets `aio_pika` deliver concurrently to `_on_message`. Runs until the
    /// bus is dropped.
    pub async fn run(self: Arc<Self>) {
        let mut rx = self.bus.subscribe();
        info!("dispatcher worker started");
        loop {
            match rx.recv().await {
                Ok(message) => {
                    let worker = self.clone();
                    tokio::spawn(async move {
                        worker.handle_message(message).await;
                    });
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "dispatcher lagged behind the event bus");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn handle_message(&self, message: EventMessage) {
        match message.routing_key {
            RoutingKey::RunStarted => self.handle_run_started(&message.payload).await,
            RoutingKey::JobCreated => self.handle_job_created(&message.payload).await,
            RoutingKey::RobotUpdated => self.handle_robot_updated(&message.payload).await,
            _ => {}
        }
    }

    async fn run_state_for(&self, run_id: &str) -> Option<Arc<RunState>> {
        self.states.lock().await.get(&RunId::from(run_id)).cloned()
    }

    async fn handle_run_started(&self, payload: &Value) {
        let Some(run_id) = payload.get("run_id").and_then(Value::as_str) else {
            warn!("run.started missing run_id");
            return;
        };
        let mode = payload
            .get("mode")
            .and_then(Value::as_str)
            .and_then(RunMode::from_wire_str)
            .unwrap_or(self.config.default_mode);
        let seed = payload.get("seed").and_then(Value::as_u64).unwrap_or(self.config.default_seed);
        let scale = payload
            .get("scale")
            .and_then(Value::as_str)
            .unwrap_or(&self.config.default_scale)
            .to_string();

        let run_state = Arc::new(RunState::new(
            RunId::from(run_id),
            mode,
            seed,
            scale.clone(),
            self.config.ga_replan_interval_s,
        ));
        self.states.lock().await.insert(RunId::from(run_id), run_state.clone());
        info!(run_id, mode = mode.as_wire_str(), seed, scale = %scale, "run started");

        if mode == RunMode::Ga {
            self.replan_ga(&run_state, 0, "run_start").await;
        }
    }

    async fn handle_job_created(&self, payload: &Value) {
        let Some(run_id) = payload.get("run_id").and_then(Value::as_str) else {
            return;
        };
        let Some(run_state) = self.run_state_for(run_id).await else {
            return;
        };
        let Some(job) = Self::job_from_payload(payload) else {
            warn!(run_id, "dropping malformed job.created");
            return;
        };
        run_state.data.lock().await.jobs.insert(job.id.clone(), job);
        // Baseline dispatch is triggered by robot.updated instead, to avoid
        // over-assigning during a burst of job.created events.
    }

    /// Reconstruct a `Job` from `job.created`'s flat wire fields.
    fn job_from_payload(payload: &Value) -> Option<Job> {
        let job_id = payload.get("job_id")?.as_str()?.to_string();
        let pickup_x = payload.get("pickup_x")?.as_f64()?;
        let pickup_y = payload.get("pickup_y")?.as_f64()?;
        let dropoff_x = payload.get("dropoff_x")?.as_f64()?;
        let dropoff_y = payload.get("dropoff_y")?.as_f64()?;
        let deadline_ts = payload.get("deadline_ts")?.as_i64()?;
        let priority = payload.get("priority").and_then(Value::as_u64).unwrap_or(1) as u8;
        Some(Job::new(
            JobId::from(job_id),
            (pickup_x, pickup_y),
            (dropoff_x, dropoff_y),
            deadline_ts,
            priority,
        ))
    }

    /// Reconstruct a `Robot` from `robot.updated`'s flat wire fields. The `resume`
    /// detail of a charging state is simulation-internal and never crosses the bus;
    /// a dispatcher-side charging robot resumes to `idle` once its battery recovers
    /// and the engine publishes the next `robot.updated`.
    fn robot_from_payload(payload: &Value) -> Option<Robot> {
        let robot_id = payload.get("robot_id")?.as_u64()? as u32;
        let state = match payload.get("state")?.as_str()? {
            "idle" => RobotState::Idle,
            "moving_to_pickup" => RobotState::MovingToPickup,
            "moving_to_dropoff" => RobotState::MovingToDropoff,
            "charging" => RobotState::Charging { resume: Box::new(RobotState::Idle) },
            _ => return None,
        };
        let x = payload.get("x")?.as_f64()?;
        let y = payload.get("y")?.as_f64()?;
        let speed = payload.get("speed")?.as_f64()?;
        let battery = payload.get("battery")?.as_f64()?;
        let current_job_id = payload
            .get("current_job_id")
            .and_then(Value::as_str)
            .map(|s| JobId::from(s.to_string()));

        let mut robot = Robot::new(RobotId(robot_id), x, y, speed);
        robot.battery = battery;
        robot.state = state;
        robot.current_job_id = current_job_id;
        Some(robot)
    }

    async fn handle_robot_updated(&self, payload: &Value) {
        let Some(run_id) = payload.get("run_id").and_then(Value::as_str) else {
            return;
        };
        let Some(run_state) = self.run_state_for(run_id).await else {
            return;
        };
        let Some(sim_time_s) = payload.get("sim_time_s").and_then(Value::as_i64) else {
            return;
        };
        let Some(robot) = Self::robot_from_payload(payload) else {
            warn!(run_id, "dropping malformed robot.updated");
            return;
        };

        let robot_id = robot.id;
        let outcome = {
            let mut data = run_state.data.lock().await;

            if let Some(pending_job_id) = data.pending_assignments.get(&robot_id).cloned() {
                let matches_pending = robot.current_job_id.as_ref() == Some(&pending_job_id);
                if matches_pending || !robot.state.is_idle() {
                    data.pending_assignments.remove(&robot_id);
                } else if robot.current_job_id.is_none() {
                    return;
                }
            }

            let prev_idle = data.robots.get(&robot_id).map(|r| r.state.is_idle()).unwrap_or(false);
            let new_idle = robot.state.is_idle();
            let battery_ok = robot.battery >= self.config.battery_threshold;
            data.robots.insert(robot_id, robot.clone());

            if robot.state.is_charging() || !battery_ok {
                if let Some(queue) = data.planned_queues.get_mut(&robot_id) {
                    queue.clear();
                }
                data.pending_assignments.remove(&robot_id);
            }

            let queue_empty = data.planned_queues.get(&robot_id).map(VecDeque::is_empty).unwrap_or(true);
            (prev_idle != new_idle && new_idle, queue_empty, new_idle && battery_ok)
        };
        let (transitioned_to_idle, queue_empty, robot_ok) = outcome;

        if run_state.mode == RunMode::Baseline {
            self.dispatch_baseline_once_per_tick(&run_state, sim_time_s).await;
            return;
        }

        self.emit_planned_for_idle_robot(&run_state, robot_id, sim_time_s).await;

        if self.config.ga_replan_interval_s > 0 {
            let due = {
                let next = *run_state.next_periodic_replan_sim_s.lock().await;
                matches!(next, Some(at) if sim_time_s >= at)
            };
            if due && self.has_pending_jobs(&run_state).await && !*run_state.replan_lock.lock().await {
                self.replan_ga(&run_state, sim_time_s, "periodic").await;
                let mut next = run_state.next_periodic_replan_sim_s.lock().await;
                while let Some(at) = *next {
                    if at <= sim_time_s {
                        *next = Some(at + self.config.ga_replan_interval_s);
                    } else {
                        break;
                    }
                }
            }
        }

        if transitioned_to_idle
            && queue_empty
            && self.has_pending_jobs(&run_state).await
            && !*run_state.replan_lock.lock().await
        {
            self.replan_ga(&run_state, sim_time_s, "idle_gap").await;
        }

        let queue_nonempty = {
            let data = run_state.data.lock().await;
            data.planned_queues.get(&robot_id).map(|q| !q.is_empty()).unwrap_or(false)
        };
        if !robot_ok
            && self.has_pending_jobs(&run_state).await
            && !*run_state.replan_lock.lock().await
            && queue_nonempty
        {
            self.replan_ga(&run_state, sim_time_s, "battery_guard").await;
        }
    }

    /// Deterministically ordered pending jobs: `(deadline_ts, -priority, id)`.
    async fn pending_jobs(&self, run_state: &RunState) -> Vec<Job> {
        let data = run_state.data.lock().await;
        let mut pending: Vec<Job> = data
            .jobs
            .values()
            .filter(|j| j.state.is_awaiting_assignment() && !data.assigned_jobs.contains(&j.id))
            .cloned()
            .collect();
        pending.sort_by_key(amr_entities::sort_key);
        pending
    }

    async fn has_pending_jobs(&self, run_state: &RunState) -> bool {
        !self.pending_jobs(run_state).await.is_empty()
    }

    async fn dispatch_baseline(&self, run_state: &Arc<RunState>, sim_time_s: i64) {
        let assignments = {
            let data = run_state.data.lock().await;
            let blocked_robots = data.pending_assignments.keys().copied().collect();
            compute_baseline_assignments(
                &data.robots,
                &data.jobs,
                &data.assigned_jobs,
                &blocked_robots,
                self.config.battery_threshold,
            )
        };
        for assignment in assignments {
            self.emit_assignment(run_state, &assignment.job_id, assignment.robot_id, sim_time_s, DispatchReason::Baseline)
                .await;
        }
    }

    /// At most one baseline pass per `sim_time_s`, guarded end-to-end by
    /// `baseline_lock` like the original's `_dispatch_baseline_once_per_tick`.
    async fn dispatch_baseline_once_per_tick(&self, run_state: &Arc<RunState>, sim_time_s: i64) {
        if *run_state.baseline_lock.lock().await == Some(sim_time_s) {
            return;
        }
        let mut last = run_state.baseline_lock.lock().await;
        if *last == Some(sim_time_s) {
            return;
        }
        *last = Some(sim_time_s);
        self.dispatch_baseline(run_state, sim_time_s).await;
    }

    async fn replan_ga(&self, run_state: &Arc<RunState>, sim_time_s: i64, reason: &str) {
        {
            let mut in_flight = run_state.replan_lock.lock().await;
            if *in_flight {
                return;
            }
            *in_flight = true;
        }

        if let Err(err) = self.replan_ga_inner(run_state, sim_time_s, reason).await {
            warn!(run_id = %run_state.run_id, reason, %err, "ga replan failed");
        }

        *run_state.replan_lock.lock().await = false;
    }

    async fn replan_ga_inner(&self, run_state: &Arc<RunState>, sim_time_s: i64, reason: &str) -> anyhow::Result<()> {
        let pending = self.pending_jobs(run_state).await;
        if pending.is_empty() {
            return Ok(());
        }

        let mut robots: Vec<Robot> = {
            let data = run_state.data.lock().await;
            data.robots
                .values()
                .filter(|r| !r.state.is_charging() && r.battery >= self.config.battery_threshold)
                .cloned()
                .collect()
        };
        robots.sort_by_key(|r| r.id);
        if robots.is_empty() {
            return Ok(());
        }

        let plan = amr_optimizer::request_ga_plan(
            &self.config.optimizer_url,
            run_state.run_id.as_str(),
            run_state.seed,
            &run_state.scale,
            sim_time_s,
            &robots,
            &pending,
        )
        .await?;

        let mut new_queues: HashMap<RobotId, VecDeque<JobId>> =
            robots.iter().map(|r| (r.id, VecDeque::new())).collect();
        {
            let data = run_state.data.lock().await;
            for item in plan {
                let job_id = JobId::from(item.job_id);
                let robot_id = RobotId(item.robot_id);
                if data.assigned_jobs.contains(&job_id) {
                    continue;
                }
                let Some(job) = data.jobs.get(&job_id) else { continue };
                if !job.state.is_awaiting_assignment() {
                    continue;
                }
                let Some(queue) = new_queues.get_mut(&robot_id) else { continue };
                if !queue.contains(&job_id) {
                    queue.push_back(job_id);
                }
            }
        }

        run_state.data.lock().await.planned_queues = new_queues;
        info!(run_id = %run_state.run_id, reason, sim_time_s, pending = pending.len(), "ga replan");
        self.emit_planned_for_idle_robots(run_state, sim_time_s).await;
        Ok(())
    }

    async fn emit_planned_for_idle_robots(&self, run_state: &Arc<RunState>, sim_time_s: i64) {
        let robot_ids: Vec<RobotId> = {
            let data = run_state.data.lock().await;
            let mut ids: Vec<RobotId> = data.robots.keys().copied().collect();
            ids.sort();
            ids
        };
        for robot_id in robot_ids {
            self.emit_planned_for_idle_robot(run_state, robot_id, sim_time_s).await;
        }
    }

    async fn emit_planned_for_idle_robot(&self, run_state: &Arc<RunState>, robot_id: RobotId, sim_time_s: i64) {
        let next_job = {
            let mut data = run_state.data.lock().await;
            let (is_idle, battery) = match data.robots.get(&robot_id) {
                Some(r) => (r.state.is_idle(), r.battery),
                None => return,
            };
            if !is_idle || battery < self.config.battery_threshold {
                return;
            }
            let mut found = None;
            loop {
                let Some(queue) = data.planned_queues.get_mut(&robot_id) else { break };
                let Some(job_id) = queue.pop_front() else { break };
                if data.assigned_jobs.contains(&job_id) {
                    continue;
                }
                let Some(job) = data.jobs.get(&job_id) else { continue };
                if !job.state.is_awaiting_assignment() {
                    continue;
                }
                found = Some(job_id);
                break;
            }
            found
        };
        if let Some(job_id) = next_job {
            self.emit_assignment(run_state, &job_id, robot_id, sim_time_s, DispatchReason::GaReplan).await;
        }
    }

    /// Publish `job.assigned` exactly once per job, guarded end-to-end by
    /// `assign_lock` like the original's `_emit_assignment`.
    async fn emit_assignment(
        &self,
        run_state: &Arc<RunState>,
        job_id: &JobId,
        robot_id: RobotId,
        sim_time_s: i64,
        reason: DispatchReason,
    ) {
        let _assign_guard = run_state.assign_lock.lock().await;
        let mut data = run_state.data.lock().await;
        if data.assigned_jobs.contains(job_id) {
            return;
        }
        let Some(job) = data.jobs.get(job_id) else { return };
        if !job.state.is_awaiting_assignment() {
            return;
        }

        let envelope = Envelope::new(
            &run_state.run_id,
            "job.assigned",
            job_id.as_str(),
            run_state.mode.as_wire_str(),
            run_state.seed,
            &run_state.scale,
            sim_time_s,
        );
        let event = JobAssignedEvent {
            envelope,
            job_id: job_id.to_string(),
            robot_id: robot_id.0,
            reason,
            idempotency_key: format!("{}:{}", run_state.run_id, job_id),
        };
        self.bus.publish(RoutingKey::JobAssigned, to_canonical_json(&event));

        data.assigned_jobs.insert(job_id.clone());
        if let Some(job) = data.jobs.get_mut(job_id) {
            job.state = amr_entities::JobState::Assigned;
        }
        if let Some(robot) = data.robots.get_mut(&robot_id) {
            robot.state = RobotState::MovingToPickup;
            robot.current_job_id = Some(job_id.clone());
        }
        data.pending_assignments.insert(robot_id, job_id.clone());
        info!(
            run_id = %run_state.run_id,
            mode = run_state.mode.as_wire_str(),
            %job_id,
            %robot_id,
            ?reason,
            "assignment emitted"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_transport::InProcessEventBus;
    use serde_json::json;

    fn config() -> DispatcherConfig {
        DispatcherConfig {
            battery_threshold: 20.0,
            ga_replan_interval_s: 0,
            optimizer_url: "http://127.0.0.1:0".to_string(),
            ga_params: amr_ga::GaParams {
                population_size: 8,
                generations: 3,
                elite_size: 1,
                crossover_rate: 0.9,
                mutation_rate: 0.1,
                service_time_s: 5.0,
            },
            default_mode: RunMode::Baseline,
            default_seed: 1,
            default_scale: "mini".to_string(),
        }
    }

    fn robot_updated_payload(run_id: &str, robot: &Robot, sim_time_s: i64) -> Value {
        json!({
            "run_id": run_id,
            "sim_time_s": sim_time_s,
            "robot_id": robot.id.0,
            "state": robot.state.as_wire_str(),
            "x": robot.x,
            "y": robot.y,
            "speed": robot.speed,
            "battery": robot.battery,
            "current_job_id": robot.current_job_id.as_ref().map(|j| j.to_string()),
        })
    }

    fn job_created_payload(run_id: &str, job: &Job) -> Value {
        json!({
            "run_id": run_id,
            "job_id": job.id.as_str(),
            "pickup_x": job.pickup.0,
            "pickup_y": job.pickup.1,
            "dropoff_x": job.dropoff.0,
            "dropoff_y": job.dropoff.1,
            "deadline_ts": job.deadline_ts,
            "priority": job.priority,
            "state": job.state.as_wire_str(),
        })
    }

    #[tokio::test]
    async fn test_baseline_run_assigns_pending_job_on_robot_updated() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::default());
        let dispatcher = Dispatcher::new(bus.clone(), config());
        let mut assigned_rx = bus.subscribe();

        dispatcher
            .handle_run_started(&json!({"run_id": "run-1", "mode": "baseline", "seed": 1, "scale": "mini"}))
            .await;

        let job = Job::new(JobId::from("job_1"), (1.0, 0.0), (2.0, 0.0), 100, 1);
        dispatcher.handle_job_created(&job_created_payload("run-1", &job)).await;

        let robot = Robot::new(RobotId(1), 0.0, 0.0, 1.0);
        dispatcher
            .handle_robot_updated(&robot_updated_payload("run-1", &robot, 0))
            .await;

        let message = assigned_rx.recv().await.unwrap();
        assert_eq!(message.routing_key, RoutingKey::JobAssigned);
        assert_eq!(message.payload["job_id"], "job_1");
        assert_eq!(message.payload["robot_id"], 1);
    }

    #[tokio::test]
    async fn test_assignment_is_not_emitted_twice_for_same_job() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::default());
        let dispatcher = Dispatcher::new(bus.clone(), config());
        let run_state = Arc::new(RunState::new(RunId::from("run-1"), RunMode::Baseline, 1, "mini".to_string(), 0));

        let job = Job::new(JobId::from("job_1"), (1.0, 0.0), (2.0, 0.0), 100, 1);
        run_state.data.lock().await.jobs.insert(job.id.clone(), job);
        run_state.data.lock().await.robots.insert(RobotId(1), Robot::new(RobotId(1), 0.0, 0.0, 1.0));

        let mut rx = bus.subscribe();
        dispatcher
            .emit_assignment(&run_state, &JobId::from("job_1"), RobotId(1), 0, DispatchReason::Baseline)
            .await;
        dispatcher
            .emit_assignment(&run_state, &JobId::from("job_1"), RobotId(1), 0, DispatchReason::Baseline)
            .await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.payload["job_id"], "job_1");
        assert!(rx.try_recv().is_err());
    }
}
