//! Per-run orchestration: generate a scenario, drive the engine tick by tick, and
//! publish the events a dispatcher/UI would subscribe to. Grounded in the original
//! `app/main.py` `SimRunner._simulate_run`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use amr_core::{CoreResult, JobId, RobotId, RunId};
use amr_entities::{Job, JobState, RunMode};
use amr_metrics::RunMetrics;
use amr_scenario::{generate, GenerateParams};
use amr_transport::{
    events::{
        to_canonical_json, JobCompletedEvent, JobCreatedEvent, JobFailedEvent, RunCompletedEvent,
        RunStartedEvent, TelemetryReceivedEvent,
    },
    Envelope, EventBus, EventMessage, RoutingKey,
};
use tracing::info;

use crate::engine::{Assignment, SimConfig, SimulationEngine, World};

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

pub struct RunnerParams {
    pub run_id: RunId,
    pub mode: RunMode,
    pub seed: u64,
    pub scale: String,
    pub world_size: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    pub robots_override: Option<u32>,
    pub jobs_override: Option<u32>,
}

/// Drives one run's scenario generation, fixed-tick simulation, and event
/// publication to completion.
pub struct SimulationRunner {
    params: RunnerParams,
    config: SimConfig,
    bus: Arc<dyn EventBus>,
}

impl SimulationRunner {
    pub fn new(params: RunnerParams, config: SimConfig, bus: Arc<dyn EventBus>) -> Self {
        Self { params, config, bus }
    }

    pub async fn run(self) -> CoreResult<RunMetrics> {
        let scenario = generate(&GenerateParams {
            seed: self.params.seed,
            scale: self.params.scale.clone(),
            world_size: self.params.world_size,
            speed_min: self.params.speed_min,
            speed_max: self.params.speed_max,
            robots_override: self.params.robots_override,
            jobs_override: self.params.jobs_override,
        })?;
        info!(
            run_id = %self.params.run_id,
            robots = scenario.robots.len(),
            jobs = scenario.jobs.len(),
            "sim started"
        );

        let mut assignment_rx = self.bus.subscribe();

        let world = World::new(
            self.params.run_id.clone(),
            self.params.mode,
            self.params.seed,
            self.params.scale.clone(),
            scenario.robots.clone(),
            scenario.jobs.clone(),
        );
        let mut engine = SimulationEngine::new(world, self.config.clone(), self.bus.clone());

        self.emit_run_started(&scenario.scenario_hash, scenario.robots.len(), scenario.jobs.len());
        self.emit_jobs_created(&scenario.jobs);
        engine.emit_initial_robot_updates();

        let mut previous_job_states: HashMap<String, JobState> = scenario
            .jobs
            .iter()
            .map(|j| (j.id.as_str().to_string(), j.state))
            .collect();
        let mut last_telemetry_sim_s: i64 = -1;

        while !engine.should_stop() {
            while let Ok(message) = assignment_rx.try_recv() {
                if let Some(assignment) = self.decode_assignment(&message) {
                    engine.apply_assignment(&assignment);
                }
            }

            engine.step();
            let sim_time_s = engine.current_sim_time_s();

            if sim_time_s != last_telemetry_sim_s {
                self.emit_telemetry(&engine, sim_time_s);
                last_telemetry_sim_s = sim_time_s;
            }

            for (job_id, job) in engine.world.jobs.iter() {
                let key = job_id.as_str().to_string();
                if previous_job_states.get(&key) != Some(&job.state) {
                    previous_job_states.insert(key, job.state);
                    if job.state == JobState::Completed {
                        self.emit_job_completed(job, sim_time_s);
                    }
                }
            }

            if self.config.pace_ticks {
                tokio::time::sleep(Duration::from_secs_f64(self.config.dt())).await;
            }
        }

        engine.finalize();
        for job in engine.world.jobs.values() {
            if job.state == JobState::Failed {
                self.emit_job_failed(job, engine.current_sim_time_s());
            }
        }

        let robots: Vec<_> = engine.world.robots.values().cloned().collect();
        let jobs: Vec<_> = engine.world.jobs.values().cloned().collect();
        let metrics = amr_metrics::compute_metrics(&jobs, &robots);

        info!(run_id = %self.params.run_id, ?metrics, "run completed");
        self.emit_run_completed(&scenario.scenario_hash, &metrics, engine.current_sim_time_s());
        Ok(metrics)
    }

    fn decode_assignment(&self, message: &EventMessage) -> Option<Assignment> {
        if message.routing_key != RoutingKey::JobAssigned {
            return None;
        }
        if message.payload.get("run_id")?.as_str()? != self.params.run_id.as_str() {
            return None;
        }
        let job_id = message.payload.get("job_id")?.as_str()?.to_string();
        let robot_id = message.payload.get("robot_id")?.as_u64()? as u32;
        Some(Assignment {
            job_id: JobId::from(job_id),
            robot_id: RobotId(robot_id),
        })
    }

    fn emit_run_started(&self, scenario_hash: &str, robot_count: usize, job_count: usize) {
        let envelope = self.envelope("run.started", "run", 0);
        let event = RunStartedEvent {
            envelope,
            scenario_hash: scenario_hash.to_string(),
            robot_count,
            job_count,
        };
        self.bus.publish(RoutingKey::RunStarted, to_canonical_json(&event));
    }

    fn emit_jobs_created(&self, jobs: &[Job]) {
        let mut sorted: Vec<&Job> = jobs.iter().collect();
        sorted.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        for job in sorted {
            let envelope = self.envelope("job.created", job.id.as_str(), 0);
            let event = JobCreatedEvent {
                envelope,
                job_id: job.id.as_str().to_string(),
                pickup_x: round3(job.pickup.0),
                pickup_y: round3(job.pickup.1),
                dropoff_x: round3(job.dropoff.0),
                dropoff_y: round3(job.dropoff.1),
                deadline_ts: job.deadline_ts,
                priority: job.priority,
                state: job.state.as_wire_str().to_string(),
            };
            self.bus.publish(RoutingKey::JobCreated, to_canonical_json(&event));
        }
    }

    fn emit_telemetry(&self, engine: &SimulationEngine, sim_time_s: i64) {
        for id in engine.world.sorted_robot_ids() {
            let robot = &engine.world.robots[&id];
            let entity_id = format!("r{id}");
            let envelope = self.envelope("telemetry.received", &entity_id, sim_time_s);
            let event = TelemetryReceivedEvent {
                envelope,
                robot_id: id.0,
                x: round3(robot.x),
                y: round3(robot.y),
                battery: round3(robot.battery),
            };
            self.bus
                .publish(RoutingKey::TelemetryReceived, to_canonical_json(&event));
        }
    }

    fn emit_job_completed(&self, job: &Job, sim_time_s: i64) {
        let envelope = self.envelope("job.completed", job.id.as_str(), sim_time_s);
        let event = JobCompletedEvent {
            envelope,
            job_id: job.id.as_str().to_string(),
            robot_id: job.assigned_robot_id.map(|r| r.0).unwrap_or(0),
            lateness_s: job.lateness_s,
        };
        self.bus.publish(RoutingKey::JobCompleted, to_canonical_json(&event));
    }

    fn emit_job_failed(&self, job: &Job, sim_time_s: i64) {
        let envelope = self.envelope("job.failed", job.id.as_str(), sim_time_s);
        let event = JobFailedEvent {
            envelope,
            job_id: job.id.as_str().to_string(),
            robot_id: job.assigned_robot_id.map(|r| r.0).unwrap_or(0),
            lateness_s: job.lateness_s,
        };
        self.bus.publish(RoutingKey::JobFailed, to_canonical_json(&event));
    }

    fn emit_run_completed(&self, scenario_hash: &str, metrics: &RunMetrics, sim_time_s: i64) {
        let envelope = self.envelope("run.completed", "run", sim_time_s);
        let event = RunCompletedEvent {
            envelope,
            status: "completed",
            scenario_hash: Some(scenario_hash.to_string()),
            metrics: Some(serde_json::to_value(metrics).expect("metrics are always serializable")),
            error: None,
        };
        self.bus.publish(RoutingKey::RunCompleted, to_canonical_json(&event));
    }

    fn envelope(&self, event_type: &'static str, entity_id: &str, sim_time_s: i64) -> Envelope {
        Envelope::new(
            &self.params.run_id,
            event_type,
            entity_id,
            self.params.mode.as_wire_str(),
            self.params.seed,
            &self.params.scale,
            sim_time_s,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_transport::InProcessEventBus;

    fn config() -> SimConfig {
        SimConfig {
            tick_hz: 4,
            service_time_s: 1.0,
            max_sim_seconds: 20,
            emit_position_updates: false,
            charge_rate: 5.0,
            charge_resume_threshold: 20.0,
            pace_ticks: false,
        }
    }

    fn params() -> RunnerParams {
        RunnerParams {
            run_id: RunId::from("run-test"),
            mode: RunMode::Baseline,
            seed: 7,
            scale: "mini".into(),
            world_size: 20.0,
            speed_min: 5.0,
            speed_max: 8.0,
            robots_override: None,
            jobs_override: None,
        }
    }

    #[tokio::test]
    async fn test_run_with_no_assignments_fails_every_job() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::default());
        let runner = SimulationRunner::new(params(), config(), bus);
        let metrics = runner.run().await.unwrap();
        assert_eq!(metrics.completed_jobs, 0);
        assert_eq!(metrics.failed_jobs, metrics.total_jobs);
    }

    #[tokio::test]
    async fn test_run_publishes_run_started_job_created_and_run_completed() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::default());
        let mut rx = bus.subscribe();
        let runner = SimulationRunner::new(params(), config(), bus);
        runner.run().await.unwrap();

        let mut saw_run_started = false;
        let mut saw_job_created = false;
        let mut saw_run_completed = false;
        while let Ok(msg) = rx.try_recv() {
            match msg.routing_key {
                RoutingKey::RunStarted => saw_run_started = true,
                RoutingKey::JobCreated => saw_job_created = true,
                RoutingKey::RunCompleted => saw_run_completed = true,
                _ => {}
            }
        }
        assert!(saw_run_started);
        assert!(saw_job_created);
        assert!(saw_run_completed);
    }
}
