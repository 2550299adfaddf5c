//! The common event envelope every published event carries.

use amr_core::RunId;
use chrono::Utc;
use serde::Serialize;
use sha1::{Digest, Sha1};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingKey {
    RunStarted,
    RunCompleted,
    JobCreated,
    RobotUpdated,
    JobAssigned,
    JobCompleted,
    JobFailed,
    SnapshotTick,
    TelemetryReceived,
}

impl RoutingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingKey::RunStarted => "run.started",
            RoutingKey::RunCompleted => "run.completed",
            RoutingKey::JobCreated => "job.created",
            RoutingKey::RobotUpdated => "robot.updated",
            RoutingKey::JobAssigned => "job.assigned",
            RoutingKey::JobCompleted => "job.completed",
            RoutingKey::JobFailed => "job.failed",
            RoutingKey::SnapshotTick => "snapshot.tick",
            RoutingKey::TelemetryReceived => "telemetry.received",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub event_id: String,
    pub event_type: &'static str,
    pub run_id: String,
    pub mode: &'static str,
    pub seed: u64,
    pub scale: String,
    pub sim_time_s: i64,
    pub ts_utc: String,
}

impl Envelope {
    /// `event_id = sha1(run_id:event_type:entity_id:sim_time_s)`.
    pub fn new(
        run_id: &RunId,
        event_type: &'static str,
        entity_id: &str,
        mode: &'static str,
        seed: u64,
        scale: &str,
        sim_time_s: i64,
    ) -> Self {
        let digest_input = format!("{}:{}:{}:{}", run_id, event_type, entity_id, sim_time_s);
        let mut hasher = Sha1::new();
        hasher.update(digest_input.as_bytes());
        let event_id = format!("{:x}", hasher.finalize());

        Self {
            event_id,
            event_type,
            run_id: run_id.to_string(),
            mode,
            seed,
            scale: scale.to_string(),
            sim_time_s,
            ts_utc: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_is_deterministic_given_inputs() {
        let run_id = RunId::from("run-1");
        let a = Envelope::new(&run_id, "robot.updated", "1", "baseline", 42, "demo", 10);
        let b = Envelope::new(&run_id, "robot.updated", "1", "baseline", 42, "demo", 10);
        assert_eq!(a.event_id, b.event_id);
    }

    #[test]
    fn test_event_id_changes_with_sim_time() {
        let run_id = RunId::from("run-1");
        let a = Envelope::new(&run_id, "robot.updated", "1", "baseline", 42, "demo", 10);
        let b = Envelope::new(&run_id, "robot.updated", "1", "baseline", 42, "demo", 11);
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn test_routing_key_wire_strings() {
        assert_eq!(RoutingKey::JobAssigned.as_str(), "job.assigned");
        assert_eq!(RoutingKey::SnapshotTick.as_str(), "snapshot.tick");
    }
}
