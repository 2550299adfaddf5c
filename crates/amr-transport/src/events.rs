//! Concrete payloads for each routing key on the `amr.events` exchange. Every payload
//! embeds the common [`Envelope`] alongside the event-specific fields and is encoded
//! to canonical JSON before it reaches the bus.

use crate::envelope::Envelope;
use amr_entities::RunMode;
use serde::Serialize;

/// Sorted-key, compact-separator JSON — the same trick used for the scenario hash,
/// applied here so every event body is byte-stable for a given input.
pub fn to_canonical_json<T: Serialize>(payload: &T) -> serde_json::Value {
    serde_json::to_value(payload).expect("event payloads are always serializable")
}

#[derive(Debug, Clone, Serialize)]
pub struct RunStartedEvent {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub scenario_hash: String,
    pub robot_count: usize,
    pub job_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunCompletedEvent {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub status: &'static str,
    pub scenario_hash: Option<String>,
    pub metrics: Option<serde_json::Value>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobCreatedEvent {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub job_id: String,
    pub pickup_x: f64,
    pub pickup_y: f64,
    pub dropoff_x: f64,
    pub dropoff_y: f64,
    pub deadline_ts: i64,
    pub priority: u8,
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RobotUpdatedEvent {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub robot_id: u32,
    pub state: String,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub battery: f64,
    pub current_job_id: Option<String>,
}

/// Why a job landed on a robot: which planning pass produced the assignment. The
/// original's planner client also tags a discarded `ga_optimizer` reason on its
/// normalized response, but every call site that actually emits `job.assigned`
/// passes a literal `baseline_edf_nearest`/`ga_planned`, so only those two reach
/// the wire here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatchReason {
    #[serde(rename = "baseline_edf_nearest")]
    Baseline,
    #[serde(rename = "ga_planned")]
    GaReplan,
}

impl DispatchReason {
    pub fn from_run_mode(mode: RunMode) -> Self {
        match mode {
            RunMode::Baseline => DispatchReason::Baseline,
            RunMode::Ga => DispatchReason::GaReplan,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobAssignedEvent {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub job_id: String,
    pub robot_id: u32,
    pub reason: DispatchReason,
    /// `{run_id}:{job_id}` — lets a consumer replaying the log collapse duplicate
    /// deliveries of the same assignment.
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobCompletedEvent {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub job_id: String,
    pub robot_id: u32,
    pub lateness_s: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobFailedEvent {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub job_id: String,
    pub robot_id: u32,
    pub lateness_s: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotTickEvent {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub tick: u64,
    pub robots: Vec<amr_entities::Robot>,
    pub jobs: Vec<amr_entities::Job>,
}

/// Raw telemetry as observed before it becomes the robot's authoritative state.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryReceivedEvent {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub robot_id: u32,
    pub x: f64,
    pub y: f64,
    pub battery: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_core::RunId;

    fn envelope() -> Envelope {
        Envelope::new(&RunId::from("run-1"), "robot.updated", "1", "baseline", 1, "mini", 0)
    }

    #[test]
    fn test_robot_updated_event_serializes_with_flattened_envelope_and_flat_fields() {
        let event = RobotUpdatedEvent {
            envelope: envelope(),
            robot_id: 1,
            state: "idle".to_string(),
            x: 0.0,
            y: 0.0,
            speed: 1.0,
            battery: 100.0,
            current_job_id: None,
        };
        let value = to_canonical_json(&event);
        assert!(value.get("event_id").is_some());
        assert_eq!(value.get("robot_id").and_then(|v| v.as_u64()), Some(1));
        assert_eq!(value.get("state").and_then(|v| v.as_str()), Some("idle"));
        assert!(value.get("robot").is_none());
    }

    #[test]
    fn test_dispatch_reason_serializes_to_wire_strings() {
        assert_eq!(serde_json::to_value(DispatchReason::Baseline).unwrap(), "baseline_edf_nearest");
        assert_eq!(serde_json::to_value(DispatchReason::GaReplan).unwrap(), "ga_planned");
    }

    #[test]
    fn test_dispatch_reason_maps_from_run_mode() {
        assert_eq!(DispatchReason::from_run_mode(RunMode::Baseline), DispatchReason::Baseline);
        assert_eq!(DispatchReason::from_run_mode(RunMode::Ga), DispatchReason::GaReplan);
    }
}
