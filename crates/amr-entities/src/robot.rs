//! Robot entity and its lifecycle state machine.

use amr_core::{JobId, RobotId};
use serde::{Deserialize, Serialize};

/// A robot's place in the pickup/dropoff lifecycle. Closed sum type, matched
/// exhaustively at every call site rather than modeled via trait objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotState {
    Idle,
    MovingToPickup,
    MovingToDropoff,
    /// `resume` is the state the robot was in when its battery hit zero; it is restored
    /// verbatim once battery recovers past `charge_resume_threshold`.
    Charging { resume: Box<RobotState> },
}

impl RobotState {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            RobotState::Idle => "idle",
            RobotState::MovingToPickup => "moving_to_pickup",
            RobotState::MovingToDropoff => "moving_to_dropoff",
            RobotState::Charging { .. } => "charging",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, RobotState::Idle)
    }

    pub fn is_moving(&self) -> bool {
        matches!(self, RobotState::MovingToPickup | RobotState::MovingToDropoff)
    }

    pub fn is_charging(&self) -> bool {
        matches!(self, RobotState::Charging { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    pub id: RobotId,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub battery: f64,
    pub state: RobotState,
    pub current_job_id: Option<JobId>,
    pub target: Option<(f64, f64)>,
    /// Residual service time at the pickup phase.
    pub phase_remaining_s: f64,
    /// Residual service time at the dropoff phase, tracked separately from
    /// `phase_remaining_s` rather than reusing it.
    pub dropoff_remaining_s: f64,
    pub distance_traveled: f64,
}

impl Robot {
    pub fn new(id: RobotId, x: f64, y: f64, speed: f64) -> Self {
        Self {
            id,
            x,
            y,
            speed,
            battery: 100.0,
            state: RobotState::Idle,
            current_job_id: None,
            target: None,
            phase_remaining_s: 0.0,
            dropoff_remaining_s: 0.0,
            distance_traveled: 0.0,
        }
    }

    pub fn is_eligible(&self, battery_threshold: f64) -> bool {
        self.state.is_idle() && self.battery >= battery_threshold
    }

    /// `apply_assignment` precondition: robot must be idle.
    pub fn assign(&mut self, job_id: JobId, pickup: (f64, f64)) {
        self.current_job_id = Some(job_id);
        self.target = Some(pickup);
        self.phase_remaining_s = 0.0;
        self.state = RobotState::MovingToPickup;
    }

    pub fn begin_dropoff(&mut self, dropoff: (f64, f64)) {
        self.target = Some(dropoff);
        self.dropoff_remaining_s = 0.0;
        self.state = RobotState::MovingToDropoff;
    }

    pub fn complete_job(&mut self) {
        self.current_job_id = None;
        self.target = None;
        self.phase_remaining_s = 0.0;
        self.dropoff_remaining_s = 0.0;
        self.state = RobotState::Idle;
    }

    pub fn enter_charging(&mut self) {
        if !self.state.is_charging() {
            self.state = RobotState::Charging {
                resume: Box::new(self.state.clone()),
            };
        }
    }

    pub fn resume_from_charging(&mut self) {
        if let RobotState::Charging { resume } = &self.state {
            self.state = (**resume).clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_robot() -> Robot {
        Robot::new(RobotId(1), 0.0, 0.0, 1.5)
    }

    #[test]
    fn test_new_robot_is_idle_full_battery() {
        let r = make_robot();
        assert!(r.state.is_idle());
        assert_eq!(r.battery, 100.0);
        assert!(r.current_job_id.is_none());
    }

    #[test]
    fn test_assign_transitions_to_moving_to_pickup() {
        let mut r = make_robot();
        r.assign(JobId::from("job_1"), (3.0, 4.0));
        assert_eq!(r.state, RobotState::MovingToPickup);
        assert_eq!(r.target, Some((3.0, 4.0)));
        assert_eq!(r.current_job_id, Some(JobId::from("job_1")));
    }

    #[test]
    fn test_charging_remembers_and_resumes_prior_state() {
        let mut r = make_robot();
        r.assign(JobId::from("job_1"), (3.0, 4.0));
        r.enter_charging();
        assert!(r.state.is_charging());
        r.resume_from_charging();
        assert_eq!(r.state, RobotState::MovingToPickup);
    }

    #[test]
    fn test_complete_job_clears_job_fields() {
        let mut r = make_robot();
        r.assign(JobId::from("job_1"), (3.0, 4.0));
        r.begin_dropoff((9.0, 9.0));
        r.complete_job();
        assert!(r.state.is_idle());
        assert!(r.current_job_id.is_none());
        assert!(r.target.is_none());
    }

    #[test]
    fn test_eligibility_requires_idle_and_battery() {
        let mut r = make_robot();
        assert!(r.is_eligible(20.0));
        r.battery = 5.0;
        assert!(!r.is_eligible(20.0));
        r.battery = 100.0;
        r.assign(JobId::from("job_1"), (1.0, 1.0));
        assert!(!r.is_eligible(20.0));
    }
}
