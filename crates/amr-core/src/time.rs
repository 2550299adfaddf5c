//! Continuous simulation time, used internally by the engine's tick arithmetic.
//!
//! The wire-level contract (`sim_time_s`) is always an integer number of seconds
//! (`tick // tick_hz`); `SimTime` exists for the sub-tick arithmetic that produces it.

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub fn from_seconds(s: f64) -> Self {
        SimTime(s)
    }

    pub fn as_seconds(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Truncating integer seconds, matching `tick // tick_hz` in the source engine.
    pub fn as_integer_seconds(&self) -> i64 {
        self.0.floor() as i64
    }
}

impl Add for SimTime {
    type Output = SimTime;
    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl Sub for SimTime {
    type Output = SimTime;
    fn sub(self, rhs: SimTime) -> SimTime {
        SimTime(self.0 - rhs.0)
    }
}

impl AddAssign for SimTime {
    fn add_assign(&mut self, rhs: SimTime) {
        self.0 += rhs.0;
    }
}

impl SubAssign for SimTime {
    fn sub_assign(&mut self, rhs: SimTime) {
        self.0 -= rhs.0;
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_seconds_truncates() {
        assert_eq!(SimTime::from_seconds(4.8).as_integer_seconds(), 4);
        assert_eq!(SimTime::from_seconds(5.0).as_integer_seconds(), 5);
    }

    #[test]
    fn test_arithmetic() {
        let mut t = SimTime::ZERO;
        t += SimTime::from_seconds(0.2);
        t += SimTime::from_seconds(0.2);
        assert!((t.as_seconds() - 0.4).abs() < 1e-9);
    }
}
