//! Typed identifiers.
//!
//! Robots are identified by a small positive integer assigned by the scenario
//! generator; jobs and runs are identified by strings. Both get the same
//! `Debug`/`Display`/`From` ergonomics so call sites never pass a bare `u32` or
//! `String` where an id is expected.

use std::fmt;

macro_rules! define_int_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }
    };
}

macro_rules! define_string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(v: String) -> Self {
                Self(v)
            }
        }

        impl From<&str> for $name {
            fn from(v: &str) -> Self {
                Self(v.to_string())
            }
        }
    };
}

define_int_id!(RobotId);
define_string_id!(JobId);
define_string_id!(RunId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robot_id_display_and_from() {
        let id: RobotId = 3u32.into();
        assert_eq!(id.0, 3);
        assert_eq!(format!("{}", id), "3");
    }

    #[test]
    fn test_job_id_from_str() {
        let id: JobId = "job_7".into();
        assert_eq!(id.as_str(), "job_7");
        assert_eq!(format!("{}", id), "job_7");
    }

    #[test]
    fn test_ids_ordered_and_hashable() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(RobotId(1));
        set.insert(RobotId(1));
        set.insert(RobotId(2));
        assert_eq!(set.len(), 2);
        assert!(RobotId(1) < RobotId(2));
    }
}
