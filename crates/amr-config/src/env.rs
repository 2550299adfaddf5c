//! Environment-variable parsing helpers, mirroring the original `_int_env`: an unset
//! or empty variable falls back to the caller's default rather than erroring.

use std::env;
use std::str::FromStr;

pub fn env_string(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(raw) if !raw.is_empty() => raw,
        _ => default.to_string(),
    }
}

pub fn env_parsed<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) if !raw.is_empty() => raw.parse().unwrap_or(default),
        _ => default,
    }
}

/// `None` when the variable is unset/empty, matching `_int_env`'s own "" sentinel
/// used for the joint `FLEET_ROBOTS`/`FLEET_JOBS` override check.
pub fn env_opt_parsed<T: FromStr>(name: &str) -> Option<T> {
    match env::var(name) {
        Ok(raw) if !raw.is_empty() => raw.parse().ok(),
        _ => None,
    }
}
