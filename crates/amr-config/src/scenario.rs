//! Scenario/simulation settings, mirroring the original `sim-runner-py/app/settings.py`
//! env defaults plus optional YAML/JSON file loading so the CLI doesn't require
//! exporting two dozen env vars for one run.

use serde::{Deserialize, Serialize};

use crate::env::{env_opt_parsed, env_parsed, env_string};
use crate::error::ConfigError;

fn default_scale() -> String {
    "demo".to_string()
}
fn default_seed() -> u64 {
    42
}
fn default_mode() -> String {
    "baseline".to_string()
}
fn default_world_size() -> f64 {
    100.0
}
fn default_robot_speed_min() -> f64 {
    1.0
}
fn default_robot_speed_max() -> f64 {
    2.0
}
fn default_sim_tick_hz() -> u32 {
    5
}
fn default_telemetry_hz() -> u32 {
    1
}
fn default_max_sim_seconds() -> i64 {
    3600
}
fn default_service_time_s() -> f64 {
    5.0
}
fn default_charge_rate() -> f64 {
    5.0
}
fn default_charge_resume_threshold() -> f64 {
    20.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSettings {
    #[serde(default = "default_scale")]
    pub scale: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub robots_override: Option<u32>,
    #[serde(default)]
    pub jobs_override: Option<u32>,
    #[serde(default = "default_world_size")]
    pub world_size: f64,
    #[serde(default = "default_robot_speed_min")]
    pub robot_speed_min: f64,
    #[serde(default = "default_robot_speed_max")]
    pub robot_speed_max: f64,
    #[serde(default = "default_sim_tick_hz")]
    pub sim_tick_hz: u32,
    #[serde(default = "default_telemetry_hz")]
    pub telemetry_hz: u32,
    #[serde(default = "default_max_sim_seconds")]
    pub max_sim_seconds: i64,
    #[serde(default = "default_service_time_s")]
    pub service_time_s: f64,
    #[serde(default = "default_charge_rate")]
    pub charge_rate: f64,
    #[serde(default = "default_charge_resume_threshold")]
    pub charge_resume_threshold: f64,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            seed: default_seed(),
            mode: default_mode(),
            robots_override: None,
            jobs_override: None,
            world_size: default_world_size(),
            robot_speed_min: default_robot_speed_min(),
            robot_speed_max: default_robot_speed_max(),
            sim_tick_hz: default_sim_tick_hz(),
            telemetry_hz: default_telemetry_hz(),
            max_sim_seconds: default_max_sim_seconds(),
            service_time_s: default_service_time_s(),
            charge_rate: default_charge_rate(),
            charge_resume_threshold: default_charge_resume_threshold(),
        }
    }
}

impl ScenarioSettings {
    /// Equivalent of the original `Settings` dataclass: every field read straight
    /// from its env var with a fallback default, no file involved.
    pub fn from_env() -> Self {
        Self {
            scale: env_string("FLEET_SCALE", &default_scale()),
            seed: env_parsed("FLEET_SEED", default_seed()),
            mode: env_string("FLEET_MODE", &default_mode()),
            robots_override: env_opt_parsed("FLEET_ROBOTS"),
            jobs_override: env_opt_parsed("FLEET_JOBS"),
            world_size: env_parsed("WORLD_SIZE", default_world_size()),
            robot_speed_min: env_parsed("ROBOT_SPEED_MIN", default_robot_speed_min()),
            robot_speed_max: env_parsed("ROBOT_SPEED_MAX", default_robot_speed_max()),
            sim_tick_hz: env_parsed("SIM_TICK_HZ", default_sim_tick_hz()),
            telemetry_hz: env_parsed("TELEMETRY_HZ", default_telemetry_hz()),
            max_sim_seconds: env_parsed("MAX_SIM_SECONDS", default_max_sim_seconds()),
            service_time_s: env_parsed("SERVICE_TIME_S", default_service_time_s()),
            charge_rate: env_parsed("CHARGE_RATE", default_charge_rate()),
            charge_resume_threshold: env_parsed(
                "CHARGE_RESUME_THRESHOLD",
                default_charge_resume_threshold(),
            ),
        }
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        if !(path.ends_with(".yaml") || path.ends_with(".yml") || path.ends_with(".json")) {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        if path.ends_with(".json") {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_settings_py() {
        let settings = ScenarioSettings::default();
        assert_eq!(settings.scale, "demo");
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.mode, "baseline");
        assert_eq!(settings.sim_tick_hz, 5);
    }

    #[test]
    fn test_from_yaml_applies_partial_overrides_over_defaults() {
        let settings = ScenarioSettings::from_yaml("scale: large\nseed: 7\n").unwrap();
        assert_eq!(settings.scale, "large");
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.world_size, 100.0);
    }

    #[test]
    fn test_from_file_rejects_unknown_extension() {
        let result = ScenarioSettings::from_file("/tmp/does-not-matter.toml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
