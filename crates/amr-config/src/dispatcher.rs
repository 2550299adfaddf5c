//! Dispatcher worker settings, mirroring `dispatcher-worker-py/app/settings.py`.

use serde::{Deserialize, Serialize};

use crate::env::{env_parsed, env_string};

fn default_battery_threshold() -> f64 {
    20.0
}
fn default_ga_replan_interval_s() -> i64 {
    0
}
fn default_optimizer_url() -> String {
    "http://optimizer-service:8002".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatcherSettings {
    #[serde(default = "default_battery_threshold")]
    pub battery_threshold: f64,
    /// 0 disables periodic GA replanning.
    #[serde(default = "default_ga_replan_interval_s")]
    pub ga_replan_interval_s: i64,
    #[serde(default = "default_optimizer_url")]
    pub optimizer_url: String,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            battery_threshold: default_battery_threshold(),
            ga_replan_interval_s: default_ga_replan_interval_s(),
            optimizer_url: default_optimizer_url(),
        }
    }
}

impl DispatcherSettings {
    pub fn from_env() -> Self {
        Self {
            battery_threshold: env_parsed("BATTERY_THRESHOLD", default_battery_threshold()),
            ga_replan_interval_s: env_parsed("GA_REPLAN_INTERVAL_S", default_ga_replan_interval_s()),
            optimizer_url: env_string("OPTIMIZER_URL", &default_optimizer_url()),
        }
    }
}
