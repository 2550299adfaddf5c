//! Optimizer service settings, mirroring `optimizer-service-py/app/settings.py`.

use amr_ga::GaParams;
use serde::{Deserialize, Serialize};

use crate::env::{env_parsed, env_string};

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8002
}
fn default_service_time_s() -> f64 {
    5.0
}
fn default_population_size() -> usize {
    64
}
fn default_generations() -> u32 {
    80
}
fn default_elite_size() -> u32 {
    4
}
fn default_mutation_rate() -> f64 {
    0.10
}
fn default_crossover_rate() -> f64 {
    0.90
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_service_time_s")]
    pub service_time_s: f64,
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    #[serde(default = "default_generations")]
    pub generations: u32,
    #[serde(default = "default_elite_size")]
    pub elite_size: u32,
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            service_time_s: default_service_time_s(),
            population_size: default_population_size(),
            generations: default_generations(),
            elite_size: default_elite_size(),
            mutation_rate: default_mutation_rate(),
            crossover_rate: default_crossover_rate(),
        }
    }
}

impl OptimizerSettings {
    pub fn from_env() -> Self {
        Self {
            host: env_string("OPTIMIZER_HOST", &default_host()),
            port: env_parsed("OPTIMIZER_PORT", default_port()),
            service_time_s: env_parsed("SERVICE_TIME_S", default_service_time_s()),
            population_size: env_parsed("GA_POPULATION_SIZE", default_population_size()),
            generations: env_parsed("GA_GENERATIONS", default_generations()),
            elite_size: env_parsed("GA_ELITE_SIZE", default_elite_size()),
            mutation_rate: env_parsed("GA_MUTATION_RATE", default_mutation_rate()),
            crossover_rate: env_parsed("GA_CROSSOVER_RATE", default_crossover_rate()),
        }
    }

    pub fn to_ga_params(&self) -> GaParams {
        GaParams {
            population_size: self.population_size,
            generations: self.generations,
            elite_size: self.elite_size as usize,
            crossover_rate: self.crossover_rate,
            mutation_rate: self.mutation_rate,
            service_time_s: self.service_time_s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_settings_py() {
        let settings = OptimizerSettings::default();
        assert_eq!(settings.population_size, 64);
        assert_eq!(settings.generations, 80);
        assert_eq!(settings.elite_size, 4);
        assert_eq!(settings.mutation_rate, 0.10);
        assert_eq!(settings.crossover_rate, 0.90);
    }

    #[test]
    fn test_to_ga_params_carries_fields_through() {
        let settings = OptimizerSettings::default();
        let params = settings.to_ga_params();
        assert_eq!(params.population_size, 64);
        assert_eq!(params.elite_size, 4);
    }
}
