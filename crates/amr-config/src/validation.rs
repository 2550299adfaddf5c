//! Settings validation (`FieldPath`, a tailored `ValidationErrorKind`, phased
//! collection into a `Result<Vec<warning>, Vec<error>>`), targeted at
//! scale/override consistency, tick-rate/time positivity, GA parameter ranges, and
//! battery-threshold bounds.

use std::fmt;

use crate::dispatcher::DispatcherSettings;
use crate::optimizer::OptimizerSettings;
use crate::scenario::ScenarioSettings;

/// Path to a configuration field (e.g. "robots.speed_max").
#[derive(Debug, Clone)]
pub struct FieldPath(pub String);

impl FieldPath {
    pub fn new(path: &str) -> Self {
        Self(path.to_string())
    }

    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub path: FieldPath,
    pub kind: ValidationErrorKind,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(path: FieldPath, kind: ValidationErrorKind) -> Self {
        Self { path, kind, suggestion: None }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.path, self.kind)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum ValidationErrorKind {
    UnknownScale { scale: String, known: Vec<&'static str> },
    OverridesNotJoint,
    ValueMustBePositive { field: String, value: f64 },
    ValueOutOfRange { field: String, value: f64, min: f64, max: f64 },
    SpeedRangeInverted { min: f64, max: f64 },
    EmptyOptimizerUrl,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownScale { scale, known } => {
                write!(f, "unknown scale '{scale}', expected one of: {}", known.join(", "))
            }
            Self::OverridesNotJoint => {
                write!(f, "robots_override and jobs_override must be set together")
            }
            Self::ValueMustBePositive { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
            Self::ValueOutOfRange { field, value, min, max } => {
                write!(f, "{field} must be in [{min}, {max}], got {value}")
            }
            Self::SpeedRangeInverted { min, max } => {
                write!(f, "robot_speed_min ({min}) must not exceed robot_speed_max ({max})")
            }
            Self::EmptyOptimizerUrl => write!(f, "optimizer_url must not be empty"),
        }
    }
}

#[derive(Debug, Default)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<ValidationError>, Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

const KNOWN_SCALES: [&str; 4] = ["mini", "small", "demo", "large"];

/// Phase 1: scale/override/world consistency for a `ScenarioSettings`.
pub fn validate_scenario_standalone(scenario: &ScenarioSettings, ctx: &mut ValidationErrors) {
    let path = FieldPath::root();

    if !KNOWN_SCALES.contains(&scenario.scale.as_str()) {
        ctx.add_error(ValidationError::new(
            path.field("scale"),
            ValidationErrorKind::UnknownScale {
                scale: scenario.scale.clone(),
                known: KNOWN_SCALES.to_vec(),
            },
        ));
    }

    match (scenario.robots_override, scenario.jobs_override) {
        (Some(_), None) | (None, Some(_)) => {
            ctx.add_error(ValidationError::new(path.field("robots_override"), ValidationErrorKind::OverridesNotJoint));
        }
        _ => {}
    }

    if scenario.world_size <= 0.0 {
        ctx.add_error(ValidationError::new(
            path.field("world_size"),
            ValidationErrorKind::ValueMustBePositive { field: "world_size".into(), value: scenario.world_size },
        ));
    }

    if scenario.sim_tick_hz == 0 {
        ctx.add_error(ValidationError::new(
            path.field("sim_tick_hz"),
            ValidationErrorKind::ValueMustBePositive { field: "sim_tick_hz".into(), value: scenario.sim_tick_hz as f64 },
        ));
    }

    if scenario.max_sim_seconds <= 0 {
        ctx.add_error(ValidationError::new(
            path.field("max_sim_seconds"),
            ValidationErrorKind::ValueMustBePositive { field: "max_sim_seconds".into(), value: scenario.max_sim_seconds as f64 },
        ));
    }

    if scenario.robot_speed_min > scenario.robot_speed_max {
        ctx.add_error(ValidationError::new(
            path.field("robot_speed_min"),
            ValidationErrorKind::SpeedRangeInverted { min: scenario.robot_speed_min, max: scenario.robot_speed_max },
        ));
    }

    if scenario.charge_resume_threshold < 0.0 || scenario.charge_resume_threshold > 100.0 {
        ctx.add_warning(ValidationError::new(
            path.field("charge_resume_threshold"),
            ValidationErrorKind::ValueOutOfRange {
                field: "charge_resume_threshold".into(),
                value: scenario.charge_resume_threshold,
                min: 0.0,
                max: 100.0,
            },
        ));
    }
}

/// Phase 2: dispatcher-specific bounds.
pub fn validate_dispatcher_standalone(dispatcher: &DispatcherSettings, ctx: &mut ValidationErrors) {
    let path = FieldPath::root();

    if dispatcher.battery_threshold < 0.0 || dispatcher.battery_threshold > 100.0 {
        ctx.add_error(ValidationError::new(
            path.field("battery_threshold"),
            ValidationErrorKind::ValueOutOfRange {
                field: "battery_threshold".into(),
                value: dispatcher.battery_threshold,
                min: 0.0,
                max: 100.0,
            },
        ));
    }

    if dispatcher.ga_replan_interval_s < 0 {
        ctx.add_error(ValidationError::new(
            path.field("ga_replan_interval_s"),
            ValidationErrorKind::ValueMustBePositive {
                field: "ga_replan_interval_s".into(),
                value: dispatcher.ga_replan_interval_s as f64,
            },
        ));
    }

    if dispatcher.optimizer_url.trim().is_empty() {
        ctx.add_error(ValidationError::new(path.field("optimizer_url"), ValidationErrorKind::EmptyOptimizerUrl));
    }
}

/// Phase 3: GA parameter ranges.
pub fn validate_optimizer_standalone(optimizer: &OptimizerSettings, ctx: &mut ValidationErrors) {
    let path = FieldPath::root();

    if optimizer.population_size == 0 {
        ctx.add_error(ValidationError::new(
            path.field("population_size"),
            ValidationErrorKind::ValueMustBePositive { field: "population_size".into(), value: 0.0 },
        ));
    }

    if optimizer.elite_size as usize > optimizer.population_size {
        ctx.add_error(ValidationError::new(
            path.field("elite_size"),
            ValidationErrorKind::ValueOutOfRange {
                field: "elite_size".into(),
                value: optimizer.elite_size as f64,
                min: 0.0,
                max: optimizer.population_size as f64,
            },
        ));
    }

    for (field, value) in [
        ("crossover_rate", optimizer.crossover_rate),
        ("mutation_rate", optimizer.mutation_rate),
    ] {
        if !(0.0..=1.0).contains(&value) {
            ctx.add_error(ValidationError::new(
                path.field(field),
                ValidationErrorKind::ValueOutOfRange { field: field.into(), value, min: 0.0, max: 1.0 },
            ));
        }
    }

    if optimizer.service_time_s < 0.0 {
        ctx.add_error(ValidationError::new(
            path.field("service_time_s"),
            ValidationErrorKind::ValueMustBePositive { field: "service_time_s".into(), value: optimizer.service_time_s },
        ));
    }
}

/// Validate a full settings triple: scenario standalone, then each collaborator
/// standalone. There's no map/storage cross-reference phase to run here, unlike a
/// warehouse-layout config.
pub fn validate_settings(
    scenario: &ScenarioSettings,
    dispatcher: &DispatcherSettings,
    optimizer: &OptimizerSettings,
) -> Result<Vec<ValidationError>, Vec<ValidationError>> {
    let mut ctx = ValidationErrors::new();
    validate_scenario_standalone(scenario, &mut ctx);
    validate_dispatcher_standalone(dispatcher, &mut ctx);
    validate_optimizer_standalone(optimizer, &mut ctx);
    ctx.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_scale_is_rejected() {
        let mut scenario = ScenarioSettings::default();
        scenario.scale = "huge".into();
        let mut ctx = ValidationErrors::new();
        validate_scenario_standalone(&scenario, &mut ctx);
        assert!(ctx.has_errors());
    }

    #[test]
    fn test_lone_robots_override_is_rejected() {
        let mut scenario = ScenarioSettings::default();
        scenario.robots_override = Some(5);
        let mut ctx = ValidationErrors::new();
        validate_scenario_standalone(&scenario, &mut ctx);
        assert!(ctx.has_errors());
    }

    #[test]
    fn test_default_settings_validate_clean() {
        let result = validate_settings(
            &ScenarioSettings::default(),
            &DispatcherSettings::default(),
            &OptimizerSettings::default(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_battery_threshold_out_of_range_is_rejected() {
        let mut dispatcher = DispatcherSettings::default();
        dispatcher.battery_threshold = 150.0;
        let mut ctx = ValidationErrors::new();
        validate_dispatcher_standalone(&dispatcher, &mut ctx);
        assert!(ctx.has_errors());
    }

    #[test]
    fn test_elite_size_exceeding_population_is_rejected() {
        let mut optimizer = OptimizerSettings::default();
        optimizer.elite_size = optimizer.population_size as u32 + 1;
        let mut ctx = ValidationErrors::new();
        validate_optimizer_standalone(&optimizer, &mut ctx);
        assert!(ctx.has_errors());
    }
}
