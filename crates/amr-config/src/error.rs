//! Crate error taxonomy, following the IO/format/validation split used elsewhere in
//! this workspace's config loading.

use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config file format: {0}")]
    UnsupportedFormat(String),

    #[error("validation failed with {} error(s): {}", .0.len(), join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

pub type ConfigResult<T> = Result<T, ConfigError>;
