//! Crate-wide error taxonomy, following a named-constructor pattern for common
//! not-found/invalid-state cases instead of building ad hoc `String` errors at every
//! call site.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    pub fn robot_not_found(id: impl std::fmt::Display) -> Self {
        CoreError::NotFound {
            entity_type: "robot",
            id: id.to_string(),
        }
    }

    pub fn job_not_found(id: impl std::fmt::Display) -> Self {
        CoreError::NotFound {
            entity_type: "job",
            id: id.to_string(),
        }
    }

    pub fn run_not_found(id: impl std::fmt::Display) -> Self {
        CoreError::NotFound {
            entity_type: "run",
            id: id.to_string(),
        }
    }

    pub fn unknown_scale(scale: impl std::fmt::Display) -> Self {
        CoreError::Validation(format!("unknown scale: {scale}"))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
