//! Environment- and file-backed settings for the scenario/dispatcher/optimizer
//! surfaces, grounded in the original `settings.py` env-default pattern and a
//! file-loading/validation idiom shared with the rest of the workspace.

pub mod dispatcher;
pub mod env;
pub mod error;
pub mod optimizer;
pub mod scenario;
pub mod validation;

pub use dispatcher::DispatcherSettings;
pub use error::{ConfigError, ConfigResult};
pub use optimizer::OptimizerSettings;
pub use scenario::ScenarioSettings;
pub use validation::{
    validate_settings, FieldPath, ValidationError, ValidationErrorKind, ValidationErrors,
};
