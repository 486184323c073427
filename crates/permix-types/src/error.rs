//! Error hierarchy for Permix.

use thiserror::Error;

/// Top-level error type for all Permix operations.
#[derive(Debug, Error)]
pub enum PermixError {
    #[error("Permissions are not valid: {0}")]
    Validation(#[from] ValidationError),

    #[error("Permix instance is not valid")]
    InvalidInstance,

    #[error("Rules weren't provided. Call setup and try again")]
    Uninitialized,
}

/// Structural problems with a candidate rule set or snapshot.
///
/// Always caller-correctable: the same input fails the same way every time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rule set must be an object")]
    NotAnObject,

    #[error("rules for entity '{entity}' must be an object")]
    EntityNotObject { entity: String },

    #[error("rule '{entity}.{action}' must be a boolean or a predicate")]
    InvalidActionValue { entity: String, action: String },

    #[error("unknown entity '{entity}'")]
    UnknownEntity { entity: String },

    #[error("unknown action '{action}' for entity '{entity}'")]
    UnknownAction { entity: String, action: String },
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },
}
