//! Shared types and error hierarchy for Permix.

pub mod error;
pub mod rule;
pub mod schema;
pub mod state;

pub use error::{ConfigError, PermixError, ValidationError};
pub use rule::{ALL_ACTIONS, Actions, EntityRules, Predicate, Rule, Rules};
pub use schema::{Definition, EntitySchema, Schema};
pub use state::StateJson;
