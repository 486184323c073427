//! Runtime permission state container for Permix.
//!
//! Rules: entity → action → boolean or predicate
//! Lifecycle: uninitialized → setup → ready
//! Hook events: setup / ready / hydrate

pub mod check;
pub mod engine;
pub mod hooks;
pub mod instance;
pub mod ready;
pub mod serialize;
pub mod template;
pub mod types;
pub mod validator;

pub use check::check_with_rules;
pub use engine::Permix;
pub use hooks::{HookEmitter, Unsubscribe};
pub use instance::{get_rules, validate};
pub use ready::ReadySignal;
pub use template::Template;
pub use types::*;
pub use validator::{is_rules_valid, rules_from_value, validate_value};

pub use permix_types::*;
