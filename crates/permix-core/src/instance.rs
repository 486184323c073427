//! Instance validation for containers handed around as opaque values.

use crate::engine::Permix;
use permix_types::{PermixError, Rules};
use std::any::Any;
use std::sync::Arc;

/// Assert that `value` is a container built by this engine.
pub fn validate(value: &dyn Any) -> Result<&Permix, PermixError> {
    value
        .downcast_ref::<Permix>()
        .ok_or(PermixError::InvalidInstance)
}

/// Rules of an opaque container value.
pub fn get_rules(value: &dyn Any) -> Result<Arc<Rules>, PermixError> {
    validate(value)?.get_rules()
}
