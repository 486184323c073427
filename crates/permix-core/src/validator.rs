//! Rule validator — structural checks on candidate rule sets.
//!
//! Only shapes are checked here. Whether names match the schema is decided
//! at check time, or by `hydrate` for snapshots.

use permix_types::{EntityRules, Rules, ValidationError};
use serde_json::Value;

/// Whether an untyped candidate has the shape of a rule set.
pub fn is_rules_valid(candidate: &Value) -> bool {
    validate_value(candidate).is_ok()
}

/// Like [`is_rules_valid`], but reports the first offending entry.
///
/// JSON cannot carry predicates, so every action value must be a boolean.
pub fn validate_value(candidate: &Value) -> Result<(), ValidationError> {
    let Value::Object(entities) = candidate else {
        return Err(ValidationError::NotAnObject);
    };

    for (entity, actions) in entities {
        let Value::Object(actions) = actions else {
            return Err(ValidationError::EntityNotObject {
                entity: entity.clone(),
            });
        };
        if let Some((action, _)) = actions.iter().find(|(_, v)| !v.is_boolean()) {
            return Err(ValidationError::InvalidActionValue {
                entity: entity.clone(),
                action: action.clone(),
            });
        }
    }

    Ok(())
}

/// Convert an untyped candidate into a rule set, validating it first.
pub fn rules_from_value(candidate: &Value) -> Result<Rules, ValidationError> {
    validate_value(candidate)?;

    let mut rules = Rules::new();
    if let Value::Object(entities) = candidate {
        for (entity, actions) in entities {
            let mut entity_rules = EntityRules::new();
            if let Value::Object(actions) = actions {
                for (action, value) in actions {
                    entity_rules.insert(action.as_str(), value.as_bool().unwrap_or(false));
                }
            }
            rules.insert(entity.as_str(), entity_rules);
        }
    }

    Ok(rules)
}
