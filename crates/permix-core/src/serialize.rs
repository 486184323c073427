//! Serialization boundary between live rules and JSON snapshots.
//!
//! The conversion is lossy: predicates collapse to `false` and are never
//! reconstructed.

use permix_types::{EntityRules, Rules, StateJson};

/// Project a rule set into a snapshot. Predicates become `false`.
pub fn to_state_json(rules: &Rules) -> StateJson {
    let mut state = StateJson::new();
    for (entity, actions) in rules.iter() {
        state.0.entry(entity.to_string()).or_default();
        for (action, rule) in actions.iter() {
            state.insert(entity, action, rule.as_static());
        }
    }
    state
}

/// Rebuild a rule set from a snapshot. Every value becomes a static rule.
pub fn from_state_json(state: &StateJson) -> Rules {
    let mut rules = Rules::new();
    for (entity, actions) in state.entities() {
        let entity_rules = actions
            .iter()
            .fold(EntityRules::new(), |acc, (action, allowed)| {
                acc.with(action.as_str(), *allowed)
            });
        rules.insert(entity, entity_rules);
    }
    rules
}
