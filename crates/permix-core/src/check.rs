//! Check algorithm — evaluates an entity/action query against a rule set.

use permix_types::{Actions, Rule, Rules, Schema};
use serde_json::Value;

/// Evaluate `actions` on `entity` against `rules`.
///
/// Never fails. Missing rules, unknown entities and unknown actions deny.
/// Multiple actions (a list or `all`) are ANDed; evaluation stops at the
/// first denial.
pub fn check_with_rules(
    rules: Option<&Rules>,
    schema: &Schema,
    entity: &str,
    actions: &Actions,
    data: Option<&Value>,
) -> bool {
    let Some(rules) = rules else {
        tracing::warn!("Rules weren't provided. Please setup permissions and try again");
        return false;
    };

    let Some(entity_rules) = rules.entity(entity) else {
        tracing::warn!(
            entity,
            "Incorrect entity name. Please check the name of your validation entity"
        );
        return false;
    };

    let data_required = schema.requires_data(entity);
    let evaluate = |action: &str, rule: Option<&Rule>| match rule {
        Some(Rule::Predicate(_)) if data_required && data.is_none() => {
            tracing::warn!(entity, action, "Predicate requires data but none was passed");
            false
        }
        Some(rule) => rule.evaluate(data),
        None => {
            tracing::debug!(entity, action, "No rule for action");
            false
        }
    };

    match actions {
        Actions::All => entity_rules
            .iter()
            .all(|(action, rule)| evaluate(action, Some(rule))),
        Actions::One(action) => evaluate(action, entity_rules.get(action)),
        Actions::Many(names) => names
            .iter()
            .all(|action| evaluate(action, entity_rules.get(action))),
    }
}
