//! Rule values and rule sets.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Action name that selects every action under the entity in a check.
pub const ALL_ACTIONS: &str = "all";

/// A data-dependent rule. Receives the payload passed to `check`, if any.
pub type Predicate = Arc<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

/// Allow/deny decision for one entity/action pair.
#[derive(Clone)]
pub enum Rule {
    /// Static allow (`true`) or deny (`false`).
    Allow(bool),
    /// Decided per check from the supplied data.
    Predicate(Predicate),
}

impl Rule {
    /// Build a predicate rule from a closure.
    pub fn when<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Rule::Predicate(Arc::new(f))
    }

    /// Evaluate the rule against optional data.
    pub fn evaluate(&self, data: Option<&Value>) -> bool {
        match self {
            Rule::Allow(allowed) => *allowed,
            Rule::Predicate(predicate) => predicate(data),
        }
    }

    pub fn is_predicate(&self) -> bool {
        matches!(self, Rule::Predicate(_))
    }

    /// Boolean projection used for snapshots. Predicates deny.
    pub fn as_static(&self) -> bool {
        match self {
            Rule::Allow(allowed) => *allowed,
            Rule::Predicate(_) => false,
        }
    }
}

impl From<bool> for Rule {
    fn from(allowed: bool) -> Self {
        Rule::Allow(allowed)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Allow(allowed) => write!(f, "Allow({allowed})"),
            Rule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Rules for a single entity, keyed by action name.
#[derive(Debug, Clone, Default)]
pub struct EntityRules {
    actions: BTreeMap<String, Rule>,
}

impl EntityRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, action: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.insert(action, rule);
        self
    }

    pub fn insert(&mut self, action: impl Into<String>, rule: impl Into<Rule>) {
        self.actions.insert(action.into(), rule.into());
    }

    pub fn get(&self, action: &str) -> Option<&Rule> {
        self.actions.get(action)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.actions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// The full rule set: entity name → action name → rule.
///
/// Always replaced as a whole by `setup`; never merged.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    entities: BTreeMap<String, EntityRules>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of an entity's rules.
    pub fn with_entity(mut self, entity: impl Into<String>, rules: EntityRules) -> Self {
        self.insert(entity, rules);
        self
    }

    pub fn insert(&mut self, entity: impl Into<String>, rules: EntityRules) {
        self.entities.insert(entity.into(), rules);
    }

    pub fn entity(&self, entity: &str) -> Option<&EntityRules> {
        self.entities.get(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityRules)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

}

/// Which actions a check evaluates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actions {
    /// Every action present under the entity.
    All,
    One(String),
    /// Exactly these actions; ANDed together.
    Many(Vec<String>),
}

impl From<&str> for Actions {
    fn from(action: &str) -> Self {
        if action == ALL_ACTIONS {
            Actions::All
        } else {
            Actions::One(action.to_string())
        }
    }
}

impl From<String> for Actions {
    fn from(action: String) -> Self {
        Actions::from(action.as_str())
    }
}

impl From<&[&str]> for Actions {
    fn from(actions: &[&str]) -> Self {
        Actions::Many(actions.iter().map(|a| a.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Actions {
    fn from(actions: [&str; N]) -> Self {
        Actions::from(&actions[..])
    }
}

impl From<Vec<&str>> for Actions {
    fn from(actions: Vec<&str>) -> Self {
        Actions::from(actions.as_slice())
    }
}

impl From<Vec<String>> for Actions {
    fn from(actions: Vec<String>) -> Self {
        Actions::Many(actions)
    }
}
