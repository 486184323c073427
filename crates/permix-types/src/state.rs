//! JSON-safe snapshot of a rule set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entity name → action name → boolean.
///
/// Wire format is the plain nested object, with no version or schema tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateJson(pub BTreeMap<String, BTreeMap<String, bool>>);

impl StateJson {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a single stored boolean.
    pub fn get(&self, entity: &str, action: &str) -> Option<bool> {
        self.0.get(entity).and_then(|a| a.get(action)).copied()
    }

    pub fn insert(&mut self, entity: impl Into<String>, action: impl Into<String>, allowed: bool) {
        self.0
            .entry(entity.into())
            .or_default()
            .insert(action.into(), allowed);
    }

    pub fn entities(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, bool>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
