//! Runtime projection of a permission definition.

use crate::error::ValidationError;
use crate::state::StateJson;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Declared shape of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Action names the entity supports.
    #[serde(default)]
    pub actions: BTreeSet<String>,
    /// Whether predicates for this entity must be called with data.
    #[serde(default)]
    pub data_required: bool,
}

impl EntitySchema {
    pub fn new<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actions: actions.into_iter().map(Into::into).collect(),
            data_required: false,
        }
    }

    pub fn data_required(mut self) -> Self {
        self.data_required = true;
        self
    }
}

/// Entity name → declared actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    entities: BTreeMap<String, EntitySchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, name: impl Into<String>, entity: EntitySchema) -> Self {
        self.entities.insert(name.into(), entity);
        self
    }

    pub fn entity(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.get(name)
    }

    pub fn entities(&self) -> impl Iterator<Item = (&str, &EntitySchema)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether checks on `entity` must carry data.
    pub fn requires_data(&self, entity: &str) -> bool {
        self.entities.get(entity).is_some_and(|e| e.data_required)
    }

    /// Check that every entity and action in a snapshot is declared.
    pub fn check_state(&self, state: &StateJson) -> Result<(), ValidationError> {
        for (entity, actions) in state.entities() {
            let declared = self
                .entities
                .get(entity)
                .ok_or_else(|| ValidationError::UnknownEntity {
                    entity: entity.to_string(),
                })?;
            if let Some(action) = actions.keys().find(|a| !declared.actions.contains(*a)) {
                return Err(ValidationError::UnknownAction {
                    entity: entity.to_string(),
                    action: action.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Binds a compile-time marker type to its schema.
///
/// ```ignore
/// struct Blog;
///
/// impl Definition for Blog {
///     fn schema() -> Schema {
///         Schema::new().with_entity("post", EntitySchema::new(["create", "edit"]))
///     }
/// }
///
/// let permix = Permix::for_definition::<Blog>();
/// ```
pub trait Definition {
    fn schema() -> Schema;
}
