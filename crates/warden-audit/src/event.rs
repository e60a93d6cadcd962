//! Entity mutation events.
//!
//! The persistence layer describes every create, update and delete as a
//! [`MutationEvent`]: the entity kind, the action, snapshots on either side
//! and the acting principal, if any.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_core::{PrincipalId, normalize_slug};

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationAction {
    /// The entity was inserted.
    Created,
    /// The entity was changed in place.
    Updated,
    /// The entity was removed.
    Deleted,
}

/// An entity as seen before or after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity id, as the store renders it.
    pub id: String,
    /// Human-readable name, when the entity has one.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Remaining attributes, used to report which fields an update touched.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl EntitySnapshot {
    /// Snapshot with an id and a display name.
    pub fn named(id: impl ToString, display_name: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            display_name: Some(display_name.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Snapshot with an id only.
    pub fn anonymous(id: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            display_name: None,
            fields: BTreeMap::new(),
        }
    }

    /// Add an attribute.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// A create, update or delete of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEvent {
    /// Entity kind tag, normalized to snake_case.
    pub kind: String,
    /// Action taken.
    pub action: MutationAction,
    /// State before the mutation. Required for deletes.
    pub before: Option<EntitySnapshot>,
    /// State after the mutation. Required for creates.
    pub after: Option<EntitySnapshot>,
    /// Principal that triggered the mutation; `None` for background work.
    pub actor: Option<PrincipalId>,
}

impl MutationEvent {
    /// Event with explicit parts. `kind` is normalized (`ComplianceRequirement`
    /// becomes `compliance_requirement`).
    pub fn new(
        kind: &str,
        action: MutationAction,
        before: Option<EntitySnapshot>,
        after: Option<EntitySnapshot>,
    ) -> Self {
        Self {
            kind: normalize_slug(kind),
            action,
            before,
            after,
            actor: None,
        }
    }

    /// Insert of `after`.
    pub fn created(kind: &str, after: EntitySnapshot) -> Self {
        Self::new(kind, MutationAction::Created, None, Some(after))
    }

    /// Change from `before` to `after`.
    pub fn updated(kind: &str, before: EntitySnapshot, after: EntitySnapshot) -> Self {
        Self::new(kind, MutationAction::Updated, Some(before), Some(after))
    }

    /// Removal of `before`, captured prior to the delete.
    pub fn deleted(kind: &str, before: EntitySnapshot) -> Self {
        Self::new(kind, MutationAction::Deleted, Some(before), None)
    }

    /// Attribute the event to `actor`.
    pub fn by(mut self, actor: PrincipalId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// The snapshot the summary is rendered from: `after` for creates and
    /// updates, `before` for deletes.
    pub fn subject(&self) -> Option<&EntitySnapshot> {
        match self.action {
            MutationAction::Created => self.after.as_ref(),
            MutationAction::Updated => self.after.as_ref().or(self.before.as_ref()),
            MutationAction::Deleted => self.before.as_ref(),
        }
    }

    /// Field names whose values differ between `before` and `after`, sorted.
    ///
    /// Empty unless both snapshots are present.
    pub fn changed_fields(&self) -> Vec<String> {
        let (Some(before), Some(after)) = (&self.before, &self.after) else {
            return Vec::new();
        };
        let mut changed: BTreeSet<String> = before
            .fields
            .keys()
            .chain(after.fields.keys())
            .filter(|k| before.fields.get(*k) != after.fields.get(*k))
            .cloned()
            .collect();
        if before.display_name != after.display_name {
            changed.insert("name".to_string());
        }
        changed.into_iter().collect()
    }
}
