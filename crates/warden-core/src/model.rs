//! Principals, roles and abilities.
//!
//! These records are owned by the persistence collaborator; Warden only
//! reads them. Grants are flat: a role carries a set of abilities and
//! there is no role hierarchy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::{AbilityId, PrincipalId, RoleId};

/// An authenticated actor whose permissions are evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable principal identifier.
    pub id: PrincipalId,
    /// Name shown in the UI and in audit details.
    pub display_name: String,
    /// Contact address.
    pub email: String,
    /// Roles assigned to this principal.
    #[serde(default)]
    pub role_ids: BTreeSet<RoleId>,
}

impl Principal {
    /// Creates a principal with no roles.
    pub fn new(id: PrincipalId, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: email.into(),
            role_ids: BTreeSet::new(),
        }
    }

    /// Adds a role assignment (builder style).
    pub fn with_role(mut self, role: RoleId) -> Self {
        self.role_ids.insert(role);
        self
    }
}

/// A named bundle of abilities assignable to principals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Slug used in permission projections, e.g. `admin`.
    pub name: String,
    /// Human-readable title, e.g. `Administrator`.
    pub title: String,
    /// Abilities granted by this role.
    #[serde(default)]
    pub ability_ids: BTreeSet<AbilityId>,
}

impl Role {
    /// Creates a role with no grants.
    pub fn new(id: RoleId, name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            title: title.into(),
            ability_ids: BTreeSet::new(),
        }
    }

    /// Adds an ability grant (builder style).
    pub fn with_ability(mut self, ability: AbilityId) -> Self {
        self.ability_ids.insert(ability);
        self
    }
}

/// A single grantable action, optionally scoped to one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    /// Stable ability identifier.
    pub id: AbilityId,
    /// Action token, e.g. `manage-users`.
    pub name: String,
    /// Entity kind the action is restricted to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_kind: Option<String>,
}

impl Ability {
    /// Creates an unscoped ability.
    pub fn new(id: AbilityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            entity_kind: None,
        }
    }

    /// Restricts the ability to one entity kind (builder style).
    pub fn scoped_to(mut self, entity_kind: impl Into<String>) -> Self {
        self.entity_kind = Some(entity_kind.into());
        self
    }

    /// Key under which this ability appears in permission projections.
    ///
    /// Unscoped abilities use their bare name; scoped ones append the
    /// entity kind: `edit:audit`.
    pub fn permission_key(&self) -> String {
        match &self.entity_kind {
            Some(kind) => format!("{}:{kind}", self.name),
            None => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_builder() {
        let p = Principal::new(PrincipalId::new(1), "Alice", "alice@example.com")
            .with_role(RoleId::new(2))
            .with_role(RoleId::new(2));
        assert_eq!(p.role_ids.len(), 1);
    }

    #[test]
    fn test_role_builder() {
        let role = Role::new(RoleId::new(1), "admin", "Administrator")
            .with_ability(AbilityId::new(10))
            .with_ability(AbilityId::new(11));
        assert_eq!(role.ability_ids.len(), 2);
        assert_eq!(role.name, "admin");
    }

    #[test]
    fn test_permission_key_unscoped() {
        let ability = Ability::new(AbilityId::new(1), "manage-users");
        assert_eq!(ability.permission_key(), "manage-users");
    }

    #[test]
    fn test_permission_key_scoped() {
        let ability = Ability::new(AbilityId::new(1), "edit").scoped_to("audit");
        assert_eq!(ability.permission_key(), "edit:audit");
    }
}
