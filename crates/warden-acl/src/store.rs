//! Read and write seams onto the persistence collaborator.
//!
//! Warden never owns principal, role or ability records. [`AccessStore`]
//! is what the resolver reads; [`AccessWriter`] is what [`AccessAdmin`]
//! writes through. [`MemoryAccessStore`] implements both for tests and
//! embedded use.
//!
//! [`AccessAdmin`]: crate::AccessAdmin

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use warden_core::{Ability, AbilityId, Error, Principal, PrincipalId, Result, Role, RoleId};

/// Read access to role assignments and grants.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Roles currently assigned to `principal`. Unknown principals have none.
    async fn roles_for(&self, principal: PrincipalId) -> Result<Vec<Role>>;

    /// Ability records for `ids`. Ids with no record are skipped.
    async fn abilities(&self, ids: &[AbilityId]) -> Result<Vec<Ability>>;

    /// Principals holding `role`.
    async fn principals_with_role(&self, role: RoleId) -> Result<Vec<PrincipalId>>;
}

/// Writes that change what a principal can do.
#[async_trait]
pub trait AccessWriter: Send + Sync {
    /// Insert or replace a principal, including its role assignments.
    async fn put_principal(&self, principal: Principal) -> Result<()>;

    /// Assign `role` to `principal`.
    async fn assign_role(&self, principal: PrincipalId, role: RoleId) -> Result<()>;

    /// Remove `role` from `principal`. Removing an absent assignment is a no-op.
    async fn retract_role(&self, principal: PrincipalId, role: RoleId) -> Result<()>;

    /// Insert or replace a role definition, including its grants.
    async fn put_role(&self, role: Role) -> Result<()>;

    /// Delete a role and every assignment of it.
    async fn remove_role(&self, role: RoleId) -> Result<()>;

    /// Grant `ability` to `role`.
    async fn grant_ability(&self, role: RoleId, ability: AbilityId) -> Result<()>;

    /// Revoke `ability` from `role`. Revoking an absent grant is a no-op.
    async fn revoke_ability(&self, role: RoleId, ability: AbilityId) -> Result<()>;

    /// Insert or replace an ability definition.
    async fn put_ability(&self, ability: Ability) -> Result<()>;

    /// Delete an ability and every grant of it.
    async fn remove_ability(&self, ability: AbilityId) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    principals: HashMap<PrincipalId, Principal>,
    roles: HashMap<RoleId, Role>,
    abilities: HashMap<AbilityId, Ability>,
}

/// In-memory [`AccessStore`] + [`AccessWriter`].
#[derive(Debug, Default)]
pub struct MemoryAccessStore {
    state: RwLock<MemoryState>,
}

impl MemoryAccessStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|e| Error::store(format!("access store lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|e| Error::store(format!("access store lock poisoned: {e}")))
    }
}

#[async_trait]
impl AccessStore for MemoryAccessStore {
    async fn roles_for(&self, principal: PrincipalId) -> Result<Vec<Role>> {
        let state = self.read()?;
        let Some(p) = state.principals.get(&principal) else {
            return Ok(Vec::new());
        };
        Ok(p.role_ids
            .iter()
            .filter_map(|id| state.roles.get(id).cloned())
            .collect())
    }

    async fn abilities(&self, ids: &[AbilityId]) -> Result<Vec<Ability>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.abilities.get(id).cloned())
            .collect())
    }

    async fn principals_with_role(&self, role: RoleId) -> Result<Vec<PrincipalId>> {
        let state = self.read()?;
        let mut holders: Vec<PrincipalId> = state
            .principals
            .values()
            .filter(|p| p.role_ids.contains(&role))
            .map(|p| p.id)
            .collect();
        holders.sort();
        Ok(holders)
    }
}

#[async_trait]
impl AccessWriter for MemoryAccessStore {
    async fn put_principal(&self, principal: Principal) -> Result<()> {
        self.write()?.principals.insert(principal.id, principal);
        Ok(())
    }

    async fn assign_role(&self, principal: PrincipalId, role: RoleId) -> Result<()> {
        let mut state = self.write()?;
        if !state.roles.contains_key(&role) {
            return Err(Error::not_found("role", role));
        }
        let p = state
            .principals
            .get_mut(&principal)
            .ok_or_else(|| Error::not_found("principal", principal))?;
        p.role_ids.insert(role);
        Ok(())
    }

    async fn retract_role(&self, principal: PrincipalId, role: RoleId) -> Result<()> {
        if let Some(p) = self.write()?.principals.get_mut(&principal) {
            p.role_ids.remove(&role);
        }
        Ok(())
    }

    async fn put_role(&self, role: Role) -> Result<()> {
        self.write()?.roles.insert(role.id, role);
        Ok(())
    }

    async fn remove_role(&self, role: RoleId) -> Result<()> {
        let mut state = self.write()?;
        state.roles.remove(&role);
        for p in state.principals.values_mut() {
            p.role_ids.remove(&role);
        }
        Ok(())
    }

    async fn grant_ability(&self, role: RoleId, ability: AbilityId) -> Result<()> {
        let mut state = self.write()?;
        if !state.abilities.contains_key(&ability) {
            return Err(Error::not_found("ability", ability));
        }
        let r = state
            .roles
            .get_mut(&role)
            .ok_or_else(|| Error::not_found("role", role))?;
        r.ability_ids.insert(ability);
        Ok(())
    }

    async fn revoke_ability(&self, role: RoleId, ability: AbilityId) -> Result<()> {
        if let Some(r) = self.write()?.roles.get_mut(&role) {
            r.ability_ids.remove(&ability);
        }
        Ok(())
    }

    async fn put_ability(&self, ability: Ability) -> Result<()> {
        self.write()?.abilities.insert(ability.id, ability);
        Ok(())
    }

    async fn remove_ability(&self, ability: AbilityId) -> Result<()> {
        let mut state = self.write()?;
        state.abilities.remove(&ability);
        for r in state.roles.values_mut() {
            r.ability_ids.remove(&ability);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn seeded() -> MemoryAccessStore {
        let store = MemoryAccessStore::new();
        store
            .put_ability(Ability::new(AbilityId::new(1), "manage-users"))
            .await
            .unwrap();
        store
            .put_role(Role::new(RoleId::new(10), "admin", "Administrator").with_ability(AbilityId::new(1)))
            .await
            .unwrap();
        store
            .put_principal(Principal::new(PrincipalId::new(100), "Alice", "alice@example.com"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_unknown_principal_has_no_roles() {
        let store = MemoryAccessStore::new();
        assert!(store.roles_for(PrincipalId::new(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_and_retract_role() {
        let store = seeded().await;
        store.assign_role(PrincipalId::new(100), RoleId::new(10)).await.unwrap();
        let roles = store.roles_for(PrincipalId::new(100)).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "admin");

        store.retract_role(PrincipalId::new(100), RoleId::new(10)).await.unwrap();
        assert!(store.roles_for(PrincipalId::new(100)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_unknown_role_is_not_found() {
        let store = seeded().await;
        let err = store
            .assign_role(PrincipalId::new(100), RoleId::new(99))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "role", .. }));
    }

    #[tokio::test]
    async fn test_grant_unknown_ability_is_not_found() {
        let store = seeded().await;
        let err = store
            .grant_ability(RoleId::new(10), AbilityId::new(42))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "ability", .. }));
    }

    #[tokio::test]
    async fn test_remove_role_drops_assignments() {
        let store = seeded().await;
        store.assign_role(PrincipalId::new(100), RoleId::new(10)).await.unwrap();
        store.remove_role(RoleId::new(10)).await.unwrap();
        assert!(store.roles_for(PrincipalId::new(100)).await.unwrap().is_empty());
        assert!(store
            .principals_with_role(RoleId::new(10))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_remove_ability_drops_grants() {
        let store = seeded().await;
        store.remove_ability(AbilityId::new(1)).await.unwrap();
        store.assign_role(PrincipalId::new(100), RoleId::new(10)).await.unwrap();
        let roles = store.roles_for(PrincipalId::new(100)).await.unwrap();
        assert!(roles[0].ability_ids.is_empty());
    }

    #[tokio::test]
    async fn test_abilities_skips_missing_ids() {
        let store = seeded().await;
        let found = store
            .abilities(&[AbilityId::new(1), AbilityId::new(2)])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_principals_with_role_sorted() {
        let store = seeded().await;
        store
            .put_principal(Principal::new(PrincipalId::new(5), "Bob", "bob@example.com"))
            .await
            .unwrap();
        store.assign_role(PrincipalId::new(100), RoleId::new(10)).await.unwrap();
        store.assign_role(PrincipalId::new(5), RoleId::new(10)).await.unwrap();
        let holders = store.principals_with_role(RoleId::new(10)).await.unwrap();
        assert_eq!(holders, vec![PrincipalId::new(5), PrincipalId::new(100)]);
    }
}
