//! Access writes with invalidate-then-respond semantics.
//!
//! Every method writes through the [`AccessWriter`], evicts whatever the
//! write may have made stale, and only then returns. A caller that sees
//! `Ok(())` after a revocation can rely on the very next resolution
//! reflecting it. Eviction also runs when the write fails, since a failed
//! remote write may still have been applied.

use std::sync::Arc;

use warden_core::{Ability, AbilityId, Principal, PrincipalId, Role, RoleId};

use crate::error::Result;
use crate::resolver::{AccessChange, RoleAbilityResolver};
use crate::store::AccessWriter;

/// Administrative writes over roles, grants and assignments.
pub struct AccessAdmin {
    writer: Arc<dyn AccessWriter>,
    resolver: Arc<RoleAbilityResolver>,
}

impl AccessAdmin {
    /// Pair a writer with the resolver whose cache it must keep coherent.
    pub fn new(writer: Arc<dyn AccessWriter>, resolver: Arc<RoleAbilityResolver>) -> Self {
        Self { writer, resolver }
    }

    /// Insert or replace a principal.
    pub async fn put_principal(&self, principal: Principal) -> Result<()> {
        let id = principal.id;
        let result = self.writer.put_principal(principal).await;
        self.settle(result, AccessChange::PrincipalRolesChanged(id))
            .await
    }

    /// Assign `role` to `principal`.
    pub async fn assign_role(&self, principal: PrincipalId, role: RoleId) -> Result<()> {
        let result = self.writer.assign_role(principal, role).await;
        self.settle(result, AccessChange::PrincipalRolesChanged(principal))
            .await
    }

    /// Remove `role` from `principal`.
    pub async fn retract_role(&self, principal: PrincipalId, role: RoleId) -> Result<()> {
        let result = self.writer.retract_role(principal, role).await;
        self.settle(result, AccessChange::PrincipalRolesChanged(principal))
            .await
    }

    /// Insert or replace a role definition.
    pub async fn put_role(&self, role: Role) -> Result<()> {
        let id = role.id;
        let result = self.writer.put_role(role).await;
        self.settle(result, AccessChange::RoleDefinitionChanged(id))
            .await
    }

    /// Delete a role and its assignments.
    pub async fn remove_role(&self, role: RoleId) -> Result<()> {
        let result = self.writer.remove_role(role).await;
        self.settle(result, AccessChange::RoleRemoved(role)).await
    }

    /// Grant `ability` to `role`.
    pub async fn grant_ability(&self, role: RoleId, ability: AbilityId) -> Result<()> {
        let result = self.writer.grant_ability(role, ability).await;
        self.settle(result, AccessChange::RoleGrantsChanged(role))
            .await
    }

    /// Revoke `ability` from `role`.
    pub async fn revoke_ability(&self, role: RoleId, ability: AbilityId) -> Result<()> {
        let result = self.writer.revoke_ability(role, ability).await;
        self.settle(result, AccessChange::RoleGrantsChanged(role))
            .await
    }

    /// Insert or replace an ability definition.
    pub async fn put_ability(&self, ability: Ability) -> Result<()> {
        let id = ability.id;
        let result = self.writer.put_ability(ability).await;
        self.settle(result, AccessChange::AbilityChanged(id)).await
    }

    /// Delete an ability and its grants.
    pub async fn remove_ability(&self, ability: AbilityId) -> Result<()> {
        let result = self.writer.remove_ability(ability).await;
        self.settle(result, AccessChange::AbilityChanged(ability))
            .await
    }

    async fn settle(&self, result: warden_core::Result<()>, change: AccessChange) -> Result<()> {
        self.resolver.invalidate(change).await;
        if let Err(e) = &result {
            log::warn!("Access write {change:?} failed: {e}");
        }
        result.map_err(Into::into)
    }
}
