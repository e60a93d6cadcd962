//! Grant, assign, revoke: every acknowledged write shows on the next read.

use warden_acl::{AbilityCache, AccessChange};

use crate::common::{ADMIN, ALICE, AUDITOR, AccessHarness, BOB, EDIT_AUDIT, MANAGE_USERS, grant};

#[tokio::test]
async fn test_grant_assign_revoke() {
    let h = AccessHarness::new();
    h.seed().await;

    h.admin.grant_ability(ADMIN, MANAGE_USERS).await.unwrap();
    h.admin.assign_role(ALICE, ADMIN).await.unwrap();
    assert!(h.resolver.resolve_abilities(ALICE).await.contains("manage-users"));

    h.admin.revoke_ability(ADMIN, MANAGE_USERS).await.unwrap();
    assert!(!h.resolver.resolve_abilities(ALICE).await.contains("manage-users"));
}

#[tokio::test]
async fn test_abilities_are_union_over_roles() {
    let h = AccessHarness::new();
    h.seed().await;
    h.admin.grant_ability(ADMIN, MANAGE_USERS).await.unwrap();
    h.admin.grant_ability(AUDITOR, EDIT_AUDIT).await.unwrap();
    h.admin.assign_role(ALICE, ADMIN).await.unwrap();
    h.admin.assign_role(ALICE, AUDITOR).await.unwrap();

    let roles: Vec<String> = h.resolver.resolve_roles(ALICE).await.into_iter().collect();
    assert_eq!(roles, vec!["admin", "auditor"]);
    let abilities: Vec<String> = h.resolver.resolve_abilities(ALICE).await.into_iter().collect();
    assert_eq!(abilities, vec!["edit:audit", "manage-users"]);
}

#[tokio::test]
async fn test_revocation_only_evicts_role_holders() {
    let h = AccessHarness::new();
    h.seed().await;
    h.admin.grant_ability(ADMIN, MANAGE_USERS).await.unwrap();
    h.admin.grant_ability(AUDITOR, EDIT_AUDIT).await.unwrap();
    h.admin.assign_role(ALICE, ADMIN).await.unwrap();
    h.admin.assign_role(BOB, AUDITOR).await.unwrap();

    h.resolver.resolve(ALICE).await;
    h.resolver.resolve(BOB).await;
    assert_eq!(h.cache.len(), 2);

    h.admin.revoke_ability(ADMIN, MANAGE_USERS).await.unwrap();
    assert!(h.cache.get(ALICE).await.unwrap().is_none());
    assert!(h.cache.get(BOB).await.unwrap().is_some());
}

#[tokio::test]
async fn test_write_behind_resolver_needs_explicit_invalidation() {
    let h = AccessHarness::new();
    h.seed().await;
    h.admin.assign_role(ALICE, ADMIN).await.unwrap();
    assert!(!h.resolver.can(ALICE, "manage-users").await);

    // Written straight to the store: cached answer survives.
    grant(h.store.as_ref(), ADMIN, MANAGE_USERS).await;
    assert!(!h.resolver.can(ALICE, "manage-users").await);

    h.resolver.invalidate(AccessChange::RoleGrantsChanged(ADMIN)).await;
    assert!(h.resolver.can(ALICE, "manage-users").await);
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let h = AccessHarness::new();
    h.seed().await;
    h.resolver.resolve(ALICE).await;
    h.resolver.resolve(BOB).await;
    assert!(!h.cache.is_empty());

    h.resolver.invalidate(AccessChange::Reset).await;
    assert!(h.cache.is_empty());
}
