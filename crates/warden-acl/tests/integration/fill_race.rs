//! A revocation that lands while a reader is between its store read and its
//! cache write must not leave the reader's stale result in the cache, nor
//! let any other reader see it in the meantime.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use warden_acl::{AbilityCache, AccessAdmin, RoleAbilityResolver};

use crate::common::{ADMIN, ALICE, AccessHarness, GatedCache, GatedStore, MANAGE_USERS};

#[tokio::test]
async fn test_revocation_during_fill_leaves_no_stale_entry() {
    let seeded = AccessHarness::new();
    seeded.seed().await;
    seeded.admin.grant_ability(ADMIN, MANAGE_USERS).await.unwrap();
    seeded.admin.assign_role(ALICE, ADMIN).await.unwrap();

    let gated = Arc::new(GatedStore::new(seeded.store.clone()));
    let h = AccessHarness::over(seeded.store.clone(), gated.clone());
    gated.armed.store(true, Ordering::SeqCst);

    let resolver = h.resolver.clone();
    let reader = tokio::spawn(async move { resolver.resolve_abilities(ALICE).await });

    // The reader has seen the grant but has not filled the cache yet.
    gated.reached.notified().await;
    h.admin.revoke_ability(ADMIN, MANAGE_USERS).await.unwrap();
    gated.release.notify_one();

    let stale = reader.await.unwrap();
    assert!(stale.contains("manage-users"));

    assert!(h.cache.get(ALICE).await.unwrap().is_none());
    assert!(!h.resolver.can(ALICE, "manage-users").await);
}

#[tokio::test]
async fn test_second_reader_never_sees_racing_fill() {
    let seeded = AccessHarness::new();
    seeded.seed().await;
    seeded.admin.grant_ability(ADMIN, MANAGE_USERS).await.unwrap();
    seeded.admin.assign_role(ALICE, ADMIN).await.unwrap();

    let gated_store = Arc::new(GatedStore::new(seeded.store.clone()));
    let gated_cache = Arc::new(GatedCache::default());
    let resolver = Arc::new(RoleAbilityResolver::with_cache(
        gated_store.clone(),
        gated_cache.clone(),
        Duration::from_secs(30),
    ));
    let admin = AccessAdmin::new(seeded.store.clone(), resolver.clone());

    gated_store.armed.store(true, Ordering::SeqCst);
    let first = resolver.clone();
    let reader_a = tokio::spawn(async move { first.can(ALICE, "manage-users").await });

    // Reader A has read the grant; the revocation is then acknowledged.
    gated_store.reached.notified().await;
    admin.revoke_ability(ADMIN, MANAGE_USERS).await.unwrap();

    // Reader A writes its stale result and parks before it can clean up.
    gated_cache.armed.store(true, Ordering::SeqCst);
    gated_store.release.notify_one();
    gated_cache.reached.notified().await;
    let stale = gated_cache.inner.get(ALICE).await.unwrap().unwrap();
    assert!(stale.access.abilities.contains("manage-users"));

    assert!(!resolver.can(ALICE, "manage-users").await);

    gated_cache.release.notify_one();
    assert!(reader_a.await.unwrap());
    assert!(!resolver.can(ALICE, "manage-users").await);
}

#[tokio::test]
async fn test_fill_without_race_is_kept() {
    let seeded = AccessHarness::new();
    seeded.seed().await;
    seeded.admin.grant_ability(ADMIN, MANAGE_USERS).await.unwrap();
    seeded.admin.assign_role(ALICE, ADMIN).await.unwrap();

    let gated = Arc::new(GatedStore::new(seeded.store.clone()));
    let h = AccessHarness::over(seeded.store.clone(), gated);

    assert!(h.resolver.can(ALICE, "manage-users").await);
    let cached = h.cache.get(ALICE).await.unwrap().unwrap();
    assert!(cached.access.abilities.contains("manage-users"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_agree_after_revocation() {
    let h = AccessHarness::new();
    h.seed().await;
    h.admin.grant_ability(ADMIN, MANAGE_USERS).await.unwrap();
    h.admin.assign_role(ALICE, ADMIN).await.unwrap();

    let readers: Vec<_> = (0..16)
        .map(|_| {
            let resolver = h.resolver.clone();
            tokio::spawn(async move { resolver.can(ALICE, "manage-users").await })
        })
        .collect();
    h.admin.revoke_ability(ADMIN, MANAGE_USERS).await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    assert!(!h.resolver.can(ALICE, "manage-users").await);
}
