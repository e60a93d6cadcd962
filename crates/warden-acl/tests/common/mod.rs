//! Common test utilities for warden-acl integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use warden_acl::{
    AbilityCache, AccessAdmin, AccessStore, AccessWriter, CachedAccess, MemoryAbilityCache,
    MemoryAccessStore, PermissionSnapshotPublisher, RoleAbilityResolver,
};
use warden_core::{Ability, AbilityId, Principal, PrincipalId, Role, RoleId};

pub const ALICE: PrincipalId = PrincipalId::new(100);
pub const BOB: PrincipalId = PrincipalId::new(200);
pub const ADMIN: RoleId = RoleId::new(1);
pub const AUDITOR: RoleId = RoleId::new(2);
pub const MANAGE_USERS: AbilityId = AbilityId::new(1);
pub const EDIT_AUDIT: AbilityId = AbilityId::new(2);

/// Wires a memory store, a memory cache, the resolver, the admin layer and
/// the snapshot publisher together.
pub struct AccessHarness {
    pub store: Arc<MemoryAccessStore>,
    pub cache: Arc<MemoryAbilityCache>,
    pub resolver: Arc<RoleAbilityResolver>,
    pub admin: AccessAdmin,
    pub publisher: PermissionSnapshotPublisher,
}

impl AccessHarness {
    /// Harness over an empty store.
    pub fn new() -> Self {
        let store = Arc::new(MemoryAccessStore::new());
        Self::over(store.clone(), store)
    }

    /// Harness whose resolver reads through `reader` while writes go to `store`.
    pub fn over(store: Arc<MemoryAccessStore>, reader: Arc<dyn AccessStore>) -> Self {
        let cache = Arc::new(MemoryAbilityCache::new());
        let resolver = Arc::new(RoleAbilityResolver::with_cache(
            reader,
            cache.clone(),
            Duration::from_millis(200),
        ));
        let admin = AccessAdmin::new(store.clone(), resolver.clone());
        let publisher = PermissionSnapshotPublisher::new(resolver.clone());
        Self {
            store,
            cache,
            resolver,
            admin,
            publisher,
        }
    }

    /// Abilities, roles and principals with no grants or assignments yet.
    pub async fn seed(&self) {
        self.admin
            .put_ability(Ability::new(MANAGE_USERS, "manage-users"))
            .await
            .unwrap();
        self.admin
            .put_ability(Ability::new(EDIT_AUDIT, "edit").scoped_to("audit"))
            .await
            .unwrap();
        self.admin
            .put_role(Role::new(ADMIN, "admin", "Administrator"))
            .await
            .unwrap();
        self.admin
            .put_role(Role::new(AUDITOR, "auditor", "Auditor"))
            .await
            .unwrap();
        for (id, name) in [(ALICE, "Alice"), (BOB, "Bob")] {
            let email = format!("{}@example.com", name.to_lowercase());
            self.admin
                .put_principal(Principal::new(id, name, email))
                .await
                .unwrap();
        }
    }
}

impl Default for AccessHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Store that, while armed, reads role assignments and then parks until
/// released, returning what it read before parking.
pub struct GatedStore {
    pub inner: Arc<MemoryAccessStore>,
    pub armed: AtomicBool,
    pub reached: Notify,
    pub release: Notify,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryAccessStore>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            reached: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl AccessStore for GatedStore {
    async fn roles_for(&self, principal: PrincipalId) -> warden_core::Result<Vec<Role>> {
        let roles = self.inner.roles_for(principal).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
        Ok(roles)
    }

    async fn abilities(&self, ids: &[AbilityId]) -> warden_core::Result<Vec<Ability>> {
        self.inner.abilities(ids).await
    }

    async fn principals_with_role(&self, role: RoleId) -> warden_core::Result<Vec<PrincipalId>> {
        self.inner.principals_with_role(role).await
    }
}

/// Cache that, while armed, stores an entry and then parks until released.
#[derive(Default)]
pub struct GatedCache {
    pub inner: MemoryAbilityCache,
    pub armed: AtomicBool,
    pub reached: Notify,
    pub release: Notify,
}

#[async_trait]
impl AbilityCache for GatedCache {
    async fn get(&self, principal: PrincipalId) -> warden_acl::Result<Option<CachedAccess>> {
        self.inner.get(principal).await
    }

    async fn put(&self, principal: PrincipalId, entry: CachedAccess) -> warden_acl::Result<()> {
        self.inner.put(principal, entry).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
        Ok(())
    }

    async fn invalidate(&self, principal: PrincipalId) -> warden_acl::Result<()> {
        self.inner.invalidate(principal).await
    }

    async fn clear(&self) -> warden_acl::Result<()> {
        self.inner.clear().await
    }
}

/// Shorthand used where the writer trait must be in scope.
pub async fn grant(store: &dyn AccessWriter, role: RoleId, ability: AbilityId) {
    store.grant_ability(role, ability).await.unwrap();
}
