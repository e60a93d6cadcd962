//! Effective role and ability resolution.
//!
//! A principal's abilities are the flat union of the abilities granted to
//! every role currently assigned to it. There is no role hierarchy.
//!
//! # Failure policy
//!
//! - Store unreachable ⇒ [`RoleAbilityResolver::resolve`] yields the empty
//!   set and nothing is cached.
//! - Cache slow or unreachable ⇒ the call is abandoned after the configured
//!   timeout and the store is read directly.
//!
//! # Coherence
//!
//! Every [`AccessChange`] bumps an invalidation epoch and, before evicting,
//! records that epoch against each affected principal (or against all of
//! them for a clear). A fill is stamped with the epoch read before the store
//! was consulted. A cached entry stamped before the last invalidation of its
//! principal is never served, so a fill that raced a revocation cannot be
//! observed by any reader once the revocation has returned, whether or not
//! the eviction reached the cache.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use warden_core::config::AccessConfig;
use warden_core::{Ability, AbilityId, PrincipalId, RoleId};

use crate::cache::{AbilityCache, CachedAccess, MemoryAbilityCache};
use crate::error::{Error, Result};
use crate::store::AccessStore;

/// Roles and abilities resolved for one principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedAccess {
    /// Role names, sorted.
    pub roles: BTreeSet<String>,
    /// Ability permission keys, sorted.
    pub abilities: BTreeSet<String>,
}

/// A write that may change what some principal can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessChange {
    /// A principal gained or lost a role.
    PrincipalRolesChanged(PrincipalId),
    /// A role gained or lost an ability grant.
    RoleGrantsChanged(RoleId),
    /// A role was created, renamed or replaced.
    RoleDefinitionChanged(RoleId),
    /// A role was deleted along with its assignments.
    RoleRemoved(RoleId),
    /// An ability was created, renamed, rescoped or deleted.
    AbilityChanged(AbilityId),
    /// Anything else; drop every cached entry.
    Reset,
}

/// Resolves effective roles and abilities, with an optional coherent cache.
pub struct RoleAbilityResolver {
    store: Arc<dyn AccessStore>,
    cache: Option<Arc<dyn AbilityCache>>,
    cache_timeout: Duration,
    epoch: AtomicU64,
    cleared_at: AtomicU64,
    invalidated_at: RwLock<HashMap<PrincipalId, u64>>,
}

impl RoleAbilityResolver {
    /// Resolver that reads the store on every call.
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self {
            store,
            cache: None,
            cache_timeout: Duration::from_millis(AccessConfig::default().cache_timeout_ms),
            epoch: AtomicU64::new(0),
            cleared_at: AtomicU64::new(0),
            invalidated_at: RwLock::new(HashMap::new()),
        }
    }

    /// Resolver backed by `cache`, with each cache call bounded by `timeout`.
    pub fn with_cache(
        store: Arc<dyn AccessStore>,
        cache: Arc<dyn AbilityCache>,
        timeout: Duration,
    ) -> Self {
        Self {
            cache: Some(cache),
            cache_timeout: timeout,
            ..Self::new(store)
        }
    }

    /// Resolver configured from `[access]`: an in-memory cache when
    /// `cache_enabled`, none otherwise.
    pub fn from_config(store: Arc<dyn AccessStore>, config: &AccessConfig) -> Self {
        if config.cache_enabled {
            Self::with_cache(
                store,
                Arc::new(MemoryAbilityCache::new()),
                Duration::from_millis(config.cache_timeout_ms),
            )
        } else {
            Self::new(store)
        }
    }

    /// Whether results are cached.
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Resolve `principal`, surfacing store failures.
    pub async fn try_resolve(&self, principal: PrincipalId) -> Result<ResolvedAccess> {
        if let Some(cache) = &self.cache {
            match self.cache_call(cache.get(principal)).await {
                Ok(Some(entry)) if entry.epoch >= self.stale_before(principal) => {
                    log::debug!("Ability cache hit for principal {principal}");
                    return Ok(entry.access);
                }
                Ok(Some(_)) => {
                    log::debug!("Ignoring cache entry for principal {principal} older than its last invalidation");
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Ability cache read failed for principal {principal}: {e}; reading store");
                }
            }
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        let access = self.load(principal).await?;
        if let Some(cache) = &self.cache {
            self.fill(cache.as_ref(), principal, access.clone(), epoch)
                .await;
        }
        Ok(access)
    }

    /// Resolve `principal`, failing closed: any error yields no roles and
    /// no abilities.
    pub async fn resolve(&self, principal: PrincipalId) -> ResolvedAccess {
        match self.try_resolve(principal).await {
            Ok(access) => access,
            Err(e) => {
                let cause = std::error::Error::source(&e)
                    .map(|s| format!(" ({s})"))
                    .unwrap_or_default();
                log::warn!("{e}{cause}; denying all abilities");
                ResolvedAccess::default()
            }
        }
    }

    /// Role names assigned to `principal`, sorted. Fails closed.
    pub async fn resolve_roles(&self, principal: PrincipalId) -> BTreeSet<String> {
        self.resolve(principal).await.roles
    }

    /// Ability keys granted to `principal`. Fails closed.
    pub async fn resolve_abilities(&self, principal: PrincipalId) -> BTreeSet<String> {
        self.resolve(principal).await.abilities
    }

    /// Whether `principal` holds `ability`. Fails closed.
    pub async fn can(&self, principal: PrincipalId, ability: &str) -> bool {
        self.resolve(principal).await.abilities.contains(ability)
    }

    /// Evict every entry `change` may have made stale.
    ///
    /// Returns once every affected principal has been marked stale and
    /// eviction has been attempted, so callers can acknowledge their write
    /// afterwards. A failed eviction is logged; the stale mark alone keeps
    /// the old entry from being served.
    pub async fn invalidate(&self, change: AccessChange) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let Some(cache) = &self.cache else {
            return;
        };

        let result = match change {
            AccessChange::PrincipalRolesChanged(principal) => {
                self.mark_stale(&[principal], epoch);
                self.cache_call(cache.invalidate(principal)).await
            }
            AccessChange::RoleGrantsChanged(role) | AccessChange::RoleDefinitionChanged(role) => {
                match self.store.principals_with_role(role).await {
                    Ok(holders) => {
                        self.mark_stale(&holders, epoch);
                        self.evict_all(cache.as_ref(), &holders).await
                    }
                    Err(e) => {
                        log::warn!("Could not list holders of role {role}: {e}; clearing ability cache");
                        self.mark_all_stale(epoch);
                        self.cache_call(cache.clear()).await
                    }
                }
            }
            AccessChange::RoleRemoved(_) | AccessChange::AbilityChanged(_) | AccessChange::Reset => {
                self.mark_all_stale(epoch);
                self.cache_call(cache.clear()).await
            }
        };

        match result {
            Ok(()) => log::debug!("Invalidated ability cache for {change:?}"),
            Err(e) => log::warn!("Ability cache eviction for {change:?} failed: {e}"),
        }
    }

    /// Oldest epoch a cached entry for `principal` may carry and still be served.
    fn stale_before(&self, principal: PrincipalId) -> u64 {
        let cleared = self.cleared_at.load(Ordering::SeqCst);
        match self.invalidated_at.read() {
            Ok(marks) => marks.get(&principal).map_or(cleared, |&at| at.max(cleared)),
            Err(e) => {
                log::warn!("Invalidation marks poisoned: {e}; bypassing cache");
                u64::MAX
            }
        }
    }

    fn mark_stale(&self, principals: &[PrincipalId], epoch: u64) {
        match self.invalidated_at.write() {
            Ok(mut marks) => {
                for &principal in principals {
                    let at = marks.entry(principal).or_insert(0);
                    *at = (*at).max(epoch);
                }
            }
            Err(e) => {
                log::warn!("Invalidation marks poisoned: {e}; marking every principal stale");
                self.cleared_at.fetch_max(epoch, Ordering::SeqCst);
            }
        }
    }

    fn mark_all_stale(&self, epoch: u64) {
        self.cleared_at.fetch_max(epoch, Ordering::SeqCst);
        if let Ok(mut marks) = self.invalidated_at.write() {
            marks.retain(|_, at| *at > epoch);
        }
    }

    async fn evict_all(&self, cache: &dyn AbilityCache, holders: &[PrincipalId]) -> Result<()> {
        let mut first_err = None;
        for &principal in holders {
            if let Err(e) = self.cache_call(cache.invalidate(principal)).await {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn load(&self, principal: PrincipalId) -> Result<ResolvedAccess> {
        let failure = |source| Error::ResolutionFailure { principal, source };

        let roles = self.store.roles_for(principal).await.map_err(failure)?;
        let ability_ids: Vec<AbilityId> = roles
            .iter()
            .flat_map(|r| r.ability_ids.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let abilities = if ability_ids.is_empty() {
            Vec::new()
        } else {
            self.store.abilities(&ability_ids).await.map_err(failure)?
        };

        Ok(ResolvedAccess {
            roles: roles.into_iter().map(|r| r.name).collect(),
            abilities: abilities.iter().map(Ability::permission_key).collect(),
        })
    }

    async fn fill(
        &self,
        cache: &dyn AbilityCache,
        principal: PrincipalId,
        access: ResolvedAccess,
        epoch: u64,
    ) {
        let entry = CachedAccess { access, epoch };
        if let Err(e) = self.cache_call(cache.put(principal, entry)).await {
            log::warn!("Ability cache write failed for principal {principal}: {e}");
        }

        // A racing fill is never served; evicting it just frees the slot.
        if epoch < self.stale_before(principal) {
            log::debug!("Discarding racing cache fill for principal {principal}");
            if let Err(e) = self.cache_call(cache.invalidate(principal)).await {
                log::warn!("Could not evict racing fill for principal {principal}: {e}");
            }
        }
    }

    async fn cache_call<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.cache_timeout, fut)
            .await
            .unwrap_or_else(|_| {
                Err(Error::CacheTimeout {
                    millis: u64::try_from(self.cache_timeout.as_millis()).unwrap_or(u64::MAX),
                })
            })
    }
}

impl std::fmt::Debug for RoleAbilityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleAbilityResolver")
            .field("cached", &self.cache.is_some())
            .field("cache_timeout", &self.cache_timeout)
            .field("epoch", &self.epoch.load(Ordering::SeqCst))
            .finish()
    }
}
