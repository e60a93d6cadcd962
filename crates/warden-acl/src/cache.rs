//! Per-principal cache of resolved access.
//!
//! The cache is an injected object, not process-global state. Entries are
//! stamped with the resolver's invalidation epoch at the moment the fill
//! started; see [`RoleAbilityResolver`](crate::RoleAbilityResolver) for
//! how stamps are checked.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use warden_core::PrincipalId;

use crate::error::{Error, Result};
use crate::resolver::ResolvedAccess;

/// A cached resolution together with the epoch it was computed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAccess {
    /// Resolved roles and abilities.
    pub access: ResolvedAccess,
    /// Resolver epoch read before the store was consulted.
    pub epoch: u64,
}

/// Storage for resolved access, keyed by principal.
///
/// Implementations may be remote; the resolver bounds every call with a
/// timeout and treats errors as a miss.
#[async_trait]
pub trait AbilityCache: Send + Sync {
    /// Cached entry for `principal`, if any.
    async fn get(&self, principal: PrincipalId) -> Result<Option<CachedAccess>>;

    /// Store an entry for `principal`.
    async fn put(&self, principal: PrincipalId, entry: CachedAccess) -> Result<()>;

    /// Drop the entry for `principal`.
    async fn invalidate(&self, principal: PrincipalId) -> Result<()>;

    /// Drop every entry.
    async fn clear(&self) -> Result<()>;
}

/// Process-local [`AbilityCache`].
#[derive(Debug, Default)]
pub struct MemoryAbilityCache {
    entries: RwLock<HashMap<PrincipalId, CachedAccess>>,
}

impl MemoryAbilityCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached principals.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> Error {
    Error::Cache(format!("cache lock poisoned: {e}"))
}

#[async_trait]
impl AbilityCache for MemoryAbilityCache {
    async fn get(&self, principal: PrincipalId) -> Result<Option<CachedAccess>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(&principal).cloned())
    }

    async fn put(&self, principal: PrincipalId, entry: CachedAccess) -> Result<()> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(principal, entry);
        Ok(())
    }

    async fn invalidate(&self, principal: PrincipalId) -> Result<()> {
        self.entries.write().map_err(poisoned)?.remove(&principal);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }
}
