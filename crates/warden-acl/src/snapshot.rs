//! Per-request `{roles, permissions}` projection for the presentation layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use warden_core::{Principal, PrincipalId};

use crate::resolver::{ResolvedAccess, RoleAbilityResolver};

/// What the presentation layer sees about the current principal.
///
/// `permissions` is sparse: an ability that is absent is denied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionSnapshot {
    /// Role names, sorted.
    pub roles: Vec<String>,
    /// Granted ability keys, each mapped to `true`.
    pub permissions: BTreeMap<String, bool>,
}

impl PermissionSnapshot {
    /// Whether the snapshot grants `ability`.
    pub fn can(&self, ability: &str) -> bool {
        self.permissions.get(ability).copied().unwrap_or(false)
    }
}

impl From<ResolvedAccess> for PermissionSnapshot {
    fn from(access: ResolvedAccess) -> Self {
        Self {
            roles: access.roles.into_iter().collect(),
            permissions: access
                .abilities
                .into_iter()
                .map(|ability| (ability, true))
                .collect(),
        }
    }
}

/// Builds a fresh [`PermissionSnapshot`] on every request.
///
/// Nothing is memoized here; coherence comes from the resolver's cache.
#[derive(Debug, Clone)]
pub struct PermissionSnapshotPublisher {
    resolver: Arc<RoleAbilityResolver>,
}

impl PermissionSnapshotPublisher {
    /// Create a publisher over `resolver`.
    pub fn new(resolver: Arc<RoleAbilityResolver>) -> Self {
        Self { resolver }
    }

    /// Snapshot for `principal`. Resolution failures yield an empty snapshot.
    pub async fn build_snapshot(&self, principal: PrincipalId) -> PermissionSnapshot {
        self.resolver.resolve(principal).await.into()
    }

    /// Snapshot for an already-loaded principal record.
    pub async fn snapshot_for(&self, principal: &Principal) -> PermissionSnapshot {
        self.build_snapshot(principal.id).await
    }
}
