//! Append-only audit storage.
//!
//! [`AuditStore`] has no update or delete operation, and [`AuditLogEntry`]
//! has no setters: once written, an entry is read-only.

use std::fmt;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::{AuditEntryId, PrincipalId};

use crate::error::{Error, Result};
use crate::event::MutationAction;

/// Label shown for entries with no acting principal.
pub const SYSTEM_ACTOR: &str = "System";

/// Kind of audited action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// Entity created.
    Create,
    /// Entity updated.
    Update,
    /// Entity deleted.
    Delete,
    /// Principal signed in.
    Login,
    /// Principal signed out.
    Logout,
    /// Any other application event.
    Other(String),
}

impl AuditAction {
    /// Lowercase tag.
    pub fn as_str(&self) -> &str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::Other(tag) => tag,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MutationAction> for AuditAction {
    fn from(action: MutationAction) -> Self {
        match action {
            MutationAction::Created => AuditAction::Create,
            MutationAction::Updated => AuditAction::Update,
            MutationAction::Deleted => AuditAction::Delete,
        }
    }
}

/// An entry waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    /// When the audited event happened.
    pub timestamp: DateTime<Utc>,
    /// Acting principal; `None` for system activity.
    pub actor: Option<PrincipalId>,
    /// What was done.
    pub action: AuditAction,
    /// Entity kind or event target.
    pub target_type: String,
    /// Rendered summary.
    pub details: String,
}

/// A stored, immutable audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    id: AuditEntryId,
    timestamp: DateTime<Utc>,
    actor: Option<PrincipalId>,
    action: AuditAction,
    target_type: String,
    details: String,
}

impl AuditLogEntry {
    /// Seal `entry` under the store-assigned `id`.
    pub fn new(id: AuditEntryId, entry: NewAuditEntry) -> Self {
        Self {
            id,
            timestamp: entry.timestamp,
            actor: entry.actor,
            action: entry.action,
            target_type: entry.target_type,
            details: entry.details,
        }
    }

    /// Store-assigned sequence number.
    pub fn id(&self) -> AuditEntryId {
        self.id
    }

    /// When the audited event happened.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Acting principal, if any.
    pub fn actor(&self) -> Option<PrincipalId> {
        self.actor
    }

    /// Actor as displayed: the principal id, or [`SYSTEM_ACTOR`].
    pub fn actor_label(&self) -> String {
        self.actor
            .map_or_else(|| SYSTEM_ACTOR.to_string(), |id| id.to_string())
    }

    /// What was done.
    pub fn action(&self) -> &AuditAction {
        &self.action
    }

    /// Entity kind or event target.
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// Rendered summary.
    pub fn details(&self) -> &str {
        &self.details
    }
}

/// Filters for [`AuditStore::list`]. Entries come back in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditQuery {
    /// Only entries by this actor.
    pub actor: Option<PrincipalId>,
    /// Only system entries (no actor).
    pub system_only: bool,
    /// Only entries with this action.
    pub action: Option<AuditAction>,
    /// Only entries for this target type.
    pub target_type: Option<String>,
    /// Entries to skip after filtering.
    pub offset: usize,
    /// Maximum entries to return.
    pub limit: Option<usize>,
}

impl AuditQuery {
    /// Query matching everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to `actor`.
    pub fn by_actor(mut self, actor: PrincipalId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Restrict to entries with no actor.
    pub fn by_system(mut self) -> Self {
        self.system_only = true;
        self
    }

    /// Restrict to `action`.
    pub fn with_action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Restrict to `target_type`.
    pub fn for_target(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self
    }

    /// Page through results.
    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Whether `entry` passes the filters.
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.actor.is_none_or(|a| entry.actor == Some(a))
            && (!self.system_only || entry.actor.is_none())
            && self.action.as_ref().is_none_or(|a| &entry.action == a)
            && self
                .target_type
                .as_deref()
                .is_none_or(|t| entry.target_type == t)
    }
}

/// Append-only audit persistence.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append `entry`, assigning the next sequence number.
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLogEntry>;

    /// Entries matching `query`, oldest first.
    async fn list(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>>;
}

#[derive(Debug, Default)]
struct Log {
    entries: Vec<AuditLogEntry>,
    last_id: u64,
}

/// In-memory [`AuditStore`].
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    log: RwLock<Log>,
}

impl MemoryAuditStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.log.read().map(|l| l.entries.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E: fmt::Display>(e: E) -> Error {
    Error::Store(format!("audit log lock poisoned: {e}"))
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLogEntry> {
        let mut log = self.log.write().map_err(poisoned)?;
        log.last_id += 1;
        let stored = AuditLogEntry::new(AuditEntryId::new(log.last_id), entry);
        log.entries.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>> {
        let log = self.log.read().map_err(poisoned)?;
        Ok(log
            .entries
            .iter()
            .filter(|e| query.matches(e))
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}
