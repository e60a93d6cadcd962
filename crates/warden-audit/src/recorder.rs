//! Turns mutation events into audit entries.
//!
//! [`AuditTrailRecorder`] never fails its caller. A failed append is logged
//! and handed to a background task that retries with exponential backoff;
//! if every attempt fails the entry is logged at error level and dropped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use tokio::task::JoinHandle;
use warden_core::config::AuditConfig;
use warden_core::{Clock, PrincipalId};

use crate::bus::MutationSubscriber;
use crate::error::Error;
use crate::event::{MutationAction, MutationEvent};
use crate::store::{AuditAction, AuditStore, NewAuditEntry};
use crate::template::TemplateRegistry;

/// Backoff applied to failed appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Background attempts after the first failure. Zero disables retry.
    pub max_attempts: usize,
    /// Delay between the first two background attempts; doubles each time.
    pub min_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&AuditConfig::default())
    }
}

impl From<&AuditConfig> for RetryPolicy {
    fn from(config: &AuditConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            min_delay: Duration::from_millis(config.retry_min_delay_ms),
        }
    }
}

/// Records audited mutations and session events.
///
/// Entry ids follow storage order, not mutation order: an entry written by a
/// background retry lands after entries for mutations recorded meanwhile.
/// Its timestamp is still the time of the original mutation.
pub struct AuditTrailRecorder {
    store: Arc<dyn AuditStore>,
    templates: TemplateRegistry,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl AuditTrailRecorder {
    /// Recorder writing to `store`, auditing the kinds in `templates`.
    pub fn new(store: Arc<dyn AuditStore>, templates: TemplateRegistry, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            templates,
            clock,
            retry: RetryPolicy::default(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Recorder with the retry policy from `[audit]`.
    pub fn from_config(
        store: Arc<dyn AuditStore>,
        templates: TemplateRegistry,
        clock: Arc<dyn Clock>,
        config: &AuditConfig,
    ) -> Self {
        Self::new(store, templates, clock).with_retry(RetryPolicy::from(config))
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The kinds this recorder audits.
    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Record `event` if its kind is audited. Never fails.
    pub async fn on_mutation(&self, event: &MutationEvent) {
        let Some(templates) = self.templates.get(&event.kind) else {
            log::trace!("Kind {} is not audited", event.kind);
            return;
        };

        let mut details = templates.render(event.action, &subject_name(event));
        if event.action == MutationAction::Updated {
            let changed = event.changed_fields();
            if !changed.is_empty() {
                details.push_str(&format!(" (changed: {})", changed.join(", ")));
            }
        }

        self.append(NewAuditEntry {
            timestamp: self.clock.now(),
            actor: event.actor,
            action: event.action.into(),
            target_type: event.kind.clone(),
            details,
        })
        .await;
    }

    /// Record a non-mutation event such as a login. Never fails.
    pub async fn record_event(
        &self,
        actor: Option<PrincipalId>,
        action: AuditAction,
        target_type: &str,
        details: impl Into<String>,
    ) {
        self.append(NewAuditEntry {
            timestamp: self.clock.now(),
            actor,
            action,
            target_type: target_type.to_string(),
            details: details.into(),
        })
        .await;
    }

    /// Wait for every background retry started so far.
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(e) => {
                log::error!("Audit retry list poisoned: {e}");
                return;
            }
        };
        for handle in handles {
            if let Err(e) = handle.await {
                log::error!("Audit retry task failed: {e}");
            }
        }
    }

    /// Number of background retries not yet awaited by [`Self::flush`].
    pub fn pending_retries(&self) -> usize {
        self.pending
            .lock()
            .map(|p| p.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    async fn append(&self, entry: NewAuditEntry) {
        match self.store.append(entry.clone()).await {
            Ok(stored) => log::debug!(
                "Audit #{} {} {}: {}",
                stored.id(),
                stored.action(),
                stored.target_type(),
                stored.details()
            ),
            Err(e) => {
                log::warn!(
                    "Audit write for {} ({}) failed, retrying in background: {e}",
                    entry.target_type,
                    entry.action
                );
                self.spawn_retry(entry);
            }
        }
    }

    fn spawn_retry(&self, entry: NewAuditEntry) {
        if self.retry.max_attempts == 0 {
            log::error!(
                "Audit retries disabled; lost entry for {}: {}",
                entry.target_type,
                entry.details
            );
            return;
        }
        let store = self.store.clone();
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.retry.min_delay)
            .with_max_times(self.retry.max_attempts - 1);

        let handle = tokio::spawn(async move {
            let attempt = || {
                let store = store.clone();
                let entry = entry.clone();
                async move { store.append(entry).await }
            };
            let result = attempt
                .retry(backoff)
                .sleep(tokio::time::sleep)
                .when(Error::is_retryable)
                .notify(|e: &Error, delay: Duration| {
                    log::warn!("Audit write retry in {delay:?}: {e}");
                })
                .await;

            match result {
                Ok(stored) => log::info!("Audit #{} written after retry", stored.id()),
                Err(source) => {
                    let lost = Error::WriteFailure {
                        target_type: entry.target_type.clone(),
                        action: entry.action.to_string(),
                        source: warden_core::Error::store(source.to_string()),
                    };
                    log::error!("{lost}: giving up; lost entry: {}", entry.details);
                }
            }
        });

        match self.pending.lock() {
            Ok(mut pending) => {
                pending.retain(|h| !h.is_finished());
                pending.push(handle);
            }
            Err(e) => log::error!("Audit retry list poisoned: {e}"),
        }
    }
}

#[async_trait]
impl MutationSubscriber for AuditTrailRecorder {
    async fn on_event(&self, event: &MutationEvent) {
        self.on_mutation(event).await;
    }

    fn name(&self) -> &str {
        "audit-trail"
    }
}

impl std::fmt::Debug for AuditTrailRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditTrailRecorder")
            .field("templates", &self.templates)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Display name of the event's subject, or a placeholder when the snapshot
/// or its name is missing.
fn subject_name(event: &MutationEvent) -> String {
    if let Some(name) = event
        .subject()
        .and_then(|s| s.display_name.as_deref())
        .filter(|n| !n.is_empty())
    {
        return name.to_string();
    }

    let known_id = event
        .subject()
        .or(event.before.as_ref())
        .or(event.after.as_ref())
        .map(|s| s.id.as_str());
    log::warn!(
        "No display name for {:?} {} event; rendering placeholder",
        event.action,
        event.kind
    );
    match known_id {
        Some(id) => format!("#{id}"),
        None => "(unknown)".to_string(),
    }
}
