//! Common test utilities for warden-audit integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use warden_audit::{
    AuditLogEntry, AuditQuery, AuditStore, AuditTrailRecorder, MemoryAuditStore, MutationBus,
    NewAuditEntry, RetryPolicy, TemplateRegistry,
};
use warden_core::FixedClock;

pub const NOW: i64 = 1_700_000_000;

/// Audit store that fails the first `failures` appends.
pub struct FlakyAuditStore {
    pub inner: MemoryAuditStore,
    pub failures: AtomicUsize,
    pub attempts: AtomicUsize,
}

impl FlakyAuditStore {
    pub fn failing(failures: usize) -> Self {
        Self {
            inner: MemoryAuditStore::new(),
            failures: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AuditStore for FlakyAuditStore {
    async fn append(&self, entry: NewAuditEntry) -> warden_audit::Result<AuditLogEntry> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(warden_core::Error::store("audit database unavailable").into());
        }
        self.inner.append(entry).await
    }

    async fn list(&self, query: &AuditQuery) -> warden_audit::Result<Vec<AuditLogEntry>> {
        self.inner.list(query).await
    }
}

/// Recorder over `store` with default templates, a pinned clock and a fast
/// retry policy, subscribed to a fresh bus.
pub fn wired(store: Arc<dyn AuditStore>, max_attempts: usize) -> (Arc<AuditTrailRecorder>, MutationBus) {
    let recorder = Arc::new(
        AuditTrailRecorder::new(
            store,
            TemplateRegistry::with_defaults(),
            Arc::new(FixedClock::at(NOW)),
        )
        .with_retry(RetryPolicy {
            max_attempts,
            min_delay: Duration::from_millis(10),
        }),
    );
    let bus = MutationBus::new().subscribe(recorder.clone());
    (recorder, bus)
}
