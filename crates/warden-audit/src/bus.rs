//! Publish/subscribe for mutation events.
//!
//! The persistence layer publishes one [`MutationEvent`] per write. Each
//! [`MutationSubscriber`] is awaited in registration order before
//! [`MutationBus::publish`] returns, so delivery is synchronous with the
//! mutation. Subscribers cannot fail the publish.
//!
//! # Example
//!
//! ```rust,ignore
//! let bus = MutationBus::new().subscribe(recorder.clone());
//! bus.publish(&MutationEvent::deleted("user", EntitySnapshot::named(7, "Alice"))).await;
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::event::MutationEvent;

/// Receives every published [`MutationEvent`].
#[async_trait]
pub trait MutationSubscriber: Send + Sync {
    /// Handle one event. Failures must be handled internally.
    async fn on_event(&self, event: &MutationEvent);

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Fan-out of mutation events to registered subscribers.
#[derive(Clone, Default)]
pub struct MutationBus {
    subscribers: Vec<Arc<dyn MutationSubscriber>>,
}

impl MutationBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` after the existing ones.
    pub fn subscribe(mut self, subscriber: Arc<dyn MutationSubscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `event` to every subscriber, in order.
    pub async fn publish(&self, event: &MutationEvent) {
        log::trace!(
            "Publishing {:?} {} to {} subscriber(s)",
            event.action,
            event.kind,
            self.subscribers.len()
        );
        for subscriber in &self.subscribers {
            subscriber.on_event(event).await;
        }
    }
}

impl std::fmt::Debug for MutationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.subscribers.iter().map(|s| s.name()).collect();
        f.debug_struct("MutationBus")
            .field("subscribers", &names)
            .finish()
    }
}
