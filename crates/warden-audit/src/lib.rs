//! # warden-audit
//!
//! Append-only audit trail for Warden.
//!
//! - [`MutationEvent`] / [`MutationBus`]: create, update and delete events
//!   published by the persistence layer
//! - [`TemplateRegistry`]: which entity kinds are audited and how their
//!   summaries read
//! - [`AuditStore`]: append-only persistence, with [`MemoryAuditStore`]
//! - [`AuditTrailRecorder`]: the subscriber that writes entries, retrying
//!   failed appends in the background

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod bus;
pub mod error;
pub mod event;
pub mod recorder;
pub mod store;
pub mod template;

pub use bus::{MutationBus, MutationSubscriber};
pub use error::{Error, Result};
pub use event::{EntitySnapshot, MutationAction, MutationEvent};
pub use recorder::{AuditTrailRecorder, RetryPolicy};
pub use store::{
    AuditAction, AuditLogEntry, AuditQuery, AuditStore, MemoryAuditStore, NewAuditEntry,
    SYSTEM_ACTOR,
};
pub use template::{KindTemplates, TemplateRegistry};
