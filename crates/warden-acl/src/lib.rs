//! # warden-acl
//!
//! Role and ability resolution for Warden.
//!
//! This crate implements the access-control half of the core:
//! - [`AccessStore`] / [`AccessWriter`]: read and write seams onto the
//!   persistence collaborator, with an in-memory implementation
//! - [`AbilityCache`]: per-principal cache of resolved access
//! - [`RoleAbilityResolver`]: flat union of role grants, fail-closed
//! - [`AccessAdmin`]: writes that invalidate before acknowledging
//! - [`PermissionSnapshotPublisher`]: `{roles, permissions}` per request

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod admin;
pub mod cache;
pub mod error;
pub mod resolver;
pub mod snapshot;
pub mod store;

pub use admin::AccessAdmin;
pub use cache::{AbilityCache, CachedAccess, MemoryAbilityCache};
pub use error::{Error, Result};
pub use resolver::{AccessChange, ResolvedAccess, RoleAbilityResolver};
pub use snapshot::{PermissionSnapshot, PermissionSnapshotPublisher};
pub use store::{AccessStore, AccessWriter, MemoryAccessStore};
