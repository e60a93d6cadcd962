//! Warden Core: shared types, errors, clock and configuration.
//!
//! This crate provides the foundational types used across all Warden crates.
//! It has no internal Warden dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`ids`]: Identifier newtypes and slug normalization
//! - [`model`]: Principals, roles and abilities as read from the store
//! - [`clock`]: Injectable time source
//! - [`config`]: Layered TOML + environment configuration

#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod model;

// Re-export key types at crate root for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::WardenConfig;
pub use error::{Error, Result};
pub use ids::{AbilityId, AuditEntryId, PrincipalId, ResourceId, RoleId, normalize_slug};
pub use model::{Ability, Principal, Role};
