//! Capability links for Warden.
//!
//! Provides:
//! - [`CapabilityTokenService`]: HMAC-SHA256 tokens binding a resource id to
//!   an expiry, with key rotation
//! - [`CapabilityLink`]: the link parameters and share-URL construction
//! - [`CapabilityGate`] / [`ResourceResolver`]: request handling for
//!   anonymous link holders
//! - [`capability_router`]: the same, mounted as an axum `Router`
//! - [`CapabilityError`]: capability-specific error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod error;
mod gate;
mod link;
mod routes;
mod token;

pub use error::{CapabilityError, Result};
pub use gate::{CapabilityGate, GateBody, GateResponse, MemoryResourceResolver, ResourceResolver};
pub use link::{CapabilityLink, LinkQuery};
pub use routes::{SHARE_PATH, capability_router};
pub use token::{CapabilityTokenService, MIN_SECRET_LEN, MISSING_TIMESTAMP, Verification};
