//! Integration test suite for warden-acl.
//!
//! Exercises the resolver, its cache and the admin layer together,
//! including interleavings where a revocation races a cache fill.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
mod integration;
