//! # warden-cli
//!
//! Operator tooling for Warden:
//! - configuration inspection and editing (`warden config ...`)
//! - capability token issue, verification and share links (`warden token ...`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod config_handlers;
pub mod error;
pub mod token_handlers;

pub use cli::{Args, Command, ConfigAction, TokenAction};
pub use error::{Error, Result};
