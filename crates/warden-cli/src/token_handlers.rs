//! Handlers for `warden token` subcommands.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use url::Url;
use warden_capability::{CapabilityLink, CapabilityTokenService, Verification};
use warden_core::{ResourceId, SystemClock, WardenConfig};

use crate::cli::TokenAction;
use crate::error::Result;

/// Run a token subcommand. The exit code is a failure only when
/// `verify` rejects the token.
pub fn handle_token_command(config: &WardenConfig, action: TokenAction) -> Result<ExitCode> {
    let tokens = token_service(config)?;
    match action {
        TokenAction::Issue {
            id,
            expires,
            timestamp,
        } => {
            println!("{}", cmd_token_issue(&tokens, &id, timestamp.as_deref(), expires));
        }
        TokenAction::Verify {
            id,
            expires,
            token,
            timestamp,
            now,
        } => {
            let outcome =
                cmd_token_verify(&tokens, &id, timestamp.as_deref(), expires, &token, now);
            println!("{}", verification_label(outcome));
            if !outcome.is_valid() {
                return Ok(ExitCode::FAILURE);
            }
        }
        TokenAction::Link {
            base_url,
            id,
            ttl_secs,
            json,
        } => {
            let (url, link) = cmd_token_link(&tokens, &base_url, &id, ttl_secs)?;
            println!("{url}");
            if json {
                println!("{}", serde_json::to_string_pretty(&link)?);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Token service over the wall clock and the `[capability]` secrets.
pub fn token_service(config: &WardenConfig) -> Result<CapabilityTokenService> {
    CapabilityTokenService::from_config(&config.capability, Arc::new(SystemClock))
        .map_err(Into::into)
}

/// The token for `(id, timestamp, expires)`.
pub fn cmd_token_issue(
    tokens: &CapabilityTokenService,
    id: &str,
    timestamp: Option<&str>,
    expires: i64,
) -> String {
    tokens.issue(&ResourceId::new(id), timestamp, expires)
}

/// Check `token`, as of `now` when given.
pub fn cmd_token_verify(
    tokens: &CapabilityTokenService,
    id: &str,
    timestamp: Option<&str>,
    expires: i64,
    token: &str,
    now: Option<i64>,
) -> Verification {
    let resource = ResourceId::new(id);
    match now {
        Some(now) => tokens.verify_at(&resource, timestamp, expires, token, now),
        None => tokens.verify(&resource, timestamp, expires, token),
    }
}

/// A fresh link for `id` and its share URL under `base_url`.
pub fn cmd_token_link(
    tokens: &CapabilityTokenService,
    base_url: &str,
    id: &str,
    ttl_secs: Option<u64>,
) -> Result<(Url, CapabilityLink)> {
    let base = Url::parse(base_url)?;
    let resource = ResourceId::new(id);
    let link = match ttl_secs {
        Some(secs) => tokens.issue_for(&resource, Duration::from_secs(secs)),
        None => tokens.default_link(&resource),
    };
    log::debug!("Issued link for {id} expiring at {}", link.expires);
    Ok((link.share_url(&base), link))
}

/// Word printed for a verification outcome.
pub fn verification_label(outcome: Verification) -> &'static str {
    match outcome {
        Verification::Valid => "valid",
        Verification::Expired => "expired",
        Verification::Invalid => "invalid",
    }
}
