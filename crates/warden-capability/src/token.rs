//! Capability token issuance and verification.
//!
//! A token is the lowercase hex HMAC-SHA256 of a canonical string built
//! from the resource id, the issue timestamp and the expiry:
//!
//! ```text
//! {len(resource)}:{resource}|{len(issued)}:{issued}|{expires}
//! ```
//!
//! Length prefixes keep distinct triples from sharing a canonical form
//! (`("a|1", "2")` vs `("a", "1|2")`). A link without a timestamp signs
//! [`MISSING_TIMESTAMP`] in its place, on both paths.
//!
//! One secret signs; retired secrets keep verifying until they are removed
//! from configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};
use warden_core::config::CapabilityConfig;
use warden_core::{Clock, ResourceId};

use crate::error::{CapabilityError, Result};
use crate::link::CapabilityLink;

type HmacSha256 = Hmac<Sha256>;

/// Stand-in signed when a link carries no timestamp.
pub const MISSING_TIMESTAMP: &str = "none";

/// Shortest accepted secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const TAG_LEN: usize = 32;

/// Outcome of checking a presented token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The token matches and the link has not expired.
    Valid,
    /// The link's expiry has passed. Reported whatever the token says.
    Expired,
    /// The token does not match the presented fields.
    Invalid,
}

impl Verification {
    /// Whether access should be granted.
    pub fn is_valid(self) -> bool {
        self == Verification::Valid
    }

    /// `Ok(())` when valid, the matching [`CapabilityError`] otherwise.
    pub fn into_result(self, expires: i64) -> Result<()> {
        match self {
            Verification::Valid => Ok(()),
            Verification::Expired => Err(CapabilityError::Expired { expires }),
            Verification::Invalid => Err(CapabilityError::Invalid("token mismatch".into())),
        }
    }
}

/// Issues and verifies capability tokens.
pub struct CapabilityTokenService {
    signing: HmacSha256,
    retired: Vec<HmacSha256>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl CapabilityTokenService {
    /// Service signing with `secret`.
    ///
    /// # Errors
    ///
    /// [`CapabilityError::WeakSecret`] if `secret` is shorter than
    /// [`MIN_SECRET_LEN`].
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            signing: keyed(secret)?,
            retired: Vec::new(),
            clock,
            default_ttl: Duration::from_secs(CapabilityConfig::default().default_ttl_secs),
        })
    }

    /// Also accept tokens signed with any of `secrets`.
    pub fn with_previous_secrets<I, S>(mut self, secrets: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        for secret in secrets {
            self.retired.push(keyed(secret.as_ref())?);
        }
        Ok(self)
    }

    /// Lifetime used by [`CapabilityTokenService::default_link`].
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Service built from the `[capability]` section.
    pub fn from_config(config: &CapabilityConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let service = Self::new(config.secret.as_bytes(), clock)?
            .with_previous_secrets(&config.previous_secrets)?
            .with_default_ttl(Duration::from_secs(config.default_ttl_secs));
        log::debug!(
            "Capability service ready with {} retired key(s)",
            service.retired.len()
        );
        Ok(service)
    }

    /// Token for `(resource, issued_at, expires_at)` under the active secret.
    ///
    /// Deterministic: the same inputs always yield the same token.
    pub fn issue(&self, resource: &ResourceId, issued_at: Option<&str>, expires_at: i64) -> String {
        hex::encode(tag(&self.signing, &canonical(resource, issued_at, expires_at)))
    }

    /// Link for `resource` expiring `ttl` from now, stamped with the current time.
    pub fn issue_for(&self, resource: &ResourceId, ttl: Duration) -> CapabilityLink {
        let now = self.clock.unix_now();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = now.saturating_add(ttl_secs);
        let timestamp = now.to_string();
        let token = self.issue(resource, Some(&timestamp), expires);
        CapabilityLink {
            id: resource.clone(),
            timestamp: Some(timestamp),
            expires,
            token,
        }
    }

    /// Link for `resource` using the configured default lifetime.
    pub fn default_link(&self, resource: &ResourceId) -> CapabilityLink {
        self.issue_for(resource, self.default_ttl)
    }

    /// Check `presented` against the fields it arrived with, at the current time.
    pub fn verify(
        &self,
        resource: &ResourceId,
        timestamp: Option<&str>,
        expires_at: i64,
        presented: &str,
    ) -> Verification {
        self.verify_at(resource, timestamp, expires_at, presented, self.clock.unix_now())
    }

    /// [`CapabilityTokenService::verify`] with an explicit `now`.
    pub fn verify_at(
        &self,
        resource: &ResourceId,
        timestamp: Option<&str>,
        expires_at: i64,
        presented: &str,
        now: i64,
    ) -> Verification {
        if now > expires_at {
            return Verification::Expired;
        }
        let Some(presented) = decode_tag(presented) else {
            return Verification::Invalid;
        };

        let message = canonical(resource, timestamp, expires_at);
        let mut matched = Choice::from(0u8);
        for key in std::iter::once(&self.signing).chain(&self.retired) {
            matched |= tag(key, &message).as_slice().ct_eq(presented.as_slice());
        }
        if bool::from(matched) {
            Verification::Valid
        } else {
            Verification::Invalid
        }
    }

    /// Verify a whole link at the current time.
    pub fn verify_link(&self, link: &CapabilityLink) -> Verification {
        self.verify(&link.id, link.timestamp.as_deref(), link.expires, &link.token)
    }

    /// Current Unix time according to the injected clock.
    pub fn now(&self) -> i64 {
        self.clock.unix_now()
    }
}

impl fmt::Debug for CapabilityTokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityTokenService")
            .field("retired_keys", &self.retired.len())
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

fn keyed(secret: &[u8]) -> Result<HmacSha256> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(CapabilityError::WeakSecret {
            len: secret.len(),
            min: MIN_SECRET_LEN,
        });
    }
    HmacSha256::new_from_slice(secret).map_err(|e| CapabilityError::Internal(e.to_string()))
}

fn tag(key: &HmacSha256, message: &str) -> [u8; TAG_LEN] {
    let mut mac = key.clone();
    mac.update(message.as_bytes());
    mac.finalize().into_bytes().into()
}

fn canonical(resource: &ResourceId, issued_at: Option<&str>, expires_at: i64) -> String {
    let resource = resource.as_str();
    let issued = issued_at
        .filter(|t| !t.is_empty())
        .unwrap_or(MISSING_TIMESTAMP);
    format!(
        "{}:{resource}|{}:{issued}|{expires_at}",
        resource.len(),
        issued.len()
    )
}

fn decode_tag(presented: &str) -> Option<[u8; TAG_LEN]> {
    if presented.len() != TAG_LEN * 2
        || !presented
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return None;
    }
    let bytes = hex::decode(presented).ok()?;
    bytes.try_into().ok()
}
