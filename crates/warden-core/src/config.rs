//! Layered configuration.
//!
//! [`WardenConfig`] is read from a TOML file and then overridden by
//! `WARDEN_*` environment variables. The file is located by, in order:
//!
//! 1. an explicit path (e.g. `--config`)
//! 2. the `WARDEN_CONFIG` environment variable
//! 3. `<config dir>/warden/config.toml` (platform config dir)
//!
//! A missing file is not an error; defaults apply.
//!
//! ```
//! use warden_core::WardenConfig;
//!
//! let config = WardenConfig::from_toml_str(
//!     r#"
//!     [access]
//!     cache_timeout_ms = 50
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.access.cache_timeout_ms, 50);
//! assert!(config.access.cache_enabled);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Project name, used for the config directory and env prefix.
pub const PROJECT_NAME: &str = "warden";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "WARDEN";

const REDACTED: &str = "<redacted>";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Capability-link signing.
    pub capability: CapabilityConfig,
    /// Role/ability resolution.
    pub access: AccessConfig,
    /// Audit trail recording.
    pub audit: AuditConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Capability token settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Active signing secret.
    pub secret: String,
    /// Retired secrets still accepted for verification.
    pub previous_secrets: Vec<String>,
    /// Lifetime of links issued without an explicit expiry.
    pub default_ttl_secs: u64,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            previous_secrets: Vec::new(),
            default_ttl_secs: 7 * 24 * 3600,
        }
    }
}

impl fmt::Debug for CapabilityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityConfig")
            .field("secret", &REDACTED)
            .field("previous_secrets", &self.previous_secrets.len())
            .field("default_ttl_secs", &self.default_ttl_secs)
            .finish()
    }
}

/// Ability resolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Whether resolved abilities are cached per principal.
    pub cache_enabled: bool,
    /// Upper bound on any single cache call before falling back to the store.
    pub cache_timeout_ms: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_timeout_ms: 200,
        }
    }
}

/// Audit retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Out-of-band retries after a failed append.
    pub retry_max_attempts: usize,
    /// First backoff delay; doubles on each retry.
    pub retry_min_delay_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            retry_max_attempts: 5,
            retry_min_delay_ms: 100,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `info,warden_acl=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl WardenConfig {
    /// Load configuration from the resolved file (if any), then apply
    /// environment overrides.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(config_path) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                log::debug!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Resolve the config file path: explicit, then `WARDEN_CONFIG`, then
    /// the platform default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(env_key("CONFIG")) {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// `<config dir>/warden/config.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join("config.toml"))
    }

    /// Apply `WARDEN_*` overrides using `lookup` to read variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(&env_key("CAPABILITY_SECRET")) {
            self.capability.secret = secret;
        }
        if let Some(list) = lookup(&env_key("CAPABILITY_PREVIOUS_SECRETS")) {
            self.capability.previous_secrets = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = lookup(&env_key("CAPABILITY_DEFAULT_TTL_SECS")) {
            self.capability.default_ttl_secs = parse_env("CAPABILITY_DEFAULT_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup(&env_key("ACCESS_CACHE_ENABLED")) {
            self.access.cache_enabled = parse_env("ACCESS_CACHE_ENABLED", &v)?;
        }
        if let Some(v) = lookup(&env_key("ACCESS_CACHE_TIMEOUT_MS")) {
            self.access.cache_timeout_ms = parse_env("ACCESS_CACHE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup(&env_key("AUDIT_RETRY_MAX_ATTEMPTS")) {
            self.audit.retry_max_attempts = parse_env("AUDIT_RETRY_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = lookup(&env_key("AUDIT_RETRY_MIN_DELAY_MS")) {
            self.audit.retry_min_delay_ms = parse_env("AUDIT_RETRY_MIN_DELAY_MS", &v)?;
        }
        if let Some(level) = lookup(&env_key("LOG_LEVEL")) {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Copy with every secret replaced by a placeholder, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.capability.secret.is_empty() {
            copy.capability.secret = REDACTED.to_string();
        }
        for secret in &mut copy.capability.previous_secrets {
            *secret = REDACTED.to_string();
        }
        copy
    }

    /// Export the resolved configuration as environment variables.
    ///
    /// Secrets are redacted.
    pub fn to_env_vars(&self) -> Vec<(String, String)> {
        let secret = if self.capability.secret.is_empty() {
            String::new()
        } else {
            REDACTED.to_string()
        };
        vec![
            (env_key("CAPABILITY_SECRET"), secret),
            (
                env_key("CAPABILITY_PREVIOUS_SECRETS"),
                vec![REDACTED; self.capability.previous_secrets.len()].join(","),
            ),
            (
                env_key("CAPABILITY_DEFAULT_TTL_SECS"),
                self.capability.default_ttl_secs.to_string(),
            ),
            (
                env_key("ACCESS_CACHE_ENABLED"),
                self.access.cache_enabled.to_string(),
            ),
            (
                env_key("ACCESS_CACHE_TIMEOUT_MS"),
                self.access.cache_timeout_ms.to_string(),
            ),
            (
                env_key("AUDIT_RETRY_MAX_ATTEMPTS"),
                self.audit.retry_max_attempts.to_string(),
            ),
            (
                env_key("AUDIT_RETRY_MIN_DELAY_MS"),
                self.audit.retry_min_delay_ms.to_string(),
            ),
            (env_key("LOG_LEVEL"), self.logging.level.clone()),
        ]
    }
}

/// `WARDEN_<suffix>`.
pub fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}_{suffix}")
}

fn parse_env<T: std::str::FromStr>(suffix: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("{}: invalid value '{value}': {e}", env_key(suffix))))
}
