//! Identifier types for principals, roles, abilities, audit entries and
//! shared resources.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates an identifier from its raw value.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

numeric_id!(
    /// Identifier of an authenticated actor.
    PrincipalId
);

numeric_id!(
    /// Identifier of a role definition.
    RoleId
);

numeric_id!(
    /// Identifier of a single grantable ability.
    AbilityId
);

numeric_id!(
    /// Store-assigned, monotonically increasing audit entry sequence.
    AuditEntryId
);

/// Identifier of a resource shared through a capability link.
///
/// Resource identifiers arrive as URL parameters, so they are kept as
/// opaque strings rather than parsed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates a resource ID from a string.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_core::ResourceId;
    ///
    /// let id = ResourceId::new("42");
    /// assert_eq!(id.as_str(), "42");
    /// ```
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Returns the resource ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Normalize a role slug or entity-kind tag to lowercase snake_case.
///
/// Performs the following transformations:
/// 1. Splits CamelCase words
/// 2. Converts to lowercase
/// 3. Treats hyphens and whitespace as word separators
/// 4. Joins words with single underscores
///
/// # Examples
///
/// ```
/// use warden_core::normalize_slug;
///
/// assert_eq!(normalize_slug("ComplianceRequirement"), "compliance_requirement");
/// assert_eq!(normalize_slug("audit-item"), "audit_item");
/// assert_eq!(normalize_slug("  User  "), "user");
/// ```
pub fn normalize_slug(raw: &str) -> String {
    let mut spaced = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;
    for ch in raw.trim().chars() {
        if ch.is_uppercase() && prev_lower {
            spaced.push(' ');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        spaced.extend(ch.to_lowercase());
    }
    spaced
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("_")
}
