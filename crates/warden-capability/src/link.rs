//! Share links: the four query parameters a capability travels in.

use serde::{Deserialize, Serialize};
use url::Url;
use warden_core::ResourceId;

use crate::error::{CapabilityError, Result};

/// A capability as it appears in a share link (`?id=&timestamp=&expires=&token=`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityLink {
    /// Shared resource.
    pub id: ResourceId,
    /// Issue timestamp, when the link carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Expiry in Unix seconds.
    pub expires: i64,
    /// Hex MAC over the other three fields.
    pub token: String,
}

impl CapabilityLink {
    /// `base` with this link's parameters appended to its query string.
    ///
    /// Existing query pairs on `base` are kept.
    pub fn share_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("id", self.id.as_str());
            if let Some(ts) = &self.timestamp {
                pairs.append_pair("timestamp", ts);
            }
            pairs.append_pair("expires", &self.expires.to_string());
            pairs.append_pair("token", &self.token);
        }
        url
    }

    /// Parse the link parameters back out of a share URL.
    pub fn from_url(url: &Url) -> Result<Self> {
        let mut query = LinkQuery::default();
        for (key, value) in url.query_pairs() {
            let slot = match key.as_ref() {
                "id" => &mut query.id,
                "timestamp" => &mut query.timestamp,
                "expires" => &mut query.expires,
                "token" => &mut query.token,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        query.into_link()
    }
}

/// Raw, untrusted link parameters as they arrive on a request.
///
/// Every field is optional so that a malformed link reaches the gate and is
/// answered with the generic denial, not an extractor rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LinkQuery {
    /// `id` parameter.
    pub id: Option<String>,
    /// `timestamp` parameter.
    pub timestamp: Option<String>,
    /// `expires` parameter.
    pub expires: Option<String>,
    /// `token` parameter.
    pub token: Option<String>,
}

impl LinkQuery {
    /// Validate shape only: `id`, `expires` and `token` present, `expires`
    /// an integer. The token itself is checked by the service.
    pub fn into_link(self) -> Result<CapabilityLink> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CapabilityError::Invalid("missing id".into()))?;
        let expires = self
            .expires
            .ok_or_else(|| CapabilityError::Invalid("missing expires".into()))?
            .trim()
            .parse::<i64>()
            .map_err(|e| CapabilityError::Invalid(format!("unparsable expires: {e}")))?;
        let token = self
            .token
            .ok_or_else(|| CapabilityError::Invalid("missing token".into()))?;
        Ok(CapabilityLink {
            id: ResourceId::new(id),
            timestamp: self.timestamp.filter(|t| !t.is_empty()),
            expires,
            token,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn link() -> CapabilityLink {
        CapabilityLink {
            id: ResourceId::new("42"),
            timestamp: None,
            expires: 1_700_000_000,
            token: "ab".repeat(32),
        }
    }

    #[test]
    fn test_share_url_query() {
        let base = Url::parse("https://audits.example.com/share").unwrap();
        let url = link().share_url(&base);
        assert_eq!(
            url.as_str(),
            format!(
                "https://audits.example.com/share?id=42&expires=1700000000&token={}",
                "ab".repeat(32)
            )
        );
    }

    #[test]
    fn test_share_url_keeps_base_query_and_escapes() {
        let base = Url::parse("https://x.test/s?lang=en").unwrap();
        let mut l = link();
        l.id = ResourceId::new("a b&c");
        l.timestamp = Some("1690000000".into());
        let url = l.share_url(&base);
        assert!(url.as_str().starts_with("https://x.test/s?lang=en&id=a+b%26c&timestamp=1690000000"));
        assert_eq!(CapabilityLink::from_url(&url).unwrap(), l);
    }

    #[test]
    fn test_missing_expires_is_invalid() {
        let query = LinkQuery {
            id: Some("42".into()),
            token: Some("00".into()),
            ..LinkQuery::default()
        };
        assert!(matches!(query.into_link(), Err(CapabilityError::Invalid(_))));
    }

    #[test]
    fn test_unparsable_expires_is_invalid() {
        let query = LinkQuery {
            id: Some("42".into()),
            expires: Some("tomorrow".into()),
            token: Some("00".into()),
            ..LinkQuery::default()
        };
        let err = query.into_link().unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.status(), http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_empty_timestamp_treated_as_absent() {
        let query = LinkQuery {
            id: Some("42".into()),
            timestamp: Some(String::new()),
            expires: Some("10".into()),
            token: Some("00".into()),
        };
        assert_eq!(query.into_link().unwrap().timestamp, None);
    }
}
