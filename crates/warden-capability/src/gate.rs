//! Capability-link request handling.
//!
//! [`CapabilityGate::handle`] turns raw link parameters into a response:
//! verify the token, look the resource up, project it. Nothing here
//! consults the role resolver; the token alone authorizes the read.
//!
//! | outcome                          | status | body                 |
//! |----------------------------------|--------|----------------------|
//! | valid token, resource found      | 200    | JSON projection      |
//! | expired, invalid or malformed    | 403    | generic text         |
//! | valid token, resource missing    | 404    | generic text         |
//! | resolver failure                 | 500    | generic text         |

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::Value;
use warden_core::ResourceId;

use crate::error::{CapabilityError, Result};
use crate::link::{CapabilityLink, LinkQuery};
use crate::token::CapabilityTokenService;

/// Looks up the public projection of a shared resource.
#[async_trait]
pub trait ResourceResolver: Send + Sync {
    /// Projection for `id`, or `None` if it does not exist.
    async fn project(&self, id: &ResourceId) -> warden_core::Result<Option<Value>>;
}

/// [`ResourceResolver`] over an in-memory map.
#[derive(Debug, Default)]
pub struct MemoryResourceResolver {
    resources: RwLock<HashMap<ResourceId, Value>>,
}

impl MemoryResourceResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `projection` under `id`.
    pub fn insert(&self, id: impl Into<ResourceId>, projection: Value) {
        if let Ok(mut resources) = self.resources.write() {
            resources.insert(id.into(), projection);
        }
    }

    /// Withdraw `id`.
    pub fn remove(&self, id: &ResourceId) {
        if let Ok(mut resources) = self.resources.write() {
            resources.remove(id);
        }
    }
}

#[async_trait]
impl ResourceResolver for MemoryResourceResolver {
    async fn project(&self, id: &ResourceId) -> warden_core::Result<Option<Value>> {
        let resources = self
            .resources
            .read()
            .map_err(|e| warden_core::Error::store(format!("resource map poisoned: {e}")))?;
        Ok(resources.get(id).cloned())
    }
}

/// Response produced by the gate, independent of any web framework.
#[derive(Debug, Clone, PartialEq)]
pub struct GateResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response body.
    pub body: GateBody,
}

/// Body of a [`GateResponse`].
#[derive(Debug, Clone, PartialEq)]
pub enum GateBody {
    /// Resource projection, sent as JSON.
    Json(Value),
    /// Generic plain-text explanation.
    Text(&'static str),
}

impl GateResponse {
    fn ok(projection: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: GateBody::Json(projection),
        }
    }

    fn from_error(err: &CapabilityError) -> Self {
        Self {
            status: err.status(),
            body: GateBody::Text(err.public_message()),
        }
    }
}

impl IntoResponse for GateResponse {
    fn into_response(self) -> Response {
        match self.body {
            GateBody::Json(value) => (self.status, Json(value)).into_response(),
            GateBody::Text(text) => (
                self.status,
                [(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                text,
            )
                .into_response(),
        }
    }
}

/// Verifies capability links and serves the resources they name.
#[derive(Clone)]
pub struct CapabilityGate {
    tokens: Arc<CapabilityTokenService>,
    resources: Arc<dyn ResourceResolver>,
}

impl CapabilityGate {
    /// Create a gate over `tokens` and `resources`.
    pub fn new(tokens: Arc<CapabilityTokenService>, resources: Arc<dyn ResourceResolver>) -> Self {
        Self { tokens, resources }
    }

    /// The token service behind this gate.
    pub fn tokens(&self) -> &CapabilityTokenService {
        &self.tokens
    }

    /// Answer a link request. Never fails; errors become generic responses.
    pub async fn handle(&self, query: LinkQuery) -> GateResponse {
        match self.authorize(query).await {
            Ok(projection) => GateResponse::ok(projection),
            Err(err) => GateResponse::from_error(&err),
        }
    }

    /// Verify and resolve, surfacing the precise error.
    pub async fn authorize(&self, query: LinkQuery) -> Result<Value> {
        let link = query.into_link().inspect_err(|e| {
            log::warn!("Rejected malformed capability link: {e}");
        })?;
        self.authorize_link(&link).await
    }

    /// [`CapabilityGate::authorize`] for an already-parsed link.
    pub async fn authorize_link(&self, link: &CapabilityLink) -> Result<Value> {
        if let Err(e) = self.tokens.verify_link(link).into_result(link.expires) {
            log::warn!(
                "Denied capability link for resource {} (expires {}): {e}",
                link.id,
                link.expires
            );
            return Err(e);
        }

        match self.resources.project(&link.id).await {
            Ok(Some(projection)) => {
                log::debug!("Served capability link for resource {}", link.id);
                Ok(projection)
            }
            Ok(None) | Err(warden_core::Error::NotFound { .. }) => {
                log::info!("Capability link for missing resource {}", link.id);
                Err(CapabilityError::ResourceNotFound(link.id.to_string()))
            }
            Err(e) => {
                log::error!("Resource lookup failed for {}: {e}", link.id);
                Err(CapabilityError::Internal(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for CapabilityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityGate")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
