//! Shared fixtures for warden-capability integration tests.

use std::sync::Arc;

use axum::body::Body;
use http::{Request, Response};
use serde_json::json;
use tower::ServiceExt;
use url::Url;
use warden_capability::{
    CapabilityGate, CapabilityTokenService, MemoryResourceResolver, capability_router,
};
use warden_core::FixedClock;

pub const SECRET: &[u8] = b"test-secret-with-at-least-32-bytes!!";
pub const NOW: i64 = 1_690_000_000;

pub struct LinkHarness {
    pub clock: Arc<FixedClock>,
    pub tokens: Arc<CapabilityTokenService>,
    pub resources: Arc<MemoryResourceResolver>,
    pub gate: Arc<CapabilityGate>,
}

impl LinkHarness {
    /// Harness at [`NOW`] with audit `42` published.
    pub fn new() -> Self {
        let clock = Arc::new(FixedClock::at(NOW));
        let tokens = Arc::new(CapabilityTokenService::new(SECRET, clock.clone()).unwrap());
        let resources = Arc::new(MemoryResourceResolver::new());
        resources.insert("42", json!({"id": 42, "title": "Kitchen hygiene audit"}));
        let gate = Arc::new(CapabilityGate::new(tokens.clone(), resources.clone()));
        Self {
            clock,
            tokens,
            resources,
            gate,
        }
    }

    /// Send `GET {path_and_query}` through the router.
    pub async fn get(&self, path_and_query: &str) -> (http::StatusCode, String, Option<String>) {
        let response = capability_router(self.gate.clone())
            .oneshot(
                Request::builder()
                    .uri(path_and_query)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        read(response).await
    }

    /// Send the request a share URL would produce.
    pub async fn follow(&self, url: &Url) -> (http::StatusCode, String, Option<String>) {
        let path = match url.query() {
            Some(q) => format!("{}?{q}", url.path()),
            None => url.path().to_string(),
        };
        self.get(&path).await
    }
}

async fn read(response: Response<Body>) -> (http::StatusCode, String, Option<String>) {
    let status = response.status();
    let content_type = response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap(), content_type)
}
