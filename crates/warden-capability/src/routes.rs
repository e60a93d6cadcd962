//! axum routes for capability links.

use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use crate::gate::CapabilityGate;
use crate::link::LinkQuery;

/// Path the share endpoint is mounted at.
pub const SHARE_PATH: &str = "/share";

/// Router serving `GET /share?id=&timestamp=&expires=&token=`.
pub fn capability_router(gate: Arc<CapabilityGate>) -> Router {
    Router::new()
        .route(SHARE_PATH, get(share))
        .with_state(gate)
}

async fn share(
    State(gate): State<Arc<CapabilityGate>>,
    query: Result<Query<LinkQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            log::warn!("Unreadable capability link query: {rejection}");
            LinkQuery::default()
        }
    };
    gate.handle(query).await.into_response()
}
