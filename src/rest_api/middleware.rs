//! Read-through cache middleware
//!
//! Installed on list and single-record routes whose TTL is set. A hit is
//! answered from the cache without reaching the handler; a miss runs the
//! handler, which populates the entry itself.

use axum::extract::{OriginalUri, Request, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::registry::Operation;

use super::context::ContextValues;
use super::state::ResourceState;

/// Header marking a response served from the cache
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");

pub async fn cache_list(State(state): State<ResourceState>, req: Request, next: Next) -> Response {
    read_through(state, Operation::List, req, next).await
}

pub async fn cache_single(State(state): State<ResourceState>, req: Request, next: Next) -> Response {
    read_through(state, Operation::Get, req, next).await
}

async fn read_through(state: ResourceState, op: Operation, req: Request, next: Next) -> Response {
    if bypasses_cache(&req) {
        return next.run(req).await;
    }

    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.clone())
        .unwrap_or_else(|| req.uri().clone());
    let key = state.cache_key(op, &uri, req.extensions().get::<ContextValues>());

    match state.cache.lookup(&key).await {
        Some(payload) => (
            StatusCode::OK,
            [
                (CONTENT_TYPE, HeaderValue::from_static("application/json")),
                (CACHE_STATUS_HEADER, HeaderValue::from_static("HIT")),
            ],
            payload,
        )
            .into_response(),
        None => next.run(req).await,
    }
}

/// `Cache-Control: no-cache` skips the lookup
fn bypasses_cache(req: &Request) -> bool {
    req.headers()
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| {
            v.split(',')
                .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
        })
}
