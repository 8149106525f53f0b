//! Shared fixtures for the REST integration tests

#![allow(dead_code)]

use std::sync::Arc;

use aerocrud::cache::{CacheStore, MemoryCache};
use aerocrud::cli::user_context;
use aerocrud::config::RestConfig;
use aerocrud::registry::{RegistryBuilder, ResourceRegistry};
use aerocrud::rest_api::RestServer;
use aerocrud::schema::{FieldTags, Record, Reflect, Shape, StructShape};
use aerocrud::store::MemoryRowStore;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::from_fn;
use axum::Router;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower::ServiceExt;

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub owner_id: u64,
    pub title: String,
    pub body: String,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub deleted_at: DateTime<Utc>,
}

impl Reflect for Note {
    fn shape() -> Shape {
        StructShape::new()
            .field_with::<u64>("id", FieldTags::persist("pk autoincr"))
            .field::<u64>("owner_id")
            .field::<String>("title")
            .field::<String>("body")
            .field::<i32>("priority")
            .field_with::<DateTime<Utc>>("created_at", FieldTags::persist("created"))
            .field_with::<DateTime<Utc>>("deleted_at", FieldTags::persist("deleted"))
            .build()
    }
}

impl Record for Note {}

/// Reduced output shape of a [`Note`]
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NoteTitle {
    pub id: u64,
    pub title: String,
}

impl Reflect for NoteTitle {
    fn shape() -> Shape {
        StructShape::new()
            .field::<u64>("id")
            .field::<String>("title")
            .build()
    }
}

impl Record for NoteTitle {}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub server: RestServer,
    pub router: Router,
    pub store: Arc<MemoryRowStore>,
    pub cache: Arc<MemoryCache>,
}

impl Harness {
    /// Serve the registry built by `register` over fresh in-memory collaborators
    pub fn new(
        config: RestConfig,
        register: impl FnOnce(RegistryBuilder) -> RegistryBuilder,
    ) -> Self {
        let cache = Arc::new(MemoryCache::new());
        Self::with_cache(config, register, Arc::clone(&cache) as Arc<dyn CacheStore>, cache)
    }

    pub fn with_cache(
        config: RestConfig,
        register: impl FnOnce(RegistryBuilder) -> RegistryBuilder,
        backend: Arc<dyn CacheStore>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        let registry: ResourceRegistry = register(ResourceRegistry::builder(&config)).build();
        let store = Arc::new(MemoryRowStore::new());
        let server = RestServer::new(config, registry, store.clone(), backend);
        let router = server.router().layer(from_fn(user_context));
        Self {
            server,
            router,
            store,
            cache,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Reply {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, user: &str) -> Reply {
        self.send(request("GET", uri, user).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, user: &str, body: Value) -> Reply {
        self.send(json_request("POST", uri, user, body)).await
    }

    pub async fn put(&self, uri: &str, user: &str, body: Value) -> Reply {
        self.send(json_request("PUT", uri, user, body)).await
    }

    pub async fn delete(&self, uri: &str, user: &str) -> Reply {
        self.send(request("DELETE", uri, user).body(Body::empty()).unwrap())
            .await
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn is_cache_hit(&self) -> bool {
        self.headers
            .get("x-cache")
            .map(|v| v == "HIT")
            .unwrap_or(false)
    }

    pub fn detail(&self) -> &str {
        self.body["detail"].as_str().unwrap_or_default()
    }
}

/// Request builder carrying the caller id header (omitted when empty)
pub fn request(method: &str, uri: &str, user: &str) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    if user.is_empty() {
        builder
    } else {
        builder.header("x-user-id", user)
    }
}

pub fn json_request(method: &str, uri: &str, user: &str, body: Value) -> Request<Body> {
    request(method, uri, user)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
