//! # REST Server
//!
//! Mounts every registered resource under the configured prefix and serves
//! the combined router. Unmatched paths and methods answer with the same
//! `{"detail"}` envelope as handler errors.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{OriginalUri, Request};
use axum::http::Method;
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::routing::{on, MethodRouter};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::cache::{CacheLayer, CacheStore};
use crate::coerce::Coercer;
use crate::config::RestConfig;
use crate::registry::{Operation, ResourceRegistry};
use crate::store::RowStore;

use super::errors::RestError;
use super::handler;
use super::middleware::{cache_list, cache_single};
use super::state::ResourceState;

/// REST server for the registered resources
pub struct RestServer {
    config: RestConfig,
    registry: Arc<ResourceRegistry>,
    store: Arc<dyn RowStore>,
    cache: CacheLayer,
}

impl RestServer {
    pub fn new(
        config: RestConfig,
        registry: ResourceRegistry,
        store: Arc<dyn RowStore>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
            store,
            cache: CacheLayer::new(cache),
        }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Build the combined router
    pub fn router(&self) -> Router {
        let coercer = Coercer::new(self.config.coercion_policy());
        let mut app = Router::new();

        for resource in self.registry.iter() {
            let mount = self.registry.mount_path(resource);
            let state = ResourceState {
                resource: Arc::clone(resource),
                store: Arc::clone(&self.store),
                cache: self.cache.clone(),
                coercer,
            };
            info!(
                resource = %resource.name(),
                path = %mount,
                operations = ?resource.operations().collect::<Vec<_>>(),
                "Mounted resource"
            );
            app = app.merge(resource_routes(state, &mount));
        }

        let registry = Arc::clone(&self.registry);
        let app = app
            .fallback(move |OriginalUri(uri): OriginalUri| {
                let registry = Arc::clone(&registry);
                async move { unmatched(&registry, uri.path()) }
            })
            .layer(TraceLayer::new_for_http());

        match self.cors() {
            Some(cors) => app.layer(cors),
            None => app,
        }
    }

    /// CORS layer for the configured origins, if any
    fn cors(&self) -> Option<CorsLayer> {
        if self.config.cors_origins.is_empty() {
            return None;
        }
        let origins: Vec<_> = self
            .config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        Some(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any),
        )
    }

    /// Serve the generated router until Ctrl-C
    pub async fn start(self) -> io::Result<()> {
        let router = self.router();
        self.serve(router).await
    }

    /// Serve `router` (typically [`RestServer::router`] wrapped in host
    /// middleware) until Ctrl-C, then flush pending cache invalidations
    pub async fn serve(self, router: Router) -> io::Result<()> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(addr).await?;
        info!(
            %addr,
            prefix = %self.registry.prefix(),
            resources = self.registry.len(),
            "Starting REST server"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!(
            pending = self.cache.pending_invalidations(),
            "Draining delayed cache invalidations"
        );
        self.cache.drain().await;
        Ok(())
    }
}

/// Routes of one resource, with its middleware chain.
///
/// The collection answers at both `{mount}` and `{mount}/`.
fn resource_routes(state: ResourceState, mount: &str) -> Router {
    let collection = path_route(&state, "/");
    let mut router = Router::new()
        .route(mount, collection.clone())
        .route(&format!("{}/", mount), collection)
        .route(&format!("{}/:id", mount), path_route(&state, "/:id"));

    // Layers wrap what is already there, so the first registered goes on last
    for mw in state.resource.config.hooks.pre.iter().rev() {
        let mw = Arc::clone(mw);
        router = router.layer(from_fn(move |req: Request, next: Next| mw(req, next)));
    }
    router.with_state(state)
}

/// Every operation mounted at `path`; other methods get the error envelope
fn path_route(state: &ResourceState, path: &str) -> MethodRouter<ResourceState> {
    Operation::ALL
        .into_iter()
        .filter(|op| op.route_path() == path)
        .fold(MethodRouter::new(), |route, op| {
            route.merge(operation_route(state, op))
        })
        .fallback(method_not_allowed)
}

/// Handler for one operation: custom or generated, inside the cache
/// lookup and then the operation's middleware
fn operation_route(state: &ResourceState, op: Operation) -> MethodRouter<ResourceState> {
    let resource = &state.resource;
    let filter = op.method_filter();

    if !resource.is_enabled(op) {
        let name = resource.name().to_string();
        return on(filter, move || {
            let name = name.clone();
            async move { handler::disabled(&name, op) }
        });
    }

    let mut route = match resource.config.hooks.handler(op) {
        Some(custom) => {
            debug!(resource = %resource.name(), operation = %op, "Using custom handler");
            let custom = Arc::clone(custom);
            on(filter, move |req: Request| custom(req))
        }
        None => match op {
            Operation::List => on(filter, handler::list),
            Operation::Get => on(filter, handler::get_one),
            Operation::Create => on(filter, handler::create),
            Operation::Update => on(filter, handler::update),
            Operation::Delete => on(filter, handler::remove),
        },
    };

    if op == Operation::List && resource.config.list_ttl.is_some() {
        route = route.layer(from_fn_with_state(state.clone(), cache_list));
    }
    if op == Operation::Get && resource.config.single_ttl.is_some() {
        route = route.layer(from_fn_with_state(state.clone(), cache_single));
    }
    for mw in resource.config.hooks.middleware(op).iter().rev() {
        let mw = Arc::clone(mw);
        route = route.layer(from_fn(move |req: Request, next: Next| mw(req, next)));
    }
    route
}

async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> RestError {
    RestError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

fn unmatched(registry: &ResourceRegistry, path: &str) -> RestError {
    match registry.resolve(path) {
        Some(resource) => {
            debug!(resource = %resource.name(), %path, "No route on resource");
            RestError::NotFound
        }
        None => RestError::UnknownRoute(path.to_string()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
