//! CLI command implementations
//!
//! The binary hosts a demo `users` resource on the in-memory row store and
//! cache. Callers identify themselves with an `X-User-Id` header, which the
//! demo copies into the request context as the ownership scope.

use std::path::Path;
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::{from_fn, Next};
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cache::MemoryCache;
use crate::config::RestConfig;
use crate::registry::{Operation, ResourceBuilder, ResourceRegistry};
use crate::rest_api::{ContextValues, RestServer};
use crate::schema::{FieldTags, Record, Reflect, Shape, StructShape};
use crate::store::MemoryRowStore;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Header the demo reads the caller's id from
pub const USER_HEADER: &str = "x-user-id";

/// Context key the demo scopes `users` by
pub const USER_CONTEXT_KEY: &str = "user";

/// Demo record served at `/users`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub owner_id: u64,
    pub name: String,
    pub email: String,
    pub age: u32,
    pub active: bool,
    pub joined_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: DateTime<Utc>,
}

impl Reflect for Member {
    fn shape() -> Shape {
        StructShape::new()
            .field_with::<u64>("id", FieldTags::persist("pk autoincr"))
            .field::<u64>("owner_id")
            .field::<String>("name")
            .field::<String>("email")
            .field::<u32>("age")
            .field::<bool>("active")
            .field::<DateTime<Utc>>("joined_at")
            .field_with::<DateTime<Utc>>("created_at", FieldTags::persist("created"))
            .field_with::<DateTime<Utc>>("updated_at", FieldTags::persist("updated"))
            .field_with::<DateTime<Utc>>("deleted_at", FieldTags::persist("deleted"))
            .build()
    }
}

impl Record for Member {}

/// Public listing view of a [`Member`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: u64,
    pub name: String,
    pub active: bool,
}

impl Reflect for MemberSummary {
    fn shape() -> Shape {
        StructShape::new()
            .field::<u64>("id")
            .field::<String>("name")
            .field::<bool>("active")
            .build()
    }
}

impl Record for MemberSummary {}

/// Route entry printed by `routes`
#[derive(Debug, Serialize)]
pub struct RouteInfo {
    pub resource: String,
    pub operation: &'static str,
    pub method: &'static str,
    pub path: String,
    pub enabled: bool,
    pub cached: bool,
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    init_tracing();
    run_command(Cli::parse_args().command)
}

/// Run a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve { config, port } => serve(config.as_deref(), port),
        Command::Routes { config } => routes(config.as_deref()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load the config file, or defaults when none is given
pub fn load_config(path: Option<&Path>) -> CliResult<RestConfig> {
    match path {
        Some(path) => Ok(RestConfig::load(path)?),
        None => Ok(RestConfig::default()),
    }
}

/// Registry holding the demo resources
pub fn demo_registry(config: &RestConfig) -> CliResult<ResourceRegistry> {
    let users = ResourceBuilder::<Member>::new()
        .path("users")
        .owned_by("owner_id", USER_CONTEXT_KEY)
        .search(["name", "email"])
        .respond_with::<MemberSummary>(Operation::List);

    Ok(ResourceRegistry::builder(config).register(users)?.build())
}

/// Copy `X-User-Id` into the request context
pub async fn user_context(mut req: Request, next: Next) -> Response {
    let user = req
        .headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Some(user) = user {
        req.extensions_mut()
            .insert(ContextValues::new().with(USER_CONTEXT_KEY, user));
    }
    next.run(req).await
}

/// Serve the demo resources until Ctrl-C
pub fn serve(config_path: Option<&Path>, port: Option<u16>) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.port = port;
    }

    let registry = demo_registry(&config)?;
    let server = RestServer::new(
        config,
        registry,
        Arc::new(MemoryRowStore::new()),
        Arc::new(MemoryCache::new()),
    );
    info!(addr = %server.socket_addr(), "Serving demo resources");

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let router = server.router().layer(from_fn(user_context));
        server
            .serve(router)
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Print the demo routes as JSON
pub fn routes(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let registry = demo_registry(&config)?;
    write_json(&route_table(&registry))
}

/// Every operation route of every resource
pub fn route_table(registry: &ResourceRegistry) -> Vec<RouteInfo> {
    registry
        .iter()
        .flat_map(|resource| {
            let mount = registry.mount_path(resource);
            Operation::ALL.into_iter().map(move |op| RouteInfo {
                resource: resource.name().to_string(),
                operation: op.as_str(),
                method: op.http_method(),
                path: format!("{}{}", mount, op.route_path()).trim_end_matches('/').to_string(),
                enabled: resource.is_enabled(op),
                cached: match op {
                    Operation::List => resource.config.list_ttl.is_some(),
                    Operation::Get => resource.config.single_ttl.is_some(),
                    _ => false,
                },
            })
        })
        .collect()
}
