//! # REST API Module
//!
//! Generated CRUD endpoints for every registered resource, with a
//! read-through cache on list and single-record reads.

pub mod context;
pub mod errors;
pub mod handler;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;

pub use context::{read_values, ContextValues};
pub use errors::{ErrorResponse, RestError, RestResult};
pub use middleware::CACHE_STATUS_HEADER;
pub use response::{IdResponse, ListResponse};
pub use server::RestServer;
pub use state::ResourceState;
