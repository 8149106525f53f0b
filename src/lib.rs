//! aerocrud - schema-driven CRUD REST endpoints
//!
//! Register a record type once and get list, get, create, update, and
//! delete endpoints over a pluggable row store, with ownership scoping,
//! response shapes, and a read-through cache kept consistent by a
//! double delete on writes.

pub mod cache;
pub mod cli;
pub mod coerce;
pub mod config;
pub mod query;
pub mod registry;
pub mod rest_api;
pub mod schema;
pub mod store;
