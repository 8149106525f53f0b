//! # Row Store
//!
//! Table-scoped persistence collaborator. Rows are column-keyed JSON maps;
//! queries arrive as [`SelectQuery`] values built by the query builder, so
//! a SQL-backed store can execute their rendered form and the in-memory
//! store can evaluate their predicates directly.

mod errors;
mod memory;

use async_trait::async_trait;

use crate::query::SelectQuery;
use crate::schema::SchemaMetadata;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryRowStore;

/// One stored row, keyed by storage column
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Result of an insert
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    /// Rows written
    pub affected: u64,

    /// The row as stored, with generated columns filled in
    pub row: Row,
}

#[async_trait]
pub trait RowStore: Send + Sync {
    /// Count rows matching the query's predicates
    async fn count(&self, schema: &SchemaMetadata, query: &SelectQuery) -> StoreResult<u64>;

    /// Fetch rows matching the query, honoring sort and paging
    async fn select(&self, schema: &SchemaMetadata, query: &SelectQuery) -> StoreResult<Vec<Row>>;

    /// Whether any row matches
    async fn exists(&self, schema: &SchemaMetadata, query: &SelectQuery) -> StoreResult<bool> {
        Ok(self.count(schema, &query.without_paging()).await? > 0)
    }

    /// Insert a row, filling generated columns
    async fn insert(&self, schema: &SchemaMetadata, row: Row) -> StoreResult<InsertOutcome>;

    /// Replace every non-generated column of matching rows
    async fn update(&self, schema: &SchemaMetadata, query: &SelectQuery, row: Row) -> StoreResult<u64>;

    /// Delete matching rows (soft delete when the schema has a deleted column)
    async fn delete(&self, schema: &SchemaMetadata, query: &SelectQuery) -> StoreResult<u64>;
}
