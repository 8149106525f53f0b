//! Per-resource handler state

use std::sync::Arc;

use axum::http::Uri;
use serde_json::Value;

use crate::cache::{CacheKey, CacheLayer};
use crate::coerce::{Binder, Coercer, RequestValues};
use crate::query::{OwnerScope, QueryBuilder};
use crate::registry::{Operation, Resource};
use crate::store::{Row, RowStore};

use super::context::ContextValues;
use super::errors::{RestError, RestResult};

/// Everything a generated handler needs for one resource
#[derive(Clone)]
pub struct ResourceState {
    pub resource: Arc<Resource>,
    pub store: Arc<dyn RowStore>,
    pub cache: CacheLayer,
    pub coercer: Coercer,
}

impl ResourceState {
    pub fn queries(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.resource.schema, &self.resource.config.search_columns)
    }

    /// Raw scope value from the request context, if the resource is owned
    fn scope_raw<'c>(&self, ctx: Option<&'c ContextValues>) -> RestResult<Option<&'c str>> {
        match &self.resource.config.ownership {
            None => Ok(None),
            Some(ownership) => ctx
                .and_then(|c| c.get(&ownership.context_key))
                .map(Some)
                .ok_or_else(|| RestError::MissingScope(ownership.context_key.clone())),
        }
    }

    /// Typed ownership scope for this request
    pub fn scope(&self, ctx: Option<&ContextValues>) -> RestResult<Option<OwnerScope>> {
        let (Some(raw), Some(field)) = (self.scope_raw(ctx)?, self.resource.owner_field()) else {
            return Ok(None);
        };
        Ok(Some(OwnerScope {
            column: field.column.clone(),
            value: self.coercer.coerce_owner(field, raw)?,
        }))
    }

    /// Cache key for a read of `op` at `uri`.
    ///
    /// List entries are keyed by path and query, single entries by path
    /// alone so writes to `/{id}` can address them.
    pub fn cache_key(&self, op: Operation, uri: &Uri, ctx: Option<&ContextValues>) -> CacheKey {
        let target = match op {
            Operation::List => uri
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or_else(|| uri.path()),
            _ => uri.path(),
        };
        let column = self
            .resource
            .config
            .ownership
            .as_ref()
            .map(|o| o.column.as_str())
            .unwrap_or_default();
        let scope = self.scope_raw(ctx).ok().flatten().unwrap_or_default();
        CacheKey::derive(self.resource.name(), target, column, scope)
    }

    /// Bind request values into a storage row, forcing the owner column
    pub fn bind_row(&self, values: &RequestValues, scope: Option<&OwnerScope>) -> RestResult<Row> {
        let resource = &self.resource;
        let binder = Binder::new(&resource.schema, self.coercer);
        let mut instance = resource.codec.blank()?;

        binder.bind(values, &mut instance, scope.map(|s| s.column.as_str()))?;
        if let (Some(scope), Some(field)) = (scope, resource.owner_field()) {
            binder.bind_owner(&mut instance, field, scope.value.clone());
        }

        let instance = resource.codec.normalize(instance)?;
        Ok(resource.schema.row_from_instance(&instance))
    }

    /// Render a stored row for `op`: its response shape, else the record
    pub fn render(&self, op: Operation, row: &Row) -> RestResult<Value> {
        if let Some(shape) = self.resource.shape(op) {
            return Ok(shape.project(row)?);
        }
        let resource = &self.resource;
        let instance = resource.schema.instance_from_row(resource.codec.blank()?, row);
        Ok(resource.codec.normalize(instance)?)
    }
}
