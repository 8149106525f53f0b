//! # Generated Handlers
//!
//! The five CRUD handlers mounted for every resource. Each resolves the
//! caller's ownership scope first, so rows outside it behave as missing.
//!
//! Writes keep the single-record cache consistent with a double delete:
//! the entry is removed before the row changes and again after
//! `double_delete_delay`, evicting anything a concurrent read repopulated
//! with stale data in between.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{OriginalUri, Path, Query, RawQuery, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::Value;
use tracing::debug;

use crate::query::ListParams;
use crate::registry::Operation;

use super::context::{read_values, ContextValues};
use super::errors::{RestError, RestResult};
use super::response::{IdResponse, ListResponse};
use super::state::ResourceState;

type Context = Option<Extension<ContextValues>>;

fn context(ctx: &Context) -> Option<&ContextValues> {
    ctx.as_ref().map(|Extension(c)| c)
}

/// GET / - filtered, sorted, paged listing
pub async fn list(
    State(state): State<ResourceState>,
    OriginalUri(uri): OriginalUri,
    Query(raw): Query<HashMap<String, String>>,
    ctx: Context,
) -> RestResult<Json<ListResponse>> {
    let ctx = context(&ctx);
    let resource = &state.resource;
    let scope = state.scope(ctx)?;
    let params = ListParams::parse(&raw, &resource.schema, resource.config.limits)?;
    let plan = state.queries().list(&params, scope.as_ref(), &state.coercer)?;

    let all = state.store.count(&resource.schema, &plan.count).await?;
    let rows = state.store.select(&resource.schema, &plan.select).await?;
    debug!(
        resource = %resource.name(),
        rows = rows.len(),
        all,
        range_scan = plan.range_scan,
        "Listed rows"
    );

    let data = rows
        .iter()
        .map(|row| state.render(Operation::List, row))
        .collect::<RestResult<Vec<_>>>()?;

    let response = ListResponse {
        page_size: params.page_size,
        page: params.page,
        all,
        data,
        desc_field: params.order_desc,
        order: params.order,
        filter: (!params.filters.is_empty()).then_some(params.filters),
        search: params.search,
    };

    if let Some(ttl) = resource.config.list_ttl {
        let key = state.cache_key(Operation::List, &uri, ctx);
        state.cache.populate(&key, &response, ttl).await;
    }
    Ok(Json(response))
}

/// GET /{id} - one record within scope
pub async fn get_one(
    State(state): State<ResourceState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    ctx: Context,
) -> RestResult<Json<Value>> {
    let ctx = context(&ctx);
    let resource = &state.resource;
    let scope = state.scope(ctx)?;
    let queries = state.queries();
    let query = queries.by_id(queries.key_value(&id, &state.coercer)?, scope.as_ref())?;

    let row = state
        .store
        .select(&resource.schema, &query)
        .await?
        .into_iter()
        .next()
        .ok_or(RestError::NotFound)?;
    let body = state.render(Operation::Get, &row)?;

    if let Some(ttl) = resource.config.single_ttl {
        let key = state.cache_key(Operation::Get, &uri, ctx);
        state.cache.populate(&key, &body, ttl).await;
    }
    Ok(Json(body))
}

/// POST / - bind, insert, return the stored record
pub async fn create(
    State(state): State<ResourceState>,
    RawQuery(query): RawQuery,
    ctx: Context,
    headers: HeaderMap,
    body: Bytes,
) -> RestResult<Json<Value>> {
    let ctx = context(&ctx);
    let resource = &state.resource;
    let scope = state.scope(ctx)?;
    let values = read_values(&headers, query.as_deref(), &body)?;
    let row = state.bind_row(&values, scope.as_ref())?;

    let outcome = state.store.insert(&resource.schema, row).await?;
    if outcome.affected == 0 {
        return Err(RestError::Persistence("No rows inserted".to_string()));
    }
    debug!(resource = %resource.name(), "Created row");

    Ok(Json(state.render(Operation::Create, &outcome.row)?))
}

/// PUT /{id} - replace the bound columns of one record
pub async fn update(
    State(state): State<ResourceState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    ctx: Context,
    headers: HeaderMap,
    body: Bytes,
) -> RestResult<Response> {
    let ctx = context(&ctx);
    let resource = &state.resource;
    let scope = state.scope(ctx)?;
    let queries = state.queries();
    let key_value = queries.key_value(&id, &state.coercer)?;
    let target = queries.by_id(key_value.clone(), scope.as_ref())?;

    if !state.store.exists(&resource.schema, &target).await? {
        return Err(RestError::NotFound);
    }

    let values = read_values(&headers, query.as_deref(), &body)?;
    let row = state.bind_row(&values, scope.as_ref())?;

    let cache_key = resource
        .config
        .single_ttl
        .map(|_| state.cache_key(Operation::Update, &uri, ctx));
    if let Some(key) = &cache_key {
        state.cache.invalidate(key).await;
    }

    let affected = state
        .store
        .update(&resource.schema, &target.without_paging(), row)
        .await?;
    if affected == 0 {
        return Err(RestError::Persistence("No rows updated".to_string()));
    }

    if let Some(key) = cache_key {
        state
            .cache
            .invalidate_later(key, resource.config.double_delete_delay);
    }
    debug!(resource = %resource.name(), id = %key_value, "Updated row");

    if resource.shape(Operation::Update).is_none() {
        return Ok(Json(IdResponse { id: key_value }).into_response());
    }
    let row = state
        .store
        .select(&resource.schema, &target)
        .await?
        .into_iter()
        .next()
        .ok_or(RestError::NotFound)?;
    Ok(Json(state.render(Operation::Update, &row)?).into_response())
}

/// DELETE /{id} - delete one record, soft when the schema allows
pub async fn remove(
    State(state): State<ResourceState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    ctx: Context,
) -> RestResult<Response> {
    let ctx = context(&ctx);
    let resource = &state.resource;
    let scope = state.scope(ctx)?;
    let queries = state.queries();
    let key_value = queries.key_value(&id, &state.coercer)?;
    let target = queries.by_id(key_value.clone(), scope.as_ref())?;

    let row = state
        .store
        .select(&resource.schema, &target)
        .await?
        .into_iter()
        .next()
        .ok_or(RestError::NotFound)?;

    let cache_key = resource
        .config
        .single_ttl
        .map(|_| state.cache_key(Operation::Delete, &uri, ctx));
    if let Some(key) = &cache_key {
        state.cache.invalidate(key).await;
    }

    let affected = state
        .store
        .delete(&resource.schema, &target.without_paging())
        .await?;
    if affected == 0 {
        return Err(RestError::Persistence("No rows deleted".to_string()));
    }

    if let Some(key) = cache_key {
        state
            .cache
            .invalidate_later(key, resource.config.double_delete_delay);
    }
    debug!(resource = %resource.name(), id = %key_value, "Deleted row");

    if resource.shape(Operation::Delete).is_some() {
        return Ok(Json(state.render(Operation::Delete, &row)?).into_response());
    }
    Ok(Json(IdResponse { id: key_value }).into_response())
}

/// Error answered by the route of a disabled operation
pub fn disabled(resource: &str, op: Operation) -> RestError {
    RestError::OperationDisabled {
        resource: resource.to_string(),
        operation: op.to_string(),
    }
}
