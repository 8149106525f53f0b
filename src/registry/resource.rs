//! # Resources
//!
//! A [`Resource`] is one registered record type: its introspected schema,
//! its codec, and the [`ResourceConfig`] assembled at registration.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::query::PageLimits;
use crate::schema::{FieldDescriptor, Record, RecordCodec, SchemaMetadata};

use super::hooks::{handler_fn, middleware_fn, ResourceHooks};
use super::operation::Operation;
use super::shape::{ResponseShape, ShapeFactory};

/// Ownership scoping of a resource's rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    /// Logical field holding the owner
    pub field: String,

    /// Storage column of that field
    pub column: String,

    /// Request context key carrying the caller's scope value
    pub context_key: String,
}

/// Immutable per-resource configuration
#[derive(Debug, Clone)]
pub struct ResourceConfig {
    /// Path segment under the registry prefix
    pub path: String,

    pub ownership: Option<Ownership>,

    pub disabled: HashSet<Operation>,

    pub hooks: ResourceHooks,

    /// Alternate output types per operation
    pub shapes: HashMap<Operation, ResponseShape>,

    /// TTL for cached list results; `None` disables
    pub list_ttl: Option<Duration>,

    /// TTL for cached single-record results; `None` disables
    pub single_ttl: Option<Duration>,

    /// Delay before the second post-write cache delete
    pub double_delete_delay: Duration,

    /// Columns searched by `search`; empty rejects search
    pub search_columns: Vec<String>,

    pub limits: PageLimits,
}

/// A registered record type
#[derive(Debug, Clone)]
pub struct Resource {
    pub config: ResourceConfig,
    pub schema: SchemaMetadata,
    pub codec: RecordCodec,
}

impl Resource {
    pub fn name(&self) -> &str {
        &self.config.path
    }

    pub fn is_enabled(&self, op: Operation) -> bool {
        !self.config.disabled.contains(&op)
    }

    /// Enabled operations in route order
    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        Operation::ALL.into_iter().filter(|op| self.is_enabled(*op))
    }

    pub fn shape(&self, op: Operation) -> Option<&ResponseShape> {
        self.config.shapes.get(&op)
    }

    /// Descriptor of the ownership field, if scoped
    pub fn owner_field(&self) -> Option<&FieldDescriptor> {
        self.config
            .ownership
            .as_ref()
            .and_then(|o| self.schema.field_by_column(&o.column))
    }
}

/// Per-resource options collected before registration.
///
/// Unset options take the registry-wide defaults.
pub struct ResourceBuilder<R> {
    pub(crate) path: Option<String>,
    pub(crate) owner: Option<(String, String)>,
    pub(crate) disabled: HashSet<Operation>,
    pub(crate) hooks: ResourceHooks,
    pub(crate) shapes: Vec<(Operation, ShapeFactory)>,
    pub(crate) list_ttl: Option<Option<Duration>>,
    pub(crate) single_ttl: Option<Option<Duration>>,
    pub(crate) double_delete_delay: Option<Duration>,
    pub(crate) search_columns: Vec<String>,
    pub(crate) max_page: Option<u64>,
    pub(crate) max_page_size: Option<u64>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Default for ResourceBuilder<R> {
    fn default() -> Self {
        Self {
            path: None,
            owner: None,
            disabled: HashSet::new(),
            hooks: ResourceHooks::default(),
            shapes: Vec::new(),
            list_ttl: None,
            single_ttl: None,
            double_delete_delay: None,
            search_columns: Vec::new(),
            max_page: None,
            max_page_size: None,
            _record: PhantomData,
        }
    }
}

impl<R: Record> ResourceBuilder<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the path segment (default: the record's table name)
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into().trim_matches('/').to_string());
        self
    }

    /// Scope rows to the caller: `field` is forced to the value found under
    /// `context_key` in the request context.
    pub fn owned_by(mut self, field: impl Into<String>, context_key: impl Into<String>) -> Self {
        self.owner = Some((field.into(), context_key.into()));
        self
    }

    pub fn disable(mut self, op: Operation) -> Self {
        self.disabled.insert(op);
        self
    }

    /// Replace the generated handler of `op`
    pub fn handler<F, Fut>(mut self, op: Operation, f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.hooks.handlers.insert(op, handler_fn(f));
        self
    }

    /// Wrap `op` in middleware; the first registered runs outermost
    pub fn middleware<F, Fut>(mut self, op: Operation, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.hooks
            .middleware
            .entry(op)
            .or_default()
            .push(middleware_fn(f));
        self
    }

    /// Run middleware before every route of the resource
    pub fn pre_middleware<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.hooks.pre.push(middleware_fn(f));
        self
    }

    /// Serialize `op` results as `S` instead of the canonical record
    pub fn respond_with<S: Record>(mut self, op: Operation) -> Self {
        let factory: ShapeFactory = ResponseShape::of::<S>;
        self.shapes.push((op, factory));
        self
    }

    /// Cache list results for `ttl` (zero disables)
    pub fn cache_list(mut self, ttl: Duration) -> Self {
        self.list_ttl = Some((!ttl.is_zero()).then_some(ttl));
        self
    }

    /// Cache single-record results for `ttl` (zero disables)
    pub fn cache_single(mut self, ttl: Duration) -> Self {
        self.single_ttl = Some((!ttl.is_zero()).then_some(ttl));
        self
    }

    pub fn double_delete_delay(mut self, delay: Duration) -> Self {
        self.double_delete_delay = Some(delay);
        self
    }

    /// Columns searched by the `search` parameter
    pub fn search<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Tighten the page number cap below the registry default
    pub fn max_page(mut self, max: u64) -> Self {
        self.max_page = Some(max);
        self
    }

    /// Tighten the page size cap below the registry default
    pub fn max_page_size(mut self, max: u64) -> Self {
        self.max_page_size = Some(max);
        self
    }
}
