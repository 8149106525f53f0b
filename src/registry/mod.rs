//! # Resource Registry
//!
//! Maps each registered record type to its mount path and configuration.
//! Built once at startup through [`RegistryBuilder`]; the finished
//! [`ResourceRegistry`] is immutable and shared read-only with handlers.

mod errors;
mod hooks;
mod operation;
mod resource;
mod shape;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::config::RestConfig;
use crate::query::PageLimits;
use crate::schema::{
    short_type_name, Record, RecordCodec, SchemaIntrospector, SemanticType, TableMetadataProvider,
    TagTableMetadata,
};

pub use errors::{RegistryError, RegistryResult};
pub use hooks::{handler_fn, middleware_fn, BoxHandler, BoxMiddleware, ResourceHooks};
pub use operation::Operation;
pub use resource::{Ownership, Resource, ResourceBuilder, ResourceConfig};
pub use shape::ResponseShape;

/// Registered resources, immutable after [`RegistryBuilder::build`]
#[derive(Debug)]
pub struct ResourceRegistry {
    prefix: String,
    resources: Vec<Arc<Resource>>,
    by_path: HashMap<String, usize>,
}

impl ResourceRegistry {
    pub fn builder(config: &RestConfig) -> RegistryBuilder {
        RegistryBuilder {
            config: config.clone(),
            metadata: Box::new(TagTableMetadata),
            resources: Vec::new(),
        }
    }

    /// Normalized mount prefix, e.g. `/api/v1`
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Look up a resource by its path segment
    pub fn get(&self, path: &str) -> Option<&Arc<Resource>> {
        self.by_path.get(path).map(|&i| &self.resources[i])
    }

    /// Resolve the resource a request path addresses
    pub fn resolve(&self, request_path: &str) -> Option<&Arc<Resource>> {
        let rest = request_path.strip_prefix(self.prefix.as_str())?;
        let segment = rest.trim_start_matches('/').split('/').next()?;
        self.get(segment)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.resources.iter()
    }

    /// Absolute mount path of a resource
    pub fn mount_path(&self, resource: &Resource) -> String {
        format!("{}/{}", self.prefix, resource.name())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Collects resources during startup
pub struct RegistryBuilder {
    config: RestConfig,
    metadata: Box<dyn TableMetadataProvider>,
    resources: Vec<Resource>,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<_> = self.resources.iter().map(Resource::name).collect();
        f.debug_struct("RegistryBuilder")
            .field("prefix", &self.config.normalized_prefix())
            .field("resources", &paths)
            .finish_non_exhaustive()
    }
}

impl RegistryBuilder {
    /// Use a different table metadata provider for subsequent registrations
    pub fn with_metadata(mut self, metadata: impl TableMetadataProvider + 'static) -> Self {
        self.metadata = Box::new(metadata);
        self
    }

    /// Register a record type with default options
    pub fn register_default<R: Record>(self) -> RegistryResult<Self> {
        self.register(ResourceBuilder::<R>::new())
    }

    /// Introspect `R` and register it with the given options
    pub fn register<R: Record>(mut self, options: ResourceBuilder<R>) -> RegistryResult<Self> {
        let introspector = SchemaIntrospector::new(self.metadata.as_ref());
        let schema = introspector.introspect::<R>()?;
        if schema.is_empty() {
            return Err(RegistryError::EmptySchema(short_type_name::<R>().to_string()));
        }

        let path = options.path.clone().unwrap_or_else(|| schema.table.clone());
        if self.resources.iter().any(|r| r.name() == path) {
            return Err(RegistryError::DuplicatePath(path));
        }

        let keyed = Operation::ALL
            .iter()
            .any(|op| op.is_keyed() && !options.disabled.contains(op));
        if keyed && schema.special.key_column().is_none() {
            return Err(RegistryError::MissingPrimaryKey(path));
        }

        let ownership = match &options.owner {
            Some((field, context_key)) => {
                let descriptor = schema
                    .field(field)
                    .or_else(|| schema.field_by_column(field))
                    .ok_or_else(|| RegistryError::UnknownOwnerField {
                        resource: path.clone(),
                        field: field.clone(),
                    })?;
                if !matches!(
                    descriptor.semantic,
                    SemanticType::String
                        | SemanticType::SignedInteger { .. }
                        | SemanticType::UnsignedInteger { .. }
                ) {
                    return Err(RegistryError::UnsupportedOwnerType {
                        resource: path.clone(),
                        field: field.clone(),
                        semantic: descriptor.semantic.type_name(),
                    });
                }
                Some(Ownership {
                    field: descriptor.name.clone(),
                    column: descriptor.column.clone(),
                    context_key: context_key.clone(),
                })
            }
            None => None,
        };

        if let Some(column) = options
            .search_columns
            .iter()
            .find(|c| schema.field_by_column(c).is_none())
        {
            return Err(RegistryError::UnknownSearchColumn {
                resource: path.clone(),
                column: column.clone(),
            });
        }

        let mut shapes = HashMap::new();
        for (op, factory) in &options.shapes {
            shapes.insert(*op, factory(&introspector)?);
        }

        let defaults = self.config.paging.limits();
        let limits = PageLimits::new(
            options.max_page.map_or(defaults.max_page, |m| m.min(defaults.max_page)),
            options
                .max_page_size
                .map_or(defaults.max_page_size, |m| m.min(defaults.max_page_size)),
            defaults.default_page_size,
        );

        let config = ResourceConfig {
            path,
            ownership,
            disabled: options.disabled,
            hooks: options.hooks,
            shapes,
            list_ttl: options.list_ttl.unwrap_or_else(|| self.config.cache.list_ttl()),
            single_ttl: options.single_ttl.unwrap_or_else(|| self.config.cache.single_ttl()),
            double_delete_delay: options
                .double_delete_delay
                .unwrap_or_else(|| self.config.cache.double_delete_delay()),
            search_columns: options.search_columns,
            limits,
        };

        info!(
            resource = %config.path,
            table = %schema.table,
            fields = schema.fields.len(),
            owned = config.ownership.is_some(),
            "Registered resource"
        );

        self.resources.push(Resource {
            config,
            schema,
            codec: RecordCodec::of::<R>(),
        });
        Ok(self)
    }

    pub fn build(self) -> ResourceRegistry {
        let by_path = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name().to_string(), i))
            .collect();
        ResourceRegistry {
            prefix: self.config.normalized_prefix(),
            resources: self.resources.into_iter().map(Arc::new).collect(),
            by_path,
        }
    }
}
