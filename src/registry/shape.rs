//! Response-shape projection
//!
//! Copies a canonical row onto an alternate record type by matching storage
//! column names. Columns the shape does not declare are dropped; shape
//! fields with no matching column keep their zero value.

use serde_json::Value;

use crate::schema::{Record, RecordCodec, SchemaIntrospector, SchemaMetadata, SchemaResult};
use crate::store::Row;

#[derive(Debug, Clone)]
pub struct ResponseShape {
    schema: SchemaMetadata,
    codec: RecordCodec,
}

impl ResponseShape {
    pub fn of<S: Record>(introspector: &SchemaIntrospector<'_>) -> SchemaResult<Self> {
        Ok(Self {
            schema: introspector.introspect::<S>()?,
            codec: RecordCodec::of::<S>(),
        })
    }

    pub fn schema(&self) -> &SchemaMetadata {
        &self.schema
    }

    /// Project a stored row onto the shape type
    pub fn project(&self, row: &Row) -> SchemaResult<Value> {
        let instance = self.schema.instance_from_row(self.codec.blank()?, row);
        self.codec.normalize(instance)
    }
}

/// Builds a shape with the registry's metadata provider
pub(crate) type ShapeFactory = for<'a, 'b> fn(&'a SchemaIntrospector<'b>) -> SchemaResult<ResponseShape>;
