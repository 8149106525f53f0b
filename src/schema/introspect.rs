//! # Schema Introspector
//!
//! Walks a record's [`Shape`] once, flattening nested structs in place and
//! classifying each leaf. Re-introspecting the same type yields an identical
//! [`SchemaMetadata`].

use std::collections::HashSet;

use tracing::warn;

use super::errors::{SchemaError, SchemaResult};
use super::metadata::TableMetadataProvider;
use super::reflect::{Record, Shape, StructShape};
use super::types::{FieldDescriptor, SchemaMetadata};

/// Derives [`SchemaMetadata`] from record shapes
pub struct SchemaIntrospector<'a> {
    metadata: &'a dyn TableMetadataProvider,
}

impl<'a> SchemaIntrospector<'a> {
    pub fn new(metadata: &'a dyn TableMetadataProvider) -> Self {
        Self { metadata }
    }

    /// Introspect a registered record type
    pub fn introspect<R: Record>(&self) -> SchemaResult<SchemaMetadata> {
        self.introspect_shape(R::table_name(), R::shape())
    }

    /// Introspect an arbitrary shape bound to `table`.
    ///
    /// A shape that is not a struct yields an empty schema.
    pub fn introspect_shape(&self, table: impl Into<String>, shape: Shape) -> SchemaResult<SchemaMetadata> {
        let table = table.into();
        let structure = match shape {
            Shape::Struct(structure) => structure,
            Shape::Leaf(semantic) => {
                warn!(table = %table, kind = semantic.type_name(), "Type is not a struct, schema is empty");
                return Ok(SchemaMetadata::empty(table));
            }
        };

        let mut fields = Vec::new();
        self.flatten(&structure, &mut Vec::new(), &mut fields);
        check_unique(&table, &fields)?;

        let special = self.metadata.special_columns(&table, &fields)?;
        Ok(SchemaMetadata::new(table, fields, special))
    }

    fn flatten(
        &self,
        structure: &StructShape,
        prefix: &mut Vec<&'static str>,
        out: &mut Vec<FieldDescriptor>,
    ) {
        for field in structure.fields() {
            prefix.push(field.name);
            match (field.shape)() {
                Shape::Leaf(semantic) => out.push(FieldDescriptor {
                    name: field.name.to_string(),
                    path: prefix.clone(),
                    column: self.metadata.column_name(field.name, &field.tags),
                    semantic,
                    tags: field.tags.clone(),
                }),
                Shape::Struct(nested) => self.flatten(&nested, prefix, out),
            }
            prefix.pop();
        }
    }
}

fn check_unique(table: &str, fields: &[FieldDescriptor]) -> SchemaResult<()> {
    let mut names = HashSet::new();
    let mut columns = HashSet::new();
    for field in fields {
        if !names.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                table: table.to_string(),
                field: field.name.clone(),
            });
        }
        if !columns.insert(field.column.as_str()) {
            return Err(SchemaError::DuplicateColumn {
                table: table.to_string(),
                column: field.column.clone(),
            });
        }
    }
    Ok(())
}
