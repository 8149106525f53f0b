//! Table metadata provider
//!
//! The storage side owns column naming and special-column designations.
//! [`TagTableMetadata`] reads them from persistence tags the same way an
//! ORM table mapper would.

use super::errors::{SchemaError, SchemaResult};
use super::naming::snake_case;
use super::types::{FieldDescriptor, FieldTags, SemanticType, SpecialColumns};

/// Source of truth for column names and special columns of a table
pub trait TableMetadataProvider: Send + Sync {
    /// Storage column for a declared field
    fn column_name(&self, field: &str, tags: &FieldTags) -> String;

    /// Special column designations for a flattened field list
    fn special_columns(&self, table: &str, fields: &[FieldDescriptor]) -> SchemaResult<SpecialColumns>;
}

/// Tag-driven metadata: snake_case columns, designations from persistence flags
/// (`pk`, `autoincr`, `created`, `updated`, `deleted`, `version`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TagTableMetadata;

impl TableMetadataProvider for TagTableMetadata {
    fn column_name(&self, field: &str, tags: &FieldTags) -> String {
        tags.column_override()
            .map(str::to_string)
            .unwrap_or_else(|| snake_case(field))
    }

    fn special_columns(&self, table: &str, fields: &[FieldDescriptor]) -> SchemaResult<SpecialColumns> {
        let mut special = SpecialColumns::default();

        for field in fields {
            let tags = &field.tags;
            if tags.has_persist_flag("pk") {
                designate(table, "primary key", &mut special.primary_key, field, None)?;
            }
            if tags.has_persist_flag("autoincr") {
                designate(table, "auto-increment", &mut special.auto_increment, field, Some(integer))?;
            }
            if tags.has_persist_flag("created") {
                designate(table, "created", &mut special.created, field, Some(timestamp))?;
            }
            if tags.has_persist_flag("updated") {
                designate(table, "updated", &mut special.updated, field, Some(timestamp))?;
            }
            if tags.has_persist_flag("deleted") {
                designate(table, "deleted", &mut special.deleted, field, Some(timestamp))?;
            }
            if tags.has_persist_flag("version") {
                designate(table, "version", &mut special.version, field, Some(integer))?;
            }
        }

        Ok(special)
    }
}

fn integer(semantic: SemanticType) -> bool {
    semantic.is_integer()
}

fn timestamp(semantic: SemanticType) -> bool {
    semantic == SemanticType::Timestamp
}

fn designate(
    table: &str,
    designation: &'static str,
    slot: &mut Option<String>,
    field: &FieldDescriptor,
    accepts: Option<fn(SemanticType) -> bool>,
) -> SchemaResult<()> {
    if let Some(first) = slot {
        return Err(SchemaError::DuplicateDesignation {
            table: table.to_string(),
            designation,
            first: first.clone(),
            second: field.column.clone(),
        });
    }
    if accepts.is_some_and(|ok| !ok(field.semantic)) {
        return Err(SchemaError::InvalidDesignation {
            table: table.to_string(),
            designation,
            column: field.column.clone(),
            semantic: field.semantic.type_name(),
        });
    }
    *slot = Some(field.column.clone());
    Ok(())
}
