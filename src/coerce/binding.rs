//! Request-to-instance binding
//!
//! Walks a resource's field table and writes coerced request values onto a
//! serialized instance. Storage-maintained columns (auto-increment, created,
//! updated, deleted) and the ownership column are never bound from input.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::schema::{write_path, FieldDescriptor, SchemaMetadata};

use super::coercer::Coercer;
use super::errors::CoercionResult;

/// Untyped request values keyed by column or logical field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestValues(BTreeMap<String, String>);

impl RequestValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Add every entry of `fallback` not already present
    pub fn fill_from(&mut self, fallback: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in fallback {
            self.0.entry(key).or_insert(value);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw value for a field, by column first then by logical name
    fn lookup(&self, field: &FieldDescriptor) -> &str {
        self.get(&field.column)
            .or_else(|| self.get(&field.name))
            .unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Binds request values onto instances of one resource
pub struct Binder<'a> {
    schema: &'a SchemaMetadata,
    coercer: Coercer,
}

impl<'a> Binder<'a> {
    pub fn new(schema: &'a SchemaMetadata, coercer: Coercer) -> Self {
        Self { schema, coercer }
    }

    /// Bind every eligible field from `values` onto `instance`.
    ///
    /// Absent fields are bound as their zero value.
    pub fn bind(
        &self,
        values: &RequestValues,
        instance: &mut Value,
        owner_column: Option<&str>,
    ) -> CoercionResult<()> {
        for field in &self.schema.fields {
            if self.schema.special.is_generated(&field.column) {
                debug!(table = %self.schema.table, column = %field.column, "Skipping generated column");
                continue;
            }
            if owner_column == Some(field.column.as_str()) {
                continue;
            }

            let value = self.coercer.coerce(field, values.lookup(field))?;
            write_path(instance, &field.path, value);
        }
        Ok(())
    }

    /// Force the ownership column to the per-request scope value
    pub fn bind_owner(&self, instance: &mut Value, field: &FieldDescriptor, value: Value) {
        write_path(instance, &field.path, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{CoercionError, CoercionPolicy};
    use crate::schema::{FieldTags, SemanticType, SpecialColumns};
    use serde_json::json;

    fn field(name: &'static str, path: Vec<&'static str>, semantic: SemanticType) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            path,
            column: name.to_string(),
            semantic,
            tags: FieldTags::default(),
        }
    }

    fn schema() -> SchemaMetadata {
        SchemaMetadata::new(
            "member",
            vec![
                field("id", vec!["id"], SemanticType::u64()),
                field("name", vec!["name"], SemanticType::String),
                field("age", vec!["age"], SemanticType::u64()),
                field("city", vec!["address", "city"], SemanticType::String),
                field("owner_id", vec!["owner_id"], SemanticType::u64()),
                field("created_at", vec!["created_at"], SemanticType::Timestamp),
            ],
            SpecialColumns {
                primary_key: Some("id".to_string()),
                auto_increment: Some("id".to_string()),
                created: Some("created_at".to_string()),
                ..Default::default()
            },
        )
    }

    fn blank() -> Value {
        json!({
            "id": 0, "name": "", "age": 0, "address": {"city": ""},
            "owner_id": 0, "created_at": "1970-01-01T00:00:00Z"
        })
    }

    #[test]
    fn test_binds_and_skips_generated() {
        let schema = schema();
        let binder = Binder::new(&schema, Coercer::default());
        let values: RequestValues = [
            ("id", "99"),
            ("name", "test"),
            ("age", "68"),
            ("city", "oslo"),
            ("created_at", "not a time"),
        ]
        .into_iter()
        .collect();

        let mut instance = blank();
        binder.bind(&values, &mut instance, None).unwrap();

        assert_eq!(instance["id"], json!(0));
        assert_eq!(instance["name"], json!("test"));
        assert_eq!(instance["age"], json!(68));
        assert_eq!(instance["address"]["city"], json!("oslo"));
        assert_eq!(instance["created_at"], json!("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_owner_column_not_bound_from_input() {
        let schema = schema();
        let binder = Binder::new(&schema, Coercer::default());
        let values: RequestValues = [("owner_id", "5")].into_iter().collect();

        let mut instance = blank();
        binder.bind(&values, &mut instance, Some("owner_id")).unwrap();
        assert_eq!(instance["owner_id"], json!(0));

        let owner = schema.field("owner_id").unwrap();
        binder.bind_owner(&mut instance, owner, json!(7));
        assert_eq!(instance["owner_id"], json!(7));
    }

    #[test]
    fn test_strict_policy_surfaces_error() {
        let schema = schema();
        let binder = Binder::new(&schema, Coercer::new(CoercionPolicy::Strict));
        let values: RequestValues = [("age", "old")].into_iter().collect();

        let err = binder.bind(&values, &mut blank(), None).unwrap_err();
        assert!(matches!(err, CoercionError::Invalid { .. }));
    }

    #[test]
    fn test_fill_from_keeps_existing() {
        let mut values: RequestValues = [("name", "body")].into_iter().collect();
        values.fill_from([
            ("name".to_string(), "query".to_string()),
            ("age".to_string(), "3".to_string()),
        ]);
        assert_eq!(values.get("name"), Some("body"));
        assert_eq!(values.get("age"), Some("3"));
        assert_eq!(values.len(), 2);
    }
}
