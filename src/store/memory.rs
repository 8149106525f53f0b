//! In-memory row store
//!
//! Evaluates query predicates directly against stored rows and maintains
//! the generated columns a relational engine would: auto-increment keys,
//! created/updated stamps, version counters and soft-delete markers.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::query::{compare_values, Predicate, SelectQuery};
use crate::schema::{zero_timestamp, SchemaMetadata};

use super::errors::{StoreError, StoreResult};
use super::{InsertOutcome, Row, RowStore};

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    next_id: u64,
}

/// Row store backed by per-table vectors
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row of a table, soft-deleted rows included
    pub fn raw_rows(&self, table: &str) -> StoreResult<Vec<Row>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default())
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("Lock poisoned".to_string())
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Number(n)) => n.as_u64() == Some(0),
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn count(&self, schema: &SchemaMetadata, query: &SelectQuery) -> StoreResult<u64> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        let count = tables
            .get(&schema.table)
            .map(|t| t.rows.iter().filter(|row| query.matches(row)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn select(&self, schema: &SchemaMetadata, query: &SelectQuery) -> StoreResult<Vec<Row>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        let Some(table) = tables.get(&schema.table) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<Row> = table
            .rows
            .iter()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .skip(query.offset as usize)
            .take(limit)
            .collect())
    }

    async fn insert(&self, schema: &SchemaMetadata, mut row: Row) -> StoreResult<InsertOutcome> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let table = tables.entry(schema.table.clone()).or_default();
        let special = &schema.special;

        if let Some(column) = &special.auto_increment {
            match row.get(column).and_then(Value::as_u64).filter(|id| *id > 0) {
                Some(explicit) => table.next_id = table.next_id.max(explicit),
                None => {
                    table.next_id += 1;
                    row.insert(column.clone(), Value::from(table.next_id));
                }
            }
        }

        if let Some(column) = &special.primary_key {
            if is_unset(row.get(column)) && special.auto_increment.as_ref() != Some(column) {
                return Err(StoreError::Backend(format!("Missing primary key '{}'", column)));
            }
            let key = row.get(column).cloned().unwrap_or(Value::Null);
            let same_key = Predicate::eq(column, key.clone());
            if table.rows.iter().any(|existing| same_key.matches(existing)) {
                return Err(StoreError::Conflict {
                    table: schema.table.clone(),
                    key: key.to_string(),
                });
            }
        }

        let stamp = now();
        for column in [&special.created, &special.updated].into_iter().flatten() {
            row.insert(column.clone(), stamp.clone());
        }
        if let Some(column) = &special.deleted {
            row.insert(column.clone(), zero_timestamp());
        }
        if let Some(column) = &special.version {
            row.insert(column.clone(), Value::from(1u64));
        }

        debug!(table = %schema.table, "Row inserted");
        table.rows.push(row.clone());
        Ok(InsertOutcome { affected: 1, row })
    }

    async fn update(&self, schema: &SchemaMetadata, query: &SelectQuery, row: Row) -> StoreResult<u64> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let Some(table) = tables.get_mut(&schema.table) else {
            return Ok(0);
        };
        let special = &schema.special;
        let fixed = [
            &special.primary_key,
            &special.auto_increment,
            &special.created,
            &special.deleted,
            &special.version,
        ];

        let stamp = now();
        let mut affected = 0;
        for existing in table.rows.iter_mut().filter(|r| query.matches(r)) {
            for (column, value) in &row {
                if fixed.iter().any(|c| c.as_deref() == Some(column.as_str())) {
                    continue;
                }
                existing.insert(column.clone(), value.clone());
            }
            if let Some(column) = &special.updated {
                existing.insert(column.clone(), stamp.clone());
            }
            if let Some(column) = &special.version {
                let next = existing.get(column).and_then(Value::as_u64).unwrap_or(0) + 1;
                existing.insert(column.clone(), Value::from(next));
            }
            affected += 1;
        }
        Ok(affected)
    }

    async fn delete(&self, schema: &SchemaMetadata, query: &SelectQuery) -> StoreResult<u64> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let Some(table) = tables.get_mut(&schema.table) else {
            return Ok(0);
        };

        match &schema.special.deleted {
            Some(column) => {
                let stamp = now();
                let mut affected = 0;
                for existing in table.rows.iter_mut().filter(|r| query.matches(r)) {
                    existing.insert(column.clone(), stamp.clone());
                    affected += 1;
                }
                Ok(affected)
            }
            None => {
                let before = table.rows.len();
                table.rows.retain(|r| !query.matches(r));
                Ok((before - table.rows.len()) as u64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, FieldTags, SemanticType, SpecialColumns};
    use serde_json::json;

    fn schema(soft_delete: bool) -> SchemaMetadata {
        let field = |name: &'static str, semantic| FieldDescriptor {
            name: name.to_string(),
            path: vec![name],
            column: name.to_string(),
            semantic,
            tags: FieldTags::default(),
        };
        let mut fields = vec![
            field("id", SemanticType::u64()),
            field("name", SemanticType::String),
            field("updated_at", SemanticType::Timestamp),
        ];
        let mut special = SpecialColumns {
            primary_key: Some("id".to_string()),
            auto_increment: Some("id".to_string()),
            updated: Some("updated_at".to_string()),
            ..Default::default()
        };
        if soft_delete {
            fields.push(field("deleted_at", SemanticType::Timestamp));
            special.deleted = Some("deleted_at".to_string());
        }
        SchemaMetadata::new("member", fields, special)
    }

    fn row(name: &str) -> Row {
        match json!({"id": 0, "name": name}) {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    fn live(schema: &SchemaMetadata) -> SelectQuery {
        let query = SelectQuery::new(&schema.table);
        match &schema.special.deleted {
            Some(column) => query.and(Predicate::NotDeleted {
                column: column.clone(),
            }),
            None => query,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_stamps() {
        let store = MemoryRowStore::new();
        let schema = schema(false);

        let first = store.insert(&schema, row("ada")).await.unwrap();
        let second = store.insert(&schema, row("grace")).await.unwrap();

        assert_eq!(first.affected, 1);
        assert_eq!(first.row["id"], json!(1));
        assert_eq!(second.row["id"], json!(2));
        assert!(first.row["updated_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_key_conflicts() {
        let store = MemoryRowStore::new();
        let schema = schema(false);
        let mut explicit = row("ada");
        explicit.insert("id".to_string(), json!(5));

        store.insert(&schema, explicit.clone()).await.unwrap();
        let err = store.insert(&schema, explicit).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let next = store.insert(&schema, row("grace")).await.unwrap();
        assert_eq!(next.row["id"], json!(6));
    }

    #[tokio::test]
    async fn test_select_sorts_and_pages() {
        let store = MemoryRowStore::new();
        let schema = schema(false);
        for name in ["carol", "alice", "bob"] {
            store.insert(&schema, row(name)).await.unwrap();
        }

        let mut query = SelectQuery::new("member");
        query.order = Some(crate::query::OrderBy {
            column: "name".to_string(),
            descending: false,
        });
        query.limit = Some(2);
        query.offset = 1;

        let rows = store.select(&schema, &query).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("bob"), json!("carol")]);
        assert_eq!(store.count(&schema, &query).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_keeps_key() {
        let store = MemoryRowStore::new();
        let schema = schema(false);
        store.insert(&schema, row("ada")).await.unwrap();

        let query = SelectQuery::new("member").and(Predicate::eq("id", json!(1)));
        let affected = store.update(&schema, &query, row("edit")).await.unwrap();
        assert_eq!(affected, 1);

        let rows = store.select(&schema, &query).await.unwrap();
        assert_eq!(rows[0]["name"], json!("edit"));
        assert_eq!(rows[0]["id"], json!(1));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_rows() {
        let store = MemoryRowStore::new();
        let schema = schema(true);
        store.insert(&schema, row("ada")).await.unwrap();

        let by_id = live(&schema).and(Predicate::eq("id", json!(1)));
        assert!(store.exists(&schema, &by_id).await.unwrap());
        assert_eq!(store.delete(&schema, &by_id).await.unwrap(), 1);
        assert!(!store.exists(&schema, &by_id).await.unwrap());
        assert_eq!(store.delete(&schema, &by_id).await.unwrap(), 0);
        assert_eq!(store.raw_rows("member").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_hard_delete_removes_rows() {
        let store = MemoryRowStore::new();
        let schema = schema(false);
        store.insert(&schema, row("ada")).await.unwrap();

        let by_id = live(&schema).and(Predicate::eq("id", json!(1)));
        assert_eq!(store.delete(&schema, &by_id).await.unwrap(), 1);
        assert!(store.raw_rows("member").unwrap().is_empty());
    }
}
