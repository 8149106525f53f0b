//! # Query Builder
//!
//! Builds table-scoped select queries for one resource from parsed list
//! parameters, a record id, and the ownership scope. Every query carries
//! the scope and the soft-delete exclusion; neither is reachable from
//! request parameters.

use serde_json::Value;

use crate::coerce::Coercer;
use crate::schema::SchemaMetadata;
use crate::store::Row;

use super::errors::{QueryError, QueryResult};
use super::params::ListParams;
use super::predicate::{quote, Predicate};

/// Sort clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// A select against one table
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: String,
    pub predicates: Vec<Predicate>,
    pub order: Option<OrderBy>,
    pub limit: Option<u64>,
    pub offset: u64,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicates: Vec::new(),
            order: None,
            limit: None,
            offset: 0,
        }
    }

    /// Add a predicate (AND)
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Check if a row satisfies every predicate
    pub fn matches(&self, row: &Row) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }

    /// Same predicates with no sort, limit or offset
    pub fn without_paging(&self) -> Self {
        Self {
            order: None,
            limit: None,
            offset: 0,
            ..self.clone()
        }
    }

    /// Render as `SELECT *` with positional parameters
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT * FROM {}", quote(&self.table));
        let mut params = Vec::new();
        self.render_where(&mut sql, &mut params);

        if let Some(order) = &self.order {
            let direction = if order.descending { "DESC" } else { "ASC" };
            sql.push_str(&format!(" ORDER BY {} {}", quote(&order.column), direction));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
            if self.offset > 0 {
                sql.push_str(&format!(" OFFSET {}", self.offset));
            }
        }
        (sql, params)
    }

    /// Render as `SELECT COUNT(*)`, ignoring sort and paging
    pub fn to_count_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT COUNT(*) FROM {}", quote(&self.table));
        let mut params = Vec::new();
        self.render_where(&mut sql, &mut params);
        (sql, params)
    }

    fn render_where(&self, sql: &mut String, params: &mut Vec<Value>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            predicate.render(sql, params);
        }
    }
}

/// Ownership scope applied to every query of a resource
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerScope {
    pub column: String,
    pub value: Value,
}

/// Page query plus the count query sharing its predicates
#[derive(Debug, Clone, PartialEq)]
pub struct ListPlan {
    pub select: SelectQuery,
    pub count: SelectQuery,
    /// Whether the page uses a key range scan instead of an offset
    pub range_scan: bool,
}

pub struct QueryBuilder<'a> {
    schema: &'a SchemaMetadata,
    search_columns: &'a [String],
}

impl<'a> QueryBuilder<'a> {
    pub fn new(schema: &'a SchemaMetadata, search_columns: &'a [String]) -> Self {
        Self {
            schema,
            search_columns,
        }
    }

    /// Scope and soft-delete predicates shared by every query
    fn base(&self, scope: Option<&OwnerScope>) -> SelectQuery {
        let mut query = SelectQuery::new(&self.schema.table);
        if let Some(scope) = scope {
            query = query.and(Predicate::eq(&scope.column, scope.value.clone()));
        }
        if let Some(deleted) = &self.schema.special.deleted {
            query = query.and(Predicate::NotDeleted {
                column: deleted.clone(),
            });
        }
        query
    }

    /// Build the page and count queries for a list request
    pub fn list(
        &self,
        params: &ListParams,
        scope: Option<&OwnerScope>,
        coercer: &Coercer,
    ) -> QueryResult<ListPlan> {
        let mut query = self.base(scope);

        for (column, raw) in &params.filters {
            let field = self
                .schema
                .field_by_column(column)
                .ok_or_else(|| QueryError::UnknownColumn {
                    table: self.schema.table.clone(),
                    column: column.clone(),
                })?;
            query = query.and(Predicate::eq(column, coercer.coerce_filter(field, raw)?));
        }

        if let Some(pattern) = params.search_pattern() {
            if self.search_columns.is_empty() {
                return Err(QueryError::SearchDisabled {
                    table: self.schema.table.clone(),
                });
            }
            query = query.and(Predicate::AnyLike {
                columns: self.search_columns.to_vec(),
                pattern,
            });
        }

        let count = query.clone();

        let auto_increment = self.schema.special.auto_increment.as_ref();
        let range_scan = params.is_plain() && auto_increment.is_some();
        match auto_increment.filter(|_| range_scan) {
            Some(column) => {
                query = query.and(Predicate::Between {
                    column: column.clone(),
                    start: params.offset(),
                    end: params.page * params.page_size * 2,
                });
            }
            None => {
                query.order = params
                    .order
                    .as_ref()
                    .map(|column| OrderBy {
                        column: column.clone(),
                        descending: false,
                    })
                    .or_else(|| {
                        params.order_desc.as_ref().map(|column| OrderBy {
                            column: column.clone(),
                            descending: true,
                        })
                    });
                query.offset = params.offset();
            }
        }
        query.limit = Some(params.page_size);

        Ok(ListPlan {
            select: query,
            count,
            range_scan,
        })
    }

    /// Coerce a raw path id to the key column's type
    pub fn key_value(&self, raw: &str, coercer: &Coercer) -> QueryResult<Value> {
        let column = self.key_column()?;
        let field = self
            .schema
            .field_by_column(column)
            .ok_or_else(|| QueryError::UnknownColumn {
                table: self.schema.table.clone(),
                column: column.to_string(),
            })?;
        Ok(coercer.coerce_filter(field, raw)?)
    }

    /// Query matching one record by key, within scope
    pub fn by_id(&self, id: Value, scope: Option<&OwnerScope>) -> QueryResult<SelectQuery> {
        let column = self.key_column()?;
        let mut query = self.base(scope).and(Predicate::eq(column, id));
        query.limit = Some(1);
        Ok(query)
    }

    fn key_column(&self) -> QueryResult<&'a str> {
        self.schema
            .special
            .key_column()
            .ok_or_else(|| QueryError::MissingPrimaryKey {
                table: self.schema.table.clone(),
            })
    }
}
