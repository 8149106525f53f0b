//! Schema type definitions
//!
//! Semantic field types, structural tags, flattened field descriptors and
//! the per-resource [`SchemaMetadata`] derived once at registration.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::store::Row;

use super::access::{read_path, write_path};

/// Semantic type of a leaf field, driving request coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    /// UTF-8 string
    String,
    /// Signed integer of `bits` width
    SignedInteger { bits: u32 },
    /// Unsigned integer of `bits` width
    UnsignedInteger { bits: u32 },
    /// 32/64-bit floating point
    Float,
    /// Boolean
    Boolean,
    /// Point in time (terminal composite)
    Timestamp,
    /// Elapsed time (terminal composite)
    Duration,
}

impl SemanticType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            SemanticType::String => "string",
            SemanticType::SignedInteger { .. } => "signed integer",
            SemanticType::UnsignedInteger { .. } => "unsigned integer",
            SemanticType::Float => "float",
            SemanticType::Boolean => "boolean",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Duration => "duration",
        }
    }

    /// Zero value bound when input is absent or leniently rejected
    pub fn zero_value(&self) -> Value {
        match self {
            SemanticType::String => Value::String(String::new()),
            SemanticType::SignedInteger { .. } | SemanticType::UnsignedInteger { .. } => json!(0),
            SemanticType::Float => json!(0.0),
            SemanticType::Boolean => Value::Bool(false),
            SemanticType::Timestamp => zero_timestamp(),
            SemanticType::Duration => json!({ "secs": 0, "nanos": 0 }),
        }
    }

    /// Whether this type can carry an integer key
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            SemanticType::SignedInteger { .. } | SemanticType::UnsignedInteger { .. }
        )
    }

    /// 64-bit signed integer
    pub const fn i64() -> Self {
        SemanticType::SignedInteger { bits: 64 }
    }

    /// 64-bit unsigned integer
    pub const fn u64() -> Self {
        SemanticType::UnsignedInteger { bits: 64 }
    }
}

/// The zero-value timestamp, which marks a soft-deletable row as live.
pub fn zero_timestamp() -> Value {
    Value::String(DateTime::<Utc>::default().to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Returns true if `value` is the zero timestamp (in any offset)
pub fn is_zero_timestamp(value: &Value) -> bool {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|ts| ts.timestamp() == 0 && ts.timestamp_subsec_nanos() == 0)
            .unwrap_or(false),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Raw structural tags attached to a field declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTags {
    /// Persistence mapping tag, e.g. `"pk autoincr"` or `"'user_name' varchar(20)"`
    pub persist: String,
    /// Validation tag
    pub validate: String,
    /// Documentation/comment tag
    pub comment: String,
    /// Free-form attribute tag
    pub attr: String,
}

impl FieldTags {
    /// Tags with only a persistence mapping
    pub fn persist(tag: impl Into<String>) -> Self {
        Self {
            persist: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_validate(mut self, tag: impl Into<String>) -> Self {
        self.validate = tag.into();
        self
    }

    pub fn with_comment(mut self, tag: impl Into<String>) -> Self {
        self.comment = tag.into();
        self
    }

    pub fn with_attr(mut self, tag: impl Into<String>) -> Self {
        self.attr = tag.into();
        self
    }

    /// Whether the persistence tag carries `flag` (case-insensitive)
    pub fn has_persist_flag(&self, flag: &str) -> bool {
        self.persist
            .split_whitespace()
            .any(|token| token.eq_ignore_ascii_case(flag))
    }

    /// Explicit column name from a quoted persistence token (`'name'`)
    pub fn column_override(&self) -> Option<&str> {
        self.persist.split_whitespace().find_map(|token| {
            token
                .strip_prefix('\'')
                .and_then(|t| t.strip_suffix('\''))
                .filter(|t| !t.is_empty())
        })
    }
}

/// One leaf field of a flattened record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Logical name (the declared field name)
    pub name: String,

    /// Accessor path from the record root to this field
    pub path: Vec<&'static str>,

    /// Storage column name
    pub column: String,

    /// Semantic type
    pub semantic: SemanticType,

    /// Raw structural tags
    pub tags: FieldTags,
}

/// Special column designations reported by the table metadata provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialColumns {
    pub primary_key: Option<String>,
    pub auto_increment: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub deleted: Option<String>,
    pub version: Option<String>,
}

impl SpecialColumns {
    /// Columns maintained by storage that are never bound from input
    pub fn is_generated(&self, column: &str) -> bool {
        [
            &self.auto_increment,
            &self.created,
            &self.updated,
            &self.deleted,
        ]
        .iter()
        .any(|c| c.as_deref() == Some(column))
    }

    /// Key column used for single-record access
    pub fn key_column(&self) -> Option<&str> {
        self.primary_key
            .as_deref()
            .or(self.auto_increment.as_deref())
    }
}

/// Per-resource schema derived once at registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMetadata {
    /// Storage table name
    pub table: String,

    /// Flattened leaf fields in declaration order
    pub fields: Vec<FieldDescriptor>,

    /// Special column designations
    pub special: SpecialColumns,
}

impl SchemaMetadata {
    pub fn new(table: impl Into<String>, fields: Vec<FieldDescriptor>, special: SpecialColumns) -> Self {
        Self {
            table: table.into(),
            fields,
            special,
        }
    }

    /// Schema of a type that could not be reflected as a structure
    pub fn empty(table: impl Into<String>) -> Self {
        Self::new(table, Vec::new(), SpecialColumns::default())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Find a field by logical name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Find a field by storage column
    pub fn field_by_column(&self, column: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// All storage columns in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.column.as_str())
    }

    /// Extract a column-keyed row from a serialized instance
    pub fn row_from_instance(&self, instance: &Value) -> Row {
        self.fields
            .iter()
            .map(|field| {
                let value = read_path(instance, &field.path)
                    .cloned()
                    .unwrap_or(Value::Null);
                (field.column.clone(), value)
            })
            .collect()
    }

    /// Write every column of `row` known to this schema onto `base`
    pub fn instance_from_row(&self, mut base: Value, row: &Row) -> Value {
        for field in &self.fields {
            if let Some(value) = row.get(&field.column) {
                write_path(&mut base, &field.path, value.clone());
            }
        }
        base
    }
}
