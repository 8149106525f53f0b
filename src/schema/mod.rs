//! # Schema Introspection
//!
//! Turns a registered record type into [`SchemaMetadata`]: a flattened,
//! ordered list of classified leaf fields plus the special columns the
//! table metadata provider designates.
//!
//! # Design Principles
//!
//! - Introspection happens once, at registration
//! - Field access goes through static accessor paths, never by-name lookup on the type
//! - Special columns come from the metadata provider, not from naming guesses
//! - A type that is not a struct produces an empty schema, rejected at startup

mod access;
mod codec;
mod errors;
mod introspect;
mod metadata;
mod naming;
mod reflect;
mod types;

pub use access::{read_path, write_path};
pub use codec::RecordCodec;
pub use errors::{SchemaError, SchemaResult};
pub use introspect::SchemaIntrospector;
pub use metadata::{TableMetadataProvider, TagTableMetadata};
pub use naming::{short_type_name, snake_case};
pub use reflect::{FieldShape, Record, Reflect, Shape, StructShape};
pub use types::{
    is_zero_timestamp, zero_timestamp, FieldDescriptor, FieldTags, SchemaMetadata, SemanticType,
    SpecialColumns,
};
