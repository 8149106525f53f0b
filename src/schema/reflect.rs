//! # Record Reflection
//!
//! Records describe their own structure through [`Reflect`], producing a
//! static field table the introspector walks once at registration. Nested
//! structs are described by their own `Reflect` impl and get flattened into
//! the parent; timestamps and durations are terminal leaves.
//!
//! ```ignore
//! #[derive(Default, Serialize, Deserialize)]
//! struct Member {
//!     id: u64,
//!     name: String,
//!     created_at: DateTime<Utc>,
//! }
//!
//! impl Reflect for Member {
//!     fn shape() -> Shape {
//!         StructShape::new()
//!             .field_with::<u64>("id", FieldTags::persist("pk autoincr"))
//!             .field::<String>("name")
//!             .field_with::<DateTime<Utc>>("created_at", FieldTags::persist("created"))
//!             .build()
//!     }
//! }
//!
//! impl Record for Member {}
//! ```

use chrono::{DateTime, TimeZone};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::naming::{short_type_name, snake_case};
use super::types::{FieldTags, SemanticType};

/// Structural description of a type
#[derive(Debug, Clone)]
pub enum Shape {
    /// Terminal value
    Leaf(SemanticType),
    /// Struct whose fields are flattened into the parent
    Struct(StructShape),
}

/// A type that can describe its own structure
pub trait Reflect {
    fn shape() -> Shape;
}

/// A struct-like type bound to a storage table.
///
/// Field names given to [`StructShape`] must match the serde field names;
/// nested structs serialize as nested objects.
pub trait Record: Reflect + Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Storage table. Defaults to the snake_cased type name.
    fn table_name() -> String {
        snake_case(short_type_name::<Self>())
    }
}

/// Declared field of a struct shape
#[derive(Debug, Clone)]
pub struct FieldShape {
    pub name: &'static str,
    pub shape: fn() -> Shape,
    pub tags: FieldTags,
}

/// Ordered field table of a struct
#[derive(Debug, Clone, Default)]
pub struct StructShape {
    fields: Vec<FieldShape>,
}

impl StructShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with no tags
    pub fn field<T: Reflect>(self, name: &'static str) -> Self {
        self.field_with::<T>(name, FieldTags::default())
    }

    /// Declare a field with structural tags
    pub fn field_with<T: Reflect>(mut self, name: &'static str, tags: FieldTags) -> Self {
        self.fields.push(FieldShape {
            name,
            shape: T::shape,
            tags,
        });
        self
    }

    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }

    pub fn build(self) -> Shape {
        Shape::Struct(self)
    }
}

macro_rules! impl_leaf {
    ($semantic:ident: $($ty:ty),+) => {
        $(
            impl Reflect for $ty {
                fn shape() -> Shape {
                    Shape::Leaf(SemanticType::$semantic)
                }
            }
        )+
    };
}

macro_rules! impl_integer_leaf {
    ($semantic:ident: $($ty:ty),+) => {
        $(
            impl Reflect for $ty {
                fn shape() -> Shape {
                    Shape::Leaf(SemanticType::$semantic { bits: <$ty>::BITS })
                }
            }
        )+
    };
}

impl_leaf!(String: String);
impl_integer_leaf!(SignedInteger: i8, i16, i32, i64, isize);
impl_integer_leaf!(UnsignedInteger: u8, u16, u32, u64, usize);
impl_leaf!(Float: f32, f64);
impl_leaf!(Boolean: bool);
impl_leaf!(Duration: std::time::Duration);

impl<Tz: TimeZone> Reflect for DateTime<Tz> {
    fn shape() -> Shape {
        Shape::Leaf(SemanticType::Timestamp)
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct AuditTrail {
        created_at: DateTime<Utc>,
    }

    impl Reflect for AuditTrail {
        fn shape() -> Shape {
            StructShape::new()
                .field_with::<DateTime<Utc>>("created_at", FieldTags::persist("created"))
                .build()
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct BlogPost {
        id: u64,
        title: Option<String>,
        audit: AuditTrail,
    }

    impl Reflect for BlogPost {
        fn shape() -> Shape {
            StructShape::new()
                .field_with::<u64>("id", FieldTags::persist("pk autoincr"))
                .field::<Option<String>>("title")
                .field::<AuditTrail>("audit")
                .build()
        }
    }

    impl Record for BlogPost {}

    #[test]
    fn test_leaf_shapes() {
        assert!(matches!(u32::shape(), Shape::Leaf(SemanticType::UnsignedInteger { bits: 32 })));
        assert!(matches!(i16::shape(), Shape::Leaf(SemanticType::SignedInteger { bits: 16 })));
        assert!(matches!(i64::shape(), Shape::Leaf(SemanticType::SignedInteger { bits: 64 })));
        assert!(matches!(
            <DateTime<Utc>>::shape(),
            Shape::Leaf(SemanticType::Timestamp)
        ));
        assert!(matches!(
            <Option<bool>>::shape(),
            Shape::Leaf(SemanticType::Boolean)
        ));
    }

    #[test]
    fn test_struct_shape_keeps_order_and_nesting() {
        let Shape::Struct(shape) = BlogPost::shape() else {
            panic!("expected struct shape");
        };
        let names: Vec<_> = shape.fields().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "title", "audit"]);
        assert!(matches!((shape.fields()[2].shape)(), Shape::Struct(_)));
    }

    #[test]
    fn test_default_table_name() {
        assert_eq!(BlogPost::table_name(), "blog_post");
    }
}
