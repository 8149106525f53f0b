//! Type-erased conversion table for a record type
//!
//! Built once per registered type so request handling can create blank
//! instances and normalize bound ones without knowing the concrete type.

use serde_json::Value;

use super::errors::SchemaResult;
use super::reflect::Record;

#[derive(Debug, Clone, Copy)]
pub struct RecordCodec {
    blank: fn() -> serde_json::Result<Value>,
    normalize: fn(Value) -> serde_json::Result<Value>,
}

impl RecordCodec {
    pub fn of<R: Record>() -> Self {
        Self {
            blank: blank_of::<R>,
            normalize: normalize_of::<R>,
        }
    }

    /// Serialized zero-value instance
    pub fn blank(&self) -> SchemaResult<Value> {
        Ok((self.blank)()?)
    }

    /// Round-trip a serialized instance through the record type, rejecting
    /// values the type cannot hold and canonicalizing the rest.
    pub fn normalize(&self, instance: Value) -> SchemaResult<Value> {
        Ok((self.normalize)(instance)?)
    }
}

fn blank_of<R: Record>() -> serde_json::Result<Value> {
    serde_json::to_value(R::default())
}

fn normalize_of<R: Record>(instance: Value) -> serde_json::Result<Value> {
    let record: R = serde_json::from_value(instance)?;
    serde_json::to_value(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Reflect, Shape, StructShape};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Gauge {
        level: u8,
        label: String,
    }

    impl Reflect for Gauge {
        fn shape() -> Shape {
            StructShape::new()
                .field::<u8>("level")
                .field::<String>("label")
                .build()
        }
    }

    impl Record for Gauge {}

    #[test]
    fn test_blank_instance() {
        let codec = RecordCodec::of::<Gauge>();
        assert_eq!(codec.blank().unwrap(), json!({"level": 0, "label": ""}));
    }

    #[test]
    fn test_normalize_rejects_out_of_range() {
        let codec = RecordCodec::of::<Gauge>();
        assert!(codec.normalize(json!({"level": 300, "label": "x"})).is_err());
        assert_eq!(
            codec.normalize(json!({"level": 3, "label": "x", "extra": 1})).unwrap(),
            json!({"level": 3, "label": "x"})
        );
    }
}
